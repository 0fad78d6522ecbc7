//! Shared test utilities: recording mocks for every pipeline collaborator.
//!
//! Mocks use `Mutex` (not `RefCell`) so they stay `Sync`, which the
//! collaborator traits require.
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let transport = MockTransport::ok(tiny_png(4, 3), Some("image/png"));
//! let preview = PreviewPipeline::new(&transport).run(&sample_request()).await?;
//! assert_eq!(transport.calls(), vec![Endpoint::Preview]);
//! ```

use crate::form::FormState;
use crate::persist::{FileWriter, WriteError};
use crate::pipeline::{PipelineEvent, Stage};
use crate::request::{GenerationRequest, SelectedImage, build_request};
use crate::share::{ShareError, ShareFacility, ShareOptions};
use crate::transport::{Endpoint, Payload, Transport, TransportError};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Cursor;
use std::sync::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

// =========================================================================
// Fixtures
// =========================================================================

/// A `width × height` PNG, encoded in memory.
pub fn tiny_png(width: u32, height: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::new(width, height));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// A request built from the default form with an image selected.
pub fn sample_request() -> GenerationRequest {
    build_request(
        &FormState::default(),
        Some(&SelectedImage::new("/photos/sample.jpg")),
    )
    .unwrap()
}

/// All stages reported so far.
pub fn drain_stages(rx: &mut UnboundedReceiver<PipelineEvent>) -> Vec<Stage> {
    let mut stages = Vec::new();
    while let Ok(event) = rx.try_recv() {
        stages.push(event.stage);
    }
    stages
}

// =========================================================================
// Transport
// =========================================================================

#[derive(Debug, Clone)]
enum MockResponse {
    Ok(Payload),
    Status(u16),
}

/// Answers every request with the same canned response.
pub struct MockTransport {
    response: MockResponse,
    calls: Mutex<Vec<(Endpoint, GenerationRequest)>>,
}

impl MockTransport {
    pub fn ok(bytes: Vec<u8>, content_type: Option<&str>) -> Self {
        Self {
            response: MockResponse::Ok(Payload {
                bytes,
                content_type: content_type.map(str::to_string),
            }),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn status(status: u16) -> Self {
        Self {
            response: MockResponse::Status(status),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<Endpoint> {
        self.calls.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }
}

impl Transport for MockTransport {
    async fn send(
        &self,
        endpoint: Endpoint,
        request: &GenerationRequest,
    ) -> Result<Payload, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint, request.clone()));
        match &self.response {
            MockResponse::Ok(payload) => Ok(payload.clone()),
            MockResponse::Status(status) => Err(TransportError::Status {
                status: *status,
                url: format!("mock://{endpoint:?}"),
            }),
        }
    }
}

// =========================================================================
// Writer
// =========================================================================

/// Records decoded writes instead of touching disk.
pub struct MockWriter {
    fail: bool,
    writes: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MockWriter {
    pub fn new() -> Self {
        Self {
            fail: false,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            writes: Mutex::new(Vec::new()),
        }
    }

    pub fn written(&self) -> Vec<(String, Vec<u8>)> {
        self.writes.lock().unwrap().clone()
    }
}

impl FileWriter for MockWriter {
    async fn write_base64(&self, path: &str, base64: &str) -> Result<(), WriteError> {
        if self.fail {
            return Err(WriteError::Io {
                path: path.to_string(),
                source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
            });
        }
        let bytes = STANDARD.decode(base64)?;
        self.writes.lock().unwrap().push((path.to_string(), bytes));
        Ok(())
    }
}

// =========================================================================
// Share
// =========================================================================

pub struct MockShare {
    available: bool,
    fail: bool,
    shares: Mutex<Vec<(String, ShareOptions)>>,
}

impl MockShare {
    fn build(available: bool, fail: bool) -> Self {
        Self {
            available,
            fail,
            shares: Mutex::new(Vec::new()),
        }
    }

    pub fn available() -> Self {
        Self::build(true, false)
    }

    pub fn unavailable() -> Self {
        Self::build(false, false)
    }

    /// Available, but every share call errors.
    pub fn broken() -> Self {
        Self::build(true, true)
    }

    pub fn shared(&self) -> Vec<(String, ShareOptions)> {
        self.shares.lock().unwrap().clone()
    }
}

impl ShareFacility for MockShare {
    async fn is_available(&self) -> bool {
        self.available
    }

    async fn share(&self, path: &str, options: &ShareOptions) -> Result<(), ShareError> {
        if self.fail {
            return Err(ShareError::Failed {
                program: "mock".into(),
                status: "exit status: 1".into(),
            });
        }
        self.shares
            .lock()
            .unwrap()
            .push((path.to_string(), options.clone()));
        Ok(())
    }
}
