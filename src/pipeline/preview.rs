//! Preview pipeline: render on the server, display on the client.
//!
//! ```text
//! requesting ──► decoding ──► ready
//!      │             │
//!      └──► failed ◄─┘ (transport only)
//! ```
//!
//! The response body is turned into a `data:` URI that an image widget can
//! show without touching disk. Its pixel dimensions are then probed to get
//! an aspect ratio for on-screen scaling. A failed probe is not a failed
//! preview: the image is still viewable, so the ratio falls back to 1:1.

use super::{PipelineError, PipelineKind, ProgressSender, Stage, report};
use crate::request::GenerationRequest;
use crate::transport::{Endpoint, Payload, Transport};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::io::Cursor;
use tracing::{info, warn};

/// Aspect ratio used when the preview's dimensions cannot be read.
pub const DEFAULT_ASPECT_RATIO: f64 = 1.0;

const FALLBACK_MIME: &str = "application/octet-stream";

/// A decoded preview ready for display.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewImage {
    pub data_uri: String,
    /// Pixel `(width, height)` when probing succeeded.
    pub dimensions: Option<(u32, u32)>,
    /// `width / height`, or [`DEFAULT_ASPECT_RATIO`].
    pub aspect_ratio: f64,
}

impl PreviewImage {
    pub fn new(data_uri: String, dimensions: Option<(u32, u32)>) -> Self {
        let aspect_ratio = match dimensions {
            Some((w, h)) if h > 0 => w as f64 / h as f64,
            _ => DEFAULT_ASPECT_RATIO,
        };
        Self {
            data_uri,
            dimensions,
            aspect_ratio,
        }
    }
}

pub struct PreviewPipeline<'a, T> {
    transport: &'a T,
    progress: Option<ProgressSender>,
}

impl<'a, T: Transport> PreviewPipeline<'a, T> {
    pub fn new(transport: &'a T) -> Self {
        Self {
            transport,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<PreviewImage, PipelineError> {
        let progress = self.progress.as_ref();

        report(progress, PipelineKind::Preview, Stage::Requesting);
        let payload = self.transport.send(Endpoint::Preview, request).await?;

        report(progress, PipelineKind::Preview, Stage::Decoding);
        let data_uri = data_uri(&payload);
        let dimensions = probe_dimensions(payload.bytes).await;
        let preview = PreviewImage::new(data_uri, dimensions);

        info!(
            ?dimensions,
            aspect_ratio = preview.aspect_ratio,
            "preview ready"
        );
        Ok(preview)
    }
}

/// Media type for the data URI: the server's `Content-Type`, else sniffed
/// from the bytes.
fn media_type(payload: &Payload) -> String {
    let header = payload
        .content_type
        .as_deref()
        .map(str::trim)
        .filter(|ct| !ct.is_empty());
    if let Some(ct) = header {
        return ct.to_string();
    }
    image::guess_format(&payload.bytes)
        .map(|f| f.to_mime_type().to_string())
        .unwrap_or_else(|_| FALLBACK_MIME.to_string())
}

/// `data:<media-type>;base64,<body>`
pub fn data_uri(payload: &Payload) -> String {
    format!(
        "data:{};base64,{}",
        media_type(payload),
        STANDARD.encode(&payload.bytes)
    )
}

/// Read pixel dimensions off the event loop. `None` on any failure.
async fn probe_dimensions(bytes: Vec<u8>) -> Option<(u32, u32)> {
    let probed = tokio::task::spawn_blocking(move || {
        image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(image::ImageError::IoError)?
            .into_dimensions()
    })
    .await;

    match probed {
        Ok(Ok(dims)) => Some(dims),
        Ok(Err(e)) => {
            warn!(error = %e, "could not read preview dimensions, using 1:1");
            None
        }
        Err(e) => {
            warn!(error = %e, "dimension probe task failed, using 1:1");
            None
        }
    }
}
