//! On-device persistence of downloaded stencils.
//!
//! The write primitive takes base64 text, matching how the download
//! pipeline carries the PDF between decoding and writing.

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum WriteError {
    #[error("payload is not valid base64: {0}")]
    Decode(#[from] base64::DecodeError),
    #[error("could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub trait FileWriter: Sync {
    /// Decode `base64` and write the bytes to `path`, replacing any file there.
    fn write_base64(
        &self,
        path: &str,
        base64: &str,
    ) -> impl Future<Output = Result<(), WriteError>> + Send;
}

/// Writes straight to the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWriter;

impl FileWriter for FsWriter {
    async fn write_base64(&self, path: &str, base64: &str) -> Result<(), WriteError> {
        let bytes = STANDARD.decode(base64)?;
        tokio::fs::write(path, &bytes)
            .await
            .map_err(|source| WriteError::Io {
                path: path.to_string(),
                source,
            })?;
        debug!(path, len = bytes.len(), "file written");
        Ok(())
    }
}

/// `stencil_<unix-ms>.pdf`
pub fn stencil_file_name(timestamp_ms: u128) -> String {
    format!("stencil_{timestamp_ms}.pdf")
}

/// Milliseconds since the Unix epoch (0 if the clock is before it).
pub fn now_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}
