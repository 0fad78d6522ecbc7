//! Download pipeline: render the PDF on the server, save it, share it.
//!
//! ```text
//! requesting → decoding → locating → writing ─┬─► shared   (share facility available)
//!                                              └─► saved    (no share facility)
//! ```
//!
//! Any step can fail, and each failure maps to its own [`PipelineError`]
//! variant: the server (`Transport`), the directory chain
//! (`StorageUnavailable`, nothing is written), or the write itself (`Write`).
//! Once the file is on disk the download counts as successful; a share
//! facility that errors out leaves the result at `saved`.

use super::{Notification, PipelineError, PipelineKind, ProgressSender, Stage, report};
use crate::persist::{FileWriter, now_millis, stencil_file_name};
use crate::request::GenerationRequest;
use crate::share::{ShareFacility, ShareOptions};
use crate::storage::StorageResolver;
use crate::transport::{Endpoint, Transport};
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use tracing::{info, warn};

/// Where a successful download ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    /// Written and handed to the share facility.
    Shared { path: String },
    /// Written; no share facility took it.
    Saved { path: String },
}

impl DownloadOutcome {
    pub fn path(&self) -> &str {
        match self {
            DownloadOutcome::Shared { path } | DownloadOutcome::Saved { path } => path,
        }
    }

    /// A saved file is announced with its exact path; a shared one needs no
    /// alert because the share sheet already took over.
    pub fn notification(&self) -> Option<Notification> {
        match self {
            DownloadOutcome::Shared { .. } => None,
            DownloadOutcome::Saved { path } => {
                Some(Notification::new("Saved!", format!("File saved to: {path}")))
            }
        }
    }
}

pub struct DownloadPipeline<'a, T, W, S> {
    transport: &'a T,
    resolver: &'a StorageResolver,
    writer: &'a W,
    share: &'a S,
    dialog_title: String,
    clock: fn() -> u128,
    progress: Option<ProgressSender>,
}

impl<'a, T, W, S> DownloadPipeline<'a, T, W, S>
where
    T: Transport,
    W: FileWriter,
    S: ShareFacility,
{
    pub fn new(
        transport: &'a T,
        resolver: &'a StorageResolver,
        writer: &'a W,
        share: &'a S,
        dialog_title: impl Into<String>,
    ) -> Self {
        Self {
            transport,
            resolver,
            writer,
            share,
            dialog_title: dialog_title.into(),
            clock: now_millis,
            progress: None,
        }
    }

    pub fn with_progress(mut self, progress: ProgressSender) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Replace the millisecond clock used to name the file.
    pub fn with_clock(mut self, clock: fn() -> u128) -> Self {
        self.clock = clock;
        self
    }

    pub async fn run(&self, request: &GenerationRequest) -> Result<DownloadOutcome, PipelineError> {
        let progress = self.progress.as_ref();

        report(progress, PipelineKind::Download, Stage::Requesting);
        let payload = self.transport.send(Endpoint::Stencil, request).await?;

        report(progress, PipelineKind::Download, Stage::Decoding);
        let encoded = STANDARD.encode(&payload.bytes);

        report(progress, PipelineKind::Download, Stage::Locating);
        let dir = self.resolver.resolve()?;
        let path = dir.join(&stencil_file_name((self.clock)()));

        report(progress, PipelineKind::Download, Stage::Writing);
        self.writer.write_base64(&path, &encoded).await?;
        info!(%path, bytes = payload.bytes.len(), "stencil saved");

        if self.share.is_available().await {
            let options = ShareOptions::pdf(self.dialog_title.clone());
            match self.share.share(&path, &options).await {
                Ok(()) => return Ok(DownloadOutcome::Shared { path }),
                Err(e) => warn!(error = %e, %path, "share failed, file stays saved"),
            }
        }
        Ok(DownloadOutcome::Saved { path })
    }
}
