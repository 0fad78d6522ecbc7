//! Composition root: wires the pipelines to their collaborators.
//!
//! [`StencilClient`] is generic over the transport, writer and share
//! facility so the same wiring runs in production
//! ([`StencilClient::from_config`]) and under test with mocks.

use crate::config::ClientConfig;
use crate::persist::{FileWriter, FsWriter};
use crate::pipeline::{
    DownloadOutcome, DownloadPipeline, PipelineError, PreviewImage, PreviewPipeline, ProgressSender,
};
use crate::request::GenerationRequest;
use crate::share::{ConfiguredShare, ShareFacility};
use crate::storage::{Platform, StorageResolver};
use crate::transport::{HttpTransport, Transport};
use std::time::Duration;

pub struct StencilClient<T, W, S> {
    transport: T,
    resolver: StorageResolver,
    writer: W,
    share: S,
    dialog_title: String,
    status_interval: Duration,
}

impl StencilClient<HttpTransport, FsWriter, ConfiguredShare> {
    /// Production wiring for the current platform.
    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(
            HttpTransport::new(&config.server),
            StorageResolver::for_platform(Platform::current(), &config.storage),
            FsWriter,
            ConfiguredShare::from_command(config.share.command.as_deref()),
        )
        .with_dialog_title(config.share.dialog_title.clone())
        .with_status_interval(Duration::from_millis(config.loading.interval_ms))
    }
}

impl<T, W, S> StencilClient<T, W, S>
where
    T: Transport,
    W: FileWriter,
    S: ShareFacility,
{
    pub fn new(transport: T, resolver: StorageResolver, writer: W, share: S) -> Self {
        Self {
            transport,
            resolver,
            writer,
            share,
            dialog_title: "Your Stencil PDF".to_string(),
            status_interval: crate::rotator::DEFAULT_INTERVAL,
        }
    }

    pub fn with_dialog_title(mut self, title: impl Into<String>) -> Self {
        self.dialog_title = title.into();
        self
    }

    pub fn with_status_interval(mut self, interval: Duration) -> Self {
        self.status_interval = interval;
        self
    }

    /// How often loading messages rotate.
    pub fn status_interval(&self) -> Duration {
        self.status_interval
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn preview(
        &self,
        request: &GenerationRequest,
        progress: Option<ProgressSender>,
    ) -> Result<PreviewImage, PipelineError> {
        let mut pipeline = PreviewPipeline::new(&self.transport);
        if let Some(tx) = progress {
            pipeline = pipeline.with_progress(tx);
        }
        pipeline.run(request).await
    }

    pub async fn download(
        &self,
        request: &GenerationRequest,
        progress: Option<ProgressSender>,
    ) -> Result<DownloadOutcome, PipelineError> {
        let mut pipeline = DownloadPipeline::new(
            &self.transport,
            &self.resolver,
            &self.writer,
            &self.share,
            self.dialog_title.clone(),
        );
        if let Some(tx) = progress {
            pipeline = pipeline.with_progress(tx);
        }
        pipeline.run(request).await
    }
}
