//! The interactive session: form, selected image, and both pipelines.
//!
//! [`Session`] is the single store of interface state and
//! [`Session::update`] its only mutator. A presentation layer (the CLI, or
//! a test) feeds it [`Event`]s and renders what it holds; the pipelines
//! themselves never touch it. That keeps the whole flow testable without a
//! UI:
//!
//! ```text
//! begin(kind) ──► request snapshot ──► pipeline.run() ──► update(*Finished)
//!      │                                                        │
//!      └── NoImageSelected → notification                       └── notification / preview
//! ```

use crate::form::{FormEvent, FormState};
use crate::pipeline::{
    DownloadOutcome, Notification, PipelineError, PipelineEvent, PipelineKind, PipelineState,
    PreviewImage, Stage,
};
use crate::request::{GenerationRequest, SelectedImage, build_request};
use tracing::{debug, warn};

#[derive(Debug)]
pub enum Event {
    Form(FormEvent),
    ImageSelected(SelectedImage),
    Started(PipelineKind),
    Progress(PipelineEvent),
    Status { kind: PipelineKind, text: String },
    PreviewFinished(Result<PreviewImage, PipelineError>),
    DownloadFinished(Result<DownloadOutcome, PipelineError>),
}

#[derive(Debug, Default)]
pub struct Session {
    pub form: FormState,
    image: Option<SelectedImage>,
    preview_state: PipelineState,
    download_state: PipelineState,
    preview: Option<PreviewImage>,
    last_download: Option<DownloadOutcome>,
    preview_status: Option<String>,
    download_status: Option<String>,
    notifications: Vec<Notification>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, event: Event) {
        match event {
            Event::Form(edit) => self.form.apply(edit),
            Event::ImageSelected(image) => {
                debug!(path = %image.path().display(), "image selected");
                self.image = Some(image);
                self.preview = None;
            }
            Event::Started(kind) => {
                *self.state_mut(kind) = PipelineState::InFlight(Stage::Requesting);
            }
            Event::Progress(PipelineEvent { kind, stage }) => {
                if self.state(kind).is_busy() {
                    *self.state_mut(kind) = PipelineState::InFlight(stage);
                }
            }
            Event::Status { kind, text } => {
                if self.state(kind).is_busy() {
                    *self.status_mut(kind) = Some(text);
                }
            }
            Event::PreviewFinished(result) => {
                let kind = PipelineKind::Preview;
                match result {
                    Ok(preview) => {
                        self.preview = Some(preview);
                        self.preview_state = PipelineState::Succeeded;
                    }
                    Err(e) => self.fail(kind, e),
                }
                self.preview_status = None;
            }
            Event::DownloadFinished(result) => {
                let kind = PipelineKind::Download;
                match result {
                    Ok(outcome) => {
                        if let Some(note) = outcome.notification() {
                            self.notifications.push(note);
                        }
                        self.last_download = Some(outcome);
                        self.download_state = PipelineState::Succeeded;
                    }
                    Err(e) => self.fail(kind, e),
                }
                self.download_status = None;
            }
        }
    }

    /// Trigger `kind`: snapshot the form into a request and mark the
    /// pipeline busy.
    ///
    /// Returns `None` when the trigger is disabled (the pipeline is already
    /// running) or when no image is selected; the latter also queues a
    /// notification.
    pub fn begin(&mut self, kind: PipelineKind) -> Option<GenerationRequest> {
        if self.state(kind).is_busy() {
            debug!(pipeline = %kind, "already running, trigger ignored");
            return None;
        }
        match build_request(&self.form, self.image.as_ref()) {
            Ok(request) => {
                self.update(Event::Started(kind));
                Some(request)
            }
            Err(e) => {
                self.notifications.push(e.notification(kind));
                None
            }
        }
    }

    fn fail(&mut self, kind: PipelineKind, error: PipelineError) {
        warn!(pipeline = %kind, error = %error, "pipeline failed");
        self.notifications.push(error.notification(kind));
        *self.state_mut(kind) = PipelineState::Failed;
    }

    pub fn state(&self, kind: PipelineKind) -> PipelineState {
        match kind {
            PipelineKind::Preview => self.preview_state,
            PipelineKind::Download => self.download_state,
        }
    }

    fn state_mut(&mut self, kind: PipelineKind) -> &mut PipelineState {
        match kind {
            PipelineKind::Preview => &mut self.preview_state,
            PipelineKind::Download => &mut self.download_state,
        }
    }

    pub fn is_busy(&self, kind: PipelineKind) -> bool {
        self.state(kind).is_busy()
    }

    /// Rotating status text of `kind`, while it is busy.
    pub fn status(&self, kind: PipelineKind) -> Option<&str> {
        match kind {
            PipelineKind::Preview => self.preview_status.as_deref(),
            PipelineKind::Download => self.download_status.as_deref(),
        }
    }

    fn status_mut(&mut self, kind: PipelineKind) -> &mut Option<String> {
        match kind {
            PipelineKind::Preview => &mut self.preview_status,
            PipelineKind::Download => &mut self.download_status,
        }
    }

    pub fn image(&self) -> Option<&SelectedImage> {
        self.image.as_ref()
    }

    /// The preview currently on screen.
    pub fn preview(&self) -> Option<&PreviewImage> {
        self.preview.as_ref()
    }

    pub fn last_download(&self) -> Option<&DownloadOutcome> {
        self.last_download.as_ref()
    }

    /// Pending notifications, oldest first. Clears the queue.
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }
}
