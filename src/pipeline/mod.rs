//! Generation pipelines: request → bytes → decode → act.
//!
//! Two independent pipelines share this module's vocabulary:
//!
//! | Pipeline | Endpoint | Stages | Ends in |
//! |---|---|---|---|
//! | [`preview`] | `generate-preview/` | requesting → decoding | `ready` (image + aspect ratio) |
//! | [`download`] | `generate-stencil/` | requesting → decoding → locating → writing | `shared` or `saved` |
//!
//! Each stage is awaited before the next begins. Every failure is returned
//! as a [`PipelineError`] at the pipeline boundary; the
//! [`Session`](crate::session::Session) turns it into a [`Notification`] and
//! clears the busy flag. Nothing is retried.
//!
//! Stage transitions can be observed through an optional [`ProgressSender`],
//! the same way the presentation layer watches progress.

pub mod download;
pub mod preview;

use crate::persist::WriteError;
use crate::storage::StorageError;
use crate::transport::TransportError;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

pub use download::{DownloadOutcome, DownloadPipeline};
pub use preview::{PreviewImage, PreviewPipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PipelineKind {
    Preview,
    Download,
}

impl PipelineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            PipelineKind::Preview => "preview",
            PipelineKind::Download => "download",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// An in-flight step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Requesting,
    Decoding,
    /// Download only.
    Locating,
    /// Download only.
    Writing,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Requesting => "requesting",
            Stage::Decoding => "decoding",
            Stage::Locating => "locating",
            Stage::Writing => "writing",
        }
    }
}

/// A stage transition of one pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PipelineEvent {
    pub kind: PipelineKind,
    pub stage: Stage,
}

pub type ProgressSender = UnboundedSender<PipelineEvent>;

/// Lifecycle of one pipeline as seen by the interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PipelineState {
    #[default]
    Idle,
    InFlight(Stage),
    Succeeded,
    Failed,
}

impl PipelineState {
    /// Whether the pipeline's trigger is disabled.
    pub fn is_busy(self) -> bool {
        matches!(self, PipelineState::InFlight(_))
    }
}

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("no image selected")]
    NoImageSelected,
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[from] StorageError),
    #[error("write failure: {0}")]
    Write(#[from] WriteError),
}

impl PipelineError {
    /// The message shown to the user when `kind` fails with this error.
    ///
    /// Transport, storage and write failures get distinct wording so the
    /// user can tell "couldn't reach the server" from "couldn't save".
    pub fn notification(&self, kind: PipelineKind) -> Notification {
        match (self, kind) {
            (PipelineError::NoImageSelected, _) => {
                Notification::new("Upload", "Please select an image first.")
            }
            (PipelineError::Transport(_), PipelineKind::Preview) => {
                Notification::new("Error", "Failed to generate preview.")
            }
            (PipelineError::Transport(_), PipelineKind::Download) => Notification::new(
                "Download Error",
                "Could not get the stencil from the server.",
            ),
            (PipelineError::StorageUnavailable(_), _) => {
                Notification::new("Error", "Could not determine phone storage path.")
            }
            (PipelineError::Write(_), _) => {
                Notification::new("Storage Error", "Could not write to phone storage.")
            }
        }
    }
}

/// A user-facing alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn new(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.message)
    }
}

/// Send a stage transition if anyone is listening.
pub(crate) fn report(progress: Option<&ProgressSender>, kind: PipelineKind, stage: Stage) {
    tracing::debug!(pipeline = %kind, stage = stage.as_str(), "stage");
    if let Some(tx) = progress {
        // The receiver may have gone away; progress is best effort.
        let _ = tx.send(PipelineEvent { kind, stage });
    }
}
