//! Loading feedback: rotating status messages while a request is running.
//!
//! Each pipeline kind has its own pool of messages. A [`LoadingRotator`]
//! shows the first message of its pool as soon as it starts, then moves to
//! the next one every interval, wrapping around at the end of the pool.
//!
//! The rotator owns its timer task. Dropping the rotator (or calling
//! [`LoadingRotator::stop`]) aborts the task and closes the status channel,
//! so no tick can land after the pipeline has finished.
//!
//! Status text is per pipeline: a preview and a download running at the same
//! time each get their own rotator and their own channel.

use crate::pipeline::PipelineKind;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::trace;

/// Default time between two messages.
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(800);

/// Shown while a preview renders.
pub const PREVIEW_MESSAGES: &[&str] = &[
    "Pretending this is modern art...",
    "Judging the lighting (it's fine)...",
    "Manifesting a masterpiece...",
    "Convincing the pixels to cooperate...",
    "Downloading more RAM...",
    "Removing the boring parts...",
    "Baking the pixels at 350°...",
    "Spilling tea on the server...",
    "Doing very complex math (please wait)...",
    "Asking the AI nicely...",
    "Beeping. Booping. Processing.",
    "Running a very expensive algorithm...",
    "Loading... (Pretend this is fast)...",
];

/// Shown while a PDF renders and saves.
pub const DOWNLOAD_MESSAGES: &[&str] = &[
    "Please hold, I dropped the paint...",
    "Converting code into art...",
    "Summoning the Art Gods...",
    "Making sure it doesn't look like a blob...",
    "Compiling excuses for the delay...",
    "Slicing onions (crying)...",
    "Drawing lines with a steady hand...",
    "Distracting you with words...",
    "Gone for a snack, be right back...",
    "Marinating the image...",
    "Detecting edges (and trying not to fall off)...",
    "Generating aesthetic vibes...",
    "Teaching your phone art theory...",
];

/// Message pool for `kind`.
pub fn messages_for(kind: PipelineKind) -> &'static [&'static str] {
    match kind {
        PipelineKind::Preview => PREVIEW_MESSAGES,
        PipelineKind::Download => DOWNLOAD_MESSAGES,
    }
}

/// Circular cursor over a message pool.
#[derive(Debug, Clone)]
pub struct StatusCycle {
    pool: &'static [&'static str],
    index: usize,
}

impl StatusCycle {
    /// Start at the first message. `pool` must not be empty.
    pub fn new(pool: &'static [&'static str]) -> Self {
        debug_assert!(!pool.is_empty(), "status pool must not be empty");
        Self { pool, index: 0 }
    }

    pub fn current(&self) -> &'static str {
        self.pool.get(self.index).copied().unwrap_or_default()
    }

    /// Move to the next message, wrapping to the first.
    pub fn advance(&mut self) -> &'static str {
        if !self.pool.is_empty() {
            self.index = (self.index + 1) % self.pool.len();
        }
        self.current()
    }
}

/// A running status rotation for one pipeline.
#[derive(Debug)]
pub struct LoadingRotator {
    kind: PipelineKind,
    task: JoinHandle<()>,
}

impl LoadingRotator {
    /// Start rotating `kind`'s messages into a fresh channel.
    ///
    /// The receiver already holds the first message.
    pub fn start(kind: PipelineKind, period: Duration) -> (Self, watch::Receiver<String>) {
        let mut cycle = StatusCycle::new(messages_for(kind));
        let (tx, rx) = watch::channel(cycle.current().to_string());

        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let message = cycle.advance();
                trace!(pipeline = %kind, message, "status tick");
                if tx.send(message.to_string()).is_err() {
                    // Nobody is watching any more.
                    break;
                }
            }
        });

        (Self { kind, task }, rx)
    }

    pub fn kind(&self) -> PipelineKind {
        self.kind
    }

    /// Tear the timer down.
    pub fn stop(self) {
        // Drop does the work.
    }
}

impl Drop for LoadingRotator {
    fn drop(&mut self) {
        self.task.abort();
    }
}
