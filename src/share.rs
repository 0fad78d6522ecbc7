//! Share facility the written PDF is handed to.
//!
//! On a phone this is the OS share sheet. The CLI can only approximate it:
//! [`CommandShare`] runs a configured program (an opener, a mailer, a sync
//! script) with the file path; [`NoShare`] reports sharing as unavailable so
//! the download ends in the `saved` state.

use std::future::Future;
use thiserror::Error;
use tracing::info;

pub const PDF_MIME: &str = "application/pdf";

#[derive(Error, Debug)]
pub enum ShareError {
    #[error("could not run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("{program} exited with {status}")]
    Failed { program: String, status: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareOptions {
    pub mime_type: String,
    pub dialog_title: String,
}

impl ShareOptions {
    pub fn pdf(dialog_title: impl Into<String>) -> Self {
        Self {
            mime_type: PDF_MIME.to_string(),
            dialog_title: dialog_title.into(),
        }
    }
}

pub trait ShareFacility: Sync {
    fn is_available(&self) -> impl Future<Output = bool> + Send;

    fn share(
        &self,
        path: &str,
        options: &ShareOptions,
    ) -> impl Future<Output = Result<(), ShareError>> + Send;
}

/// No share facility on this device.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoShare;

impl ShareFacility for NoShare {
    async fn is_available(&self) -> bool {
        false
    }

    async fn share(&self, _path: &str, _options: &ShareOptions) -> Result<(), ShareError> {
        Ok(())
    }
}

/// Runs `program <path>`.
#[derive(Debug, Clone)]
pub struct CommandShare {
    program: String,
}

impl CommandShare {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl ShareFacility for CommandShare {
    async fn is_available(&self) -> bool {
        !self.program.trim().is_empty()
    }

    async fn share(&self, path: &str, options: &ShareOptions) -> Result<(), ShareError> {
        info!(program = %self.program, path, title = %options.dialog_title, "sharing");
        let status = tokio::process::Command::new(&self.program)
            .arg(path)
            .env("STENCIL_MIME_TYPE", &options.mime_type)
            .env("STENCIL_TITLE", &options.dialog_title)
            .status()
            .await
            .map_err(|source| ShareError::Spawn {
                program: self.program.clone(),
                source,
            })?;
        if !status.success() {
            return Err(ShareError::Failed {
                program: self.program.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Either share implementation, picked from config at startup.
#[derive(Debug, Clone)]
pub enum ConfiguredShare {
    None(NoShare),
    Command(CommandShare),
}

impl ConfiguredShare {
    pub fn from_command(command: Option<&str>) -> Self {
        match command {
            Some(program) => ConfiguredShare::Command(CommandShare::new(program)),
            None => ConfiguredShare::None(NoShare),
        }
    }
}

impl ShareFacility for ConfiguredShare {
    async fn is_available(&self) -> bool {
        match self {
            ConfiguredShare::None(s) => s.is_available().await,
            ConfiguredShare::Command(s) => s.is_available().await,
        }
    }

    async fn share(&self, path: &str, options: &ShareOptions) -> Result<(), ShareError> {
        match self {
            ConfiguredShare::None(s) => s.share(path, options).await,
            ConfiguredShare::Command(s) => s.share(path, options).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn no_share_is_unavailable() {
        assert!(!NoShare.is_available().await);
    }

    #[tokio::test]
    async fn configured_share_follows_command() {
        assert!(!ConfiguredShare::from_command(None).is_available().await);
        assert!(
            ConfiguredShare::from_command(Some("xdg-open"))
                .is_available()
                .await
        );
    }

    #[tokio::test]
    async fn missing_program_is_spawn_error() {
        let share = CommandShare::new("/no/such/program-stencil");
        let err = share
            .share("/tmp/x.pdf", &ShareOptions::pdf("t"))
            .await
            .unwrap_err();
        assert!(matches!(err, ShareError::Spawn { .. }));
    }

    #[test]
    fn pdf_options() {
        let options = ShareOptions::pdf("Your Stencil PDF");
        assert_eq!(options.mime_type, "application/pdf");
        assert_eq!(options.dialog_title, "Your Stencil PDF");
    }
}
