//! Errors a command can end with.

use otto_schema::{DocumentError, NameError};
use thiserror::Error;

use crate::archive::ArchiveError;
use crate::pack::PackError;
use crate::process::ProcessError;
use crate::registry::RegistryError;
use crate::script::LoadError;

/// Everything that can terminate the current invocation.
#[derive(Error, Debug)]
pub enum CommandError {
    /// Lookup or loading through the registry failed.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A pack lifecycle operation failed.
    #[error(transparent)]
    Pack(#[from] PackError),

    /// Packaging or installing an archive failed.
    #[error(transparent)]
    Archive(#[from] ArchiveError),

    /// An external process failed.
    #[error(transparent)]
    Process(#[from] ProcessError),

    /// A configuration document could not be read or written.
    #[error(transparent)]
    Document(#[from] DocumentError),

    /// A script could not be read or parsed.
    #[error(transparent)]
    Load(#[from] LoadError),

    /// A user-supplied name was invalid.
    #[error("{0}")]
    Name(#[from] NameError),

    /// IO error outside any document or pack operation.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The command was called with the wrong arguments.
    #[error("Usage:\n  $ {0}")]
    Usage(String),

    /// The configured completion tone could not be found.
    #[error("tone not found: {0}")]
    ToneNotFound(String),

    /// The user interrupted the operation.
    #[error("interrupted")]
    Interrupted,

    /// Anything else.
    #[error("{0}")]
    Other(String),
}

impl CommandError {
    /// A usage error for `otto <command> <synopsis>`.
    pub fn usage(command: &str, synopsis: &str) -> Self {
        if synopsis.is_empty() {
            Self::Usage(format!("otto {command}"))
        } else {
            Self::Usage(format!("otto {command} {synopsis}"))
        }
    }

    /// Whether this error stems from a user interrupt.
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Interrupted | Self::Process(ProcessError::Interrupted)
        )
    }
}

impl From<anyhow::Error> for CommandError {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_message() {
        let err = CommandError::usage("new", "name [args ...]");
        assert_eq!(err.to_string(), "Usage:\n  $ otto new name [args ...]");

        let err = CommandError::usage("gitcheck", "");
        assert_eq!(err.to_string(), "Usage:\n  $ otto gitcheck");
    }

    #[test]
    fn test_interrupt_detection() {
        assert!(CommandError::Interrupted.is_interrupted());
        assert!(CommandError::from(ProcessError::Interrupted).is_interrupted());
        assert!(!CommandError::Other("x".into()).is_interrupted());
    }
}
