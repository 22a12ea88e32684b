use thiserror::Error;

use crate::command::BackendCommand;
use crate::transport::InvokeError;

/// Top-level error type for the `ssedge-api` crate.
///
/// `ssedge-core` maps these into the user-facing taxonomy; the split
/// between an unreachable backend and a command that threw is the only
/// distinction made here.
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// Transport could not reach the backend.
    #[error("Backend unavailable: {reason}")]
    Unavailable { reason: String },

    /// The backend ran the command and reported a failure.
    #[error("{command} failed: {message}")]
    Command {
        command: BackendCommand,
        message: String,
    },

    /// The backend answered with a shape this client does not understand.
    #[error("Malformed {command} response: {message}")]
    Deserialization {
        command: BackendCommand,
        message: String,
    },

    /// Arguments could not be encoded.
    #[error("Could not encode {command} arguments: {message}")]
    Serialization {
        command: BackendCommand,
        message: String,
    },
}

impl Error {
    pub(crate) fn from_invoke(command: BackendCommand, err: InvokeError) -> Self {
        match err {
            InvokeError::Unavailable(reason) => Self::Unavailable { reason },
            rejected @ InvokeError::Rejected(_) => Self::Command {
                command,
                message: rejected.to_string(),
            },
        }
    }

    /// Returns `true` if the backend was never reached.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable { .. })
    }

    /// The command that failed, when known.
    pub fn command(&self) -> Option<BackendCommand> {
        match self {
            Self::Unavailable { .. } => None,
            Self::Command { command, .. }
            | Self::Deserialization { command, .. }
            | Self::Serialization { command, .. } => Some(*command),
        }
    }

    /// The failure detail without the command prefix, for display.
    pub fn detail(&self) -> &str {
        match self {
            Self::Unavailable { reason } => reason,
            Self::Command { message, .. }
            | Self::Deserialization { message, .. }
            | Self::Serialization { message, .. } => message,
        }
    }
}
