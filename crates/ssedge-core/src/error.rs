// ── Core error types ──
//
// User-facing errors from ssedge-core. Consumers never see raw transport
// failures: every backend call site converts into one of these kinds,
// and the conversion depends on which operation failed.

use thiserror::Error;

use crate::model::DeviceId;

/// Unified error type for the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    // ── Input ────────────────────────────────────────────────────────
    /// Malformed draft input. Never reaches the backend.
    #[error("Invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    // ── Registry ─────────────────────────────────────────────────────
    #[error("Backend unavailable: {reason}")]
    BackendUnavailable { reason: String },

    #[error("Backend error: {message}")]
    BackendError { message: String },

    /// SSH handshake during add failed. The draft stays in the form.
    #[error("Failed to add device: {reason}")]
    ConnectionFailed { reason: String },

    #[error("Device not found: {id}")]
    NotFound { id: DeviceId },

    // ── Metrics ──────────────────────────────────────────────────────
    /// Non-fatal: the poll loop keeps running.
    #[error("Metrics fetch failed: {reason}")]
    MetricsFetchFailed { reason: String },

    // ── Concurrency ──────────────────────────────────────────────────
    /// A registry mutation is already in flight.
    #[error("Cannot {operation} while another change is in progress")]
    Busy { operation: String },
}

impl CoreError {
    pub(crate) fn validation(field: &str, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.to_owned(),
            reason: reason.into(),
        }
    }

    /// Map a failed add. A command that ran and threw is an SSH/connect
    /// failure from the user's point of view.
    pub(crate) fn from_add(err: ssedge_api::Error) -> Self {
        match err {
            ssedge_api::Error::Command { message, .. } => Self::ConnectionFailed { reason: message },
            other => Self::from(other),
        }
    }

    pub(crate) fn from_metrics(err: &ssedge_api::Error) -> Self {
        Self::MetricsFetchFailed {
            reason: err.detail().to_owned(),
        }
    }

    /// Errors that leave the previously displayed state in place and are
    /// worth retrying as-is.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::BackendUnavailable { .. } | Self::MetricsFetchFailed { .. } | Self::Busy { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<ssedge_api::Error> for CoreError {
    fn from(err: ssedge_api::Error) -> Self {
        match err {
            ssedge_api::Error::Unavailable { reason } => Self::BackendUnavailable { reason },
            ssedge_api::Error::Command { message, .. }
            | ssedge_api::Error::Deserialization { message, .. }
            | ssedge_api::Error::Serialization { message, .. } => Self::BackendError { message },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ssedge_api::BackendCommand;

    #[test]
    fn add_rejection_becomes_connection_failed() {
        let err = CoreError::from_add(ssedge_api::Error::Command {
            command: BackendCommand::ConnectAndAddDevice,
            message: "Failed to connect: Connection refused".into(),
        });
        assert_eq!(
            err,
            CoreError::ConnectionFailed {
                reason: "Failed to connect: Connection refused".into()
            }
        );
    }

    #[test]
    fn unreachable_backend_stays_unavailable_on_add() {
        let err = CoreError::from_add(ssedge_api::Error::Unavailable {
            reason: "ipc closed".into(),
        });
        assert!(matches!(err, CoreError::BackendUnavailable { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn list_rejection_is_backend_error() {
        let err = CoreError::from(ssedge_api::Error::Command {
            command: BackendCommand::GetDevices,
            message: "no such table: devices".into(),
        });
        assert_eq!(
            err.to_string(),
            "Backend error: no such table: devices"
        );
        assert!(!err.is_transient());
    }
}
