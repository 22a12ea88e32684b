// ── Invoke transport ──
//
// The seam between this client and whatever carries commands to the
// backend (an IPC bridge, an in-process handler, a test double).

use std::future::Future;

use serde_json::Value;
use thiserror::Error;

use crate::command::BackendCommand;

/// Failure reported by the transport for a single command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvokeError {
    /// The backend could not be reached at all.
    #[error("backend unreachable: {0}")]
    Unavailable(String),

    /// The command ran and threw. The payload is opaque: a string or any
    /// structured value the backend chose to return.
    #[error("{}", render_payload(.0))]
    Rejected(Value),
}

impl InvokeError {
    /// Shorthand for a rejection carrying a plain message.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected(Value::String(message.into()))
    }
}

/// Render an opaque error payload for display. Strings are shown as-is,
/// anything else as compact JSON.
pub fn render_payload(payload: &Value) -> String {
    match payload {
        Value::String(s) => s.clone(),
        Value::Null => "unknown error".to_owned(),
        other => other.to_string(),
    }
}

/// Carries one command to the backend and returns its raw JSON result.
///
/// Implementations must not retry; retry policy belongs to the caller.
pub trait Invoke: Send + Sync + 'static {
    fn invoke(
        &self,
        command: BackendCommand,
        args: Value,
    ) -> impl Future<Output = Result<Value, InvokeError>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn string_payloads_render_verbatim() {
        let err = InvokeError::rejected("Failed to connect: timeout");
        assert_eq!(err.to_string(), "Failed to connect: timeout");
    }

    #[test]
    fn structured_payloads_render_as_json() {
        let err = InvokeError::Rejected(json!({ "code": 7 }));
        assert_eq!(err.to_string(), r#"{"code":7}"#);
    }

    #[test]
    fn null_payload_has_a_placeholder() {
        assert_eq!(render_payload(&Value::Null), "unknown error");
    }
}
