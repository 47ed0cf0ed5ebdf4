//! Result of one resource call and the closed failure taxonomy.

use serde::Serialize;
use serde_json::Value;

/// Failure categories recognised by the sync core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// No response was obtained (unreachable, timed out, aborted).
    Transport,
    /// The server answered with a status outside `200..=299`.
    HttpError,
    /// A 2xx body that is not JSON or not the expected shape.
    SchemaMismatch,
    /// One record was dropped during binding; never fatal.
    ValidationSoft,
}

/// Classified result of exactly one exchange.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome {
    /// 2xx status with a payload of the expected shape.
    Success {
        /// HTTP status.
        status: u16,
        /// Parsed JSON payload.
        payload: Value,
    },
    /// Any other result.
    Failure {
        /// Failure category.
        kind: ErrorKind,
        /// Human-readable description, taken from the server when possible.
        message: String,
        /// HTTP status, when a response was received.
        status: Option<u16>,
    },
}

impl FetchOutcome {
    /// Successful outcome.
    #[must_use]
    pub const fn success(status: u16, payload: Value) -> Self {
        Self::Success { status, payload }
    }

    /// Failed outcome.
    pub fn failure(kind: ErrorKind, message: impl Into<String>, status: Option<u16>) -> Self {
        Self::Failure {
            kind,
            message: message.into(),
            status,
        }
    }

    /// Whether the call succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Failure category, if the call failed.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }

    /// Payload, if the call succeeded.
    #[must_use]
    pub const fn payload(&self) -> Option<&Value> {
        match self {
            Self::Success { payload, .. } => Some(payload),
            Self::Failure { .. } => None,
        }
    }

    /// HTTP status, when a response was received.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Success { status, .. } => Some(*status),
            Self::Failure { status, .. } => *status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_exposes_payload_and_status() {
        let outcome = FetchOutcome::success(200, json!([]));
        assert!(outcome.is_success());
        assert_eq!(outcome.status(), Some(200));
        assert_eq!(outcome.payload(), Some(&json!([])));
        assert_eq!(outcome.error_kind(), None);
    }

    #[test]
    fn transport_failure_has_no_status() {
        let outcome = FetchOutcome::failure(ErrorKind::Transport, "refused", None);
        assert!(!outcome.is_success());
        assert_eq!(outcome.status(), None);
        assert_eq!(outcome.error_kind(), Some(ErrorKind::Transport));
        assert!(outcome.payload().is_none());
    }

    #[test]
    fn error_kinds_serialise_in_snake_case() {
        let encoded = serde_json::to_string(&ErrorKind::SchemaMismatch).expect("serialise kind");
        assert_eq!(encoded, "\"schema_mismatch\"");
    }
}
