//! Domain error types.

use thiserror::Error;
use uuid::Uuid;

/// Errors returned to the action that caused them.
///
/// Every variant is scoped to a single session; none of them is fatal to
/// the process.
#[derive(Debug, Error)]
pub enum GameError {
    /// The action referenced a session that does not exist (or was cleaned up).
    #[error("unknown session: {0}")]
    UnknownSession(Uuid),

    /// A mutating action was issued against a session that cannot accept it.
    #[error("invalid transition on session {session_id}: {reason}")]
    InvalidTransition {
        /// The session that rejected the action.
        session_id: Uuid,
        /// Why the action was rejected.
        reason: String,
    },

    /// The decision process did not answer within the configured deadline.
    #[error("decision process timed out after {timeout_ms} ms for session {session_id}")]
    AdapterTimeout {
        /// The session whose input was being decided.
        session_id: Uuid,
        /// The deadline that elapsed.
        timeout_ms: u64,
    },

    /// The decision process failed or returned an unusable answer.
    #[error("decision process failed for session {session_id}: {message}")]
    AdapterFailure {
        /// The session whose input was being decided.
        session_id: Uuid,
        /// Description of the failure.
        message: String,
    },

    /// The session has no live connection to deliver events to.
    #[error("session {0} has no connected client")]
    TransportDisconnected(Uuid),

    /// The action was malformed.
    #[error("validation error: {0}")]
    Validation(String),

    /// An infrastructure error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl GameError {
    /// Stable machine-readable code, used on the wire and in HTTP bodies.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::UnknownSession(_) => "unknown_session",
            Self::InvalidTransition { .. } => "invalid_transition",
            Self::AdapterTimeout { .. } => "adapter_timeout",
            Self::AdapterFailure { .. } => "adapter_failure",
            Self::TransportDisconnected(_) => "transport_disconnected",
            Self::Validation(_) => "validation_error",
            Self::Infrastructure(_) => "infrastructure_error",
        }
    }

    /// Whether resubmitting the same action may succeed.
    ///
    /// A failed decision never consumes the input, so the caller may retry it.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::AdapterTimeout { .. }
                | Self::AdapterFailure { .. }
                | Self::TransportDisconnected(_)
        )
    }

    /// The session the error is scoped to, when known.
    #[must_use]
    pub fn session_id(&self) -> Option<Uuid> {
        match self {
            Self::UnknownSession(id) | Self::TransportDisconnected(id) => Some(*id),
            Self::InvalidTransition { session_id, .. }
            | Self::AdapterTimeout { session_id, .. }
            | Self::AdapterFailure { session_id, .. } => Some(*session_id),
            Self::Validation(_) | Self::Infrastructure(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adapter_errors_are_retryable() {
        let session_id = Uuid::new_v4();
        assert!(
            GameError::AdapterTimeout {
                session_id,
                timeout_ms: 5000
            }
            .is_retryable()
        );
        assert!(
            GameError::AdapterFailure {
                session_id,
                message: "503".into()
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_invalid_transition_is_not_retryable() {
        let err = GameError::InvalidTransition {
            session_id: Uuid::new_v4(),
            reason: "game over".into(),
        };
        assert!(!err.is_retryable());
        assert_eq!(err.code(), "invalid_transition");
    }

    #[test]
    fn test_session_id_is_reported_for_scoped_errors() {
        let session_id = Uuid::new_v4();
        assert_eq!(
            GameError::UnknownSession(session_id).session_id(),
            Some(session_id)
        );
        assert_eq!(GameError::Validation("empty".into()).session_id(), None);
    }
}
