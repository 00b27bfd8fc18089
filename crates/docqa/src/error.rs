//! Unified error type for the docqa client.

use docqa_protocol::ProtocolError;
use docqa_session::{AuthFailure, SessionError};
use docqa_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `docqa` facade crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant auto-generates `From` impls, so the `?`
/// operator converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum DocQaError {
    /// A request failed (network, error status, session invalidated).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A body couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// Token storage failed, or no one is logged in.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// `login` or `register` was refused.
    #[error(transparent)]
    Auth(#[from] AuthFailure),

    /// Caller-supplied input rejected before anything was sent.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl DocQaError {
    /// `true` if the backend rejected the session's credential. By the
    /// time the caller sees this, the session has already been ended.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Transport(e) if e.is_unauthorized())
    }
}

#[cfg(test)]
mod tests {
    use docqa_session::AuthFailureKind;

    use super::*;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::Status {
            status: 404,
            detail: Some("Document not found".into()),
        };
        let docqa_err: DocQaError = err.into();
        assert!(matches!(docqa_err, DocQaError::Transport(_)));
        assert!(docqa_err.to_string().contains("Document not found"));
        assert!(!docqa_err.is_unauthorized());
    }

    #[test]
    fn test_from_protocol_error() {
        let err = ProtocolError::InvalidMessage("bad".into());
        let docqa_err: DocQaError = err.into();
        assert!(matches!(docqa_err, DocQaError::Protocol(_)));
    }

    #[test]
    fn test_from_session_error() {
        let docqa_err: DocQaError = SessionError::NotAuthenticated.into();
        assert!(matches!(docqa_err, DocQaError::Session(_)));
    }

    #[test]
    fn test_from_auth_failure_displays_message() {
        let failure = AuthFailure {
            kind: AuthFailureKind::Rejected,
            message: "Invalid credentials".into(),
            status: Some(400),
        };
        let docqa_err: DocQaError = failure.into();
        assert_eq!(docqa_err.to_string(), "Invalid credentials");
    }

    #[test]
    fn test_is_unauthorized() {
        let err: DocQaError =
            TransportError::Unauthorized { detail: None }.into();
        assert!(err.is_unauthorized());
    }
}
