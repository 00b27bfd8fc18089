//! Structured failures for user-triggered auth actions.
//!
//! `login` and `register` can fail for ordinary reasons (wrong password,
//! email already taken, backend offline). None of those touch the
//! session, and all of them need a message the UI can show as-is.
//! [`AuthFailure::from_transport`] is the one place that turns whatever
//! went wrong into that message.

use docqa_transport::TransportError;
use serde::Serialize;

use crate::SessionError;

/// Why an auth action failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureKind {
    /// The server answered with an error status.
    Rejected,
    /// No answer: connect error, timeout, bad base URL.
    Network,
    /// The server answered 2xx with a body we couldn't use.
    InvalidResponse,
    /// The token was accepted but couldn't be persisted.
    Storage,
}

/// A failed `login` or `register`, ready to display.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct AuthFailure {
    pub kind: AuthFailureKind,
    /// The server's `detail`, or the configured fallback.
    pub message: String,
    /// HTTP status when the server answered.
    pub status: Option<u16>,
}

impl AuthFailure {
    /// Maps any pipeline error to a displayable failure. Only a
    /// server-supplied `detail` is shown verbatim; everything else gets
    /// `fallback`.
    pub fn from_transport(err: &TransportError, fallback: &str) -> Self {
        let kind = match err {
            TransportError::Unauthorized { .. }
            | TransportError::Status { .. } => AuthFailureKind::Rejected,
            TransportError::Protocol(_) => AuthFailureKind::InvalidResponse,
            TransportError::InvalidUrl { .. }
            | TransportError::Build(_)
            | TransportError::Request(_) => AuthFailureKind::Network,
        };

        Self {
            kind,
            message: err
                .detail()
                .map(str::to_string)
                .unwrap_or_else(|| fallback.to_string()),
            status: err.status(),
        }
    }

    /// A storage failure. The path and OS error stay in the logs.
    pub fn storage(err: &SessionError, fallback: &str) -> Self {
        tracing::warn!(error = %err, "could not persist token");
        Self {
            kind: AuthFailureKind::Storage,
            message: fallback.to_string(),
            status: None,
        }
    }
}

/// The `{ "success": bool, "error"?: string }` shape UI code expects
/// from an auth action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthOutcome {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&Result<(), AuthFailure>> for AuthOutcome {
    fn from(result: &Result<(), AuthFailure>) -> Self {
        match result {
            Ok(()) => Self {
                success: true,
                error: None,
            },
            Err(failure) => Self {
                success: false,
                error: Some(failure.message.clone()),
            },
        }
    }
}
