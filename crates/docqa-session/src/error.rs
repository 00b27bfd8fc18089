//! Error types for the session layer.

use std::path::PathBuf;

use docqa_protocol::ProtocolError;

/// Errors that can occur while managing the session.
///
/// Auth-action failures (bad password, duplicate account) are not here:
/// those are expected outcomes and come back as
/// [`AuthFailure`](crate::AuthFailure).
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Reading or writing the persisted token failed.
    #[error("token storage failed at {}: {source}", path.display())]
    Storage {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The token file exists but isn't a record this client wrote.
    #[error("token record at {} is unreadable: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: ProtocolError,
    },

    /// No platform data directory and no `DOCQA_TOKEN_PATH` override.
    #[error("no location for the token file (set DOCQA_TOKEN_PATH)")]
    NoStorageLocation,

    /// The operation needs an authenticated session.
    #[error("not authenticated")]
    NotAuthenticated,
}
