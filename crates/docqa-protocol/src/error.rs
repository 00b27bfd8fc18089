//! Error types for the protocol layer.
//!
//! Each crate in the workspace defines its own error enum. When you see a
//! `ProtocolError`, you know the problem is a body that could not be
//! serialized or parsed, not a network failure or a rejected session.

/// Errors that can occur in the protocol layer.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed (turning bytes into a Rust type).
    ///
    /// Common causes: the backend changed a field type, a proxy returned
    /// an HTML error page, or the body was truncated.
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// The body parsed but violates what the API promises, e.g. a login
    /// response with an empty `access_token`.
    #[error("invalid message: {0}")]
    InvalidMessage(String),
}
