//! Codec trait and the JSON implementation used for request/response bodies.
//!
//! A "codec" (coder/decoder) converts between Rust types and raw bytes.
//! The transport reads response bodies as bytes and hands them to a
//! [`Codec`]; the file token store uses the same codec for its on-disk
//! record. Keeping this behind a trait means tests can swap the format
//! without touching the pipeline.

use serde::{de::DeserializeOwned, Serialize};

use crate::ProtocolError;

/// A codec that can encode Rust types to bytes and decode bytes back.
///
/// ## Trait bounds explained
///
/// - `Send + Sync` → safe to share between tasks (the client is cloned
///   into every call site and may be driven from any Tokio worker).
/// - `'static` → the codec owns everything it needs.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed,
    /// incomplete, or don't match the expected type.
    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON (via `serde_json`), the only format the
/// backend speaks.
///
/// ## Example
///
/// ```rust
/// use docqa_protocol::{Codec, JsonCodec, TokenResponse};
///
/// let codec = JsonCodec;
/// let token: TokenResponse = codec
///     .decode(br#"{"access_token":"tok1","token_type":"bearer"}"#)
///     .unwrap();
/// assert_eq!(token.access_token, "tok1");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    fn encode<T: Serialize>(
        &self,
        value: &T,
    ) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(
        &self,
        data: &[u8],
    ) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
