//! Wire protocol for the docqa backend.
//!
//! This crate defines the "language" that the client and the backend speak
//! over HTTP:
//!
//! - **Types** ([`Identity`], [`TokenResponse`], [`Document`], [`Query`],
//!   etc.): the request and response bodies of every endpoint.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how those bodies are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]): what can go wrong during
//!   encoding/decoding.
//!
//! # Architecture
//!
//! The protocol layer sits below the request pipeline. It doesn't know
//! about tokens, sessions, or HTTP clients: it only knows the shapes
//! the backend accepts and returns.
//!
//! ```text
//! Session (auth lifecycle) → Transport (decorated requests) → Protocol (bodies)
//! ```

mod codec;
mod error;
mod types;

pub use codec::{Codec, JsonCodec};
pub use error::ProtocolError;
pub use types::{
    Citation, Document, DocumentId, DocumentImage, DocumentList,
    DocumentSection, ErrorBody, ErrorDetail, Identity, ListParams,
    LoginForm, Query, QueryCreate, QueryId, QueryList, QueryListParams,
    QueryResponse, QueryUpdate, RegisterRequest, TokenResponse,
    ValidationIssue,
};
