//! # docqa
//!
//! Authenticated client for the docqa document Q&A backend.
//!
//! docqa keeps one session per application: it restores a persisted
//! token on startup, attaches it to every request, and ends the session
//! everywhere at once when the user logs out or the backend rejects the
//! token. Documents and queries are plain REST resources on top of that
//! pipeline.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docqa::prelude::*;
//!
//! # async fn run() -> Result<(), DocQaError> {
//! let client = DocQaClient::builder()
//!     .config(ClientConfig::from_env())
//!     .build()?;
//!
//! if client.initialize().await != SessionStatus::Authenticated {
//!     client.session().login("a@x.com", "secret").await?;
//! }
//!
//! let docs = client.documents().list(&ListParams::page(1, 10)).await?;
//! println!("{} documents", docs.total);
//! # Ok(())
//! # }
//! ```

mod client;
mod documents;
mod error;
mod queries;

pub use client::{DocQaClient, DocQaClientBuilder};
pub use documents::{DocumentApi, UploadRequest};
pub use error::DocQaError;
pub use queries::QueryApi;

pub use docqa_protocol as protocol;
pub use docqa_session as session;
pub use docqa_transport as transport;

pub mod prelude {
    pub use crate::{
        DocQaClient, DocQaClientBuilder, DocQaError, DocumentApi, QueryApi,
        UploadRequest,
    };
    pub use docqa_protocol::{
        Citation, Document, DocumentId, DocumentList, Identity, ListParams,
        Query, QueryCreate, QueryId, QueryList, QueryListParams,
        QueryResponse, QueryUpdate,
    };
    pub use docqa_session::{
        AuthFailure, AuthFailureKind, AuthOutcome, ChannelNavigator,
        FileTokenStore, MemoryTokenStore, Navigator, Route, Session,
        SessionConfig, SessionManager, SessionStatus, TokenStore,
    };
    pub use docqa_transport::{ClientConfig, TransportError};
}
