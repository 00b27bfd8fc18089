//! Request and response bodies for every backend endpoint.
//!
//! Field names follow the backend's JSON exactly (`full_name`,
//! `access_token`, `meta_data`) so that serde's derive does all the work.
//! Anything the client does not interpret (identity extras, metadata
//! blobs) is kept as raw JSON rather than guessed at.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::ProtocolError;

/// Free-form metadata attached to documents, sections, and queries.
pub type Metadata = Map<String, Value>;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for an uploaded document.
///
/// Newtype wrapper so a `QueryId` can never be passed where a document is
/// expected. `#[serde(transparent)]` keeps it a bare number on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(pub i64);

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "doc-{}", self.0)
    }
}

/// A unique identifier for a question asked against the corpus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueryId(pub i64);

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "query-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

/// The identity record returned by `GET /users/me`.
///
/// The session layer stores this without interpreting it. Every field is
/// optional because the backend schema marks them optional, and unknown
/// fields are preserved in `extra` instead of being dropped.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Option<i64>,
    pub email: Option<String>,
    pub full_name: Option<String>,
    pub is_active: Option<bool>,
    /// Fields this client doesn't know about.
    #[serde(flatten)]
    pub extra: Metadata,
}

impl Identity {
    /// The best human-readable label: full name, then email.
    pub fn display_name(&self) -> Option<&str> {
        self.full_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .or(self.email.as_deref())
    }
}

/// Credentials for `POST /auth/login`, sent as
/// `application/x-www-form-urlencoded` (OAuth2 password form).
#[derive(Debug, Clone, Serialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// The successful body of `POST /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    /// Rejects a response that parsed but carries no usable token.
    pub fn validate(&self) -> Result<(), ProtocolError> {
        if self.access_token.trim().is_empty() {
            return Err(ProtocolError::InvalidMessage(
                "login response has an empty access_token".into(),
            ));
        }
        Ok(())
    }
}

/// Body for `POST /users/` (account registration).
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

// ---------------------------------------------------------------------------
// Error bodies
// ---------------------------------------------------------------------------

/// One entry of a request-validation error list (HTTP 422).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationIssue {
    pub msg: String,
    #[serde(default)]
    pub loc: Vec<Value>,
}

/// The `detail` field of an error body.
///
/// The backend sends a plain string for handled errors
/// (`{"detail": "Incorrect email or password"}`) and a list of issues for
/// validation failures. `#[serde(untagged)]` tries each variant in order,
/// so anything unexpected still parses as `Other`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Validation(Vec<ValidationIssue>),
    Other(Value),
}

/// Any non-2xx body. Every field is optional: a proxy error page or an
/// empty body must still produce an `ErrorBody` (with no detail).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
}

impl ErrorBody {
    /// The user-displayable message, if the server supplied one.
    ///
    /// Validation errors collapse to their first issue's `msg`. Blank
    /// strings count as absent so callers fall back to their own text.
    pub fn message(&self) -> Option<String> {
        let message = match self.detail.as_ref()? {
            ErrorDetail::Message(text) => text.clone(),
            ErrorDetail::Validation(issues) => issues.first()?.msg.clone(),
            ErrorDetail::Other(_) => return None,
        };
        if message.trim().is_empty() {
            None
        } else {
            Some(message)
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentImage {
    pub id: i64,
    pub image_type: String,
    pub image_path: String,
    pub section_id: i64,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub meta_data: Option<Metadata>,
}

/// A chunk of a processed document (paragraph, table, figure, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSection {
    pub id: i64,
    pub document_id: DocumentId,
    pub section_type: String,
    pub position: i64,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub page_num: Option<i64>,
    #[serde(default)]
    pub meta_data: Option<Metadata>,
    #[serde(default)]
    pub vector_id: Option<String>,
    #[serde(default)]
    pub images: Vec<DocumentImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub title: String,
    pub file_type: String,
    pub file_path: String,
    pub file_size: u64,
    pub owner_id: i64,
    /// ISO-8601 timestamp, passed through untouched.
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta_data: Option<Metadata>,
    #[serde(default)]
    pub sections: Vec<DocumentSection>,
}

/// One page of `GET /documents/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentList {
    pub documents: Vec<Document>,
    pub total: u64,
}

impl DocumentList {
    /// Number of pages needed to show `total` documents, `per_page` at a
    /// time. Zero `per_page` is treated as one.
    pub fn total_pages(&self, per_page: u64) -> u64 {
        self.total.div_ceil(per_page.max(1))
    }
}

/// Query string for `GET /documents/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ListParams {
    pub skip: u64,
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
}

impl Default for ListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
            search: None,
        }
    }
}

impl ListParams {
    /// Params for a 1-based `page` of `per_page` items. Page 0 is
    /// treated as page 1.
    pub fn page(page: u64, per_page: u64) -> Self {
        Self {
            skip: page.saturating_sub(1).saturating_mul(per_page),
            limit: per_page,
            search: None,
        }
    }

    /// Adds a search term. Blank terms are dropped.
    pub fn with_search(mut self, term: impl Into<String>) -> Self {
        let term = term.into();
        self.search = if term.trim().is_empty() { None } else { Some(term) };
        self
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// A passage of a document the answer was grounded on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub id: i64,
    pub query_id: QueryId,
    pub document_section_id: i64,
    pub content: String,
    #[serde(default)]
    pub meta_data: Option<Metadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Query {
    pub id: QueryId,
    pub query_text: String,
    pub created_at: String,
    pub is_favorite: bool,
    pub user_id: i64,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub document_id: Option<DocumentId>,
    #[serde(default)]
    pub meta_data: Option<Metadata>,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Body for `POST /queries/`. Without a `document_id` the question is
/// asked across all of the caller's documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryCreate {
    pub query_text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Metadata>,
}

/// Partial update for `PUT /queries/{id}`. Unset fields are omitted so the
/// backend leaves them alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_favorite: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<Metadata>,
}

/// Body of `POST /queries/` and `GET /queries/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    pub query: Query,
    #[serde(default)]
    pub citations: Vec<Citation>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryList {
    pub queries: Vec<Query>,
    pub total: u64,
}

/// Query string for `GET /queries/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryListParams {
    pub skip: u64,
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document_id: Option<DocumentId>,
}

impl Default for QueryListParams {
    fn default() -> Self {
        Self {
            skip: 0,
            limit: 100,
            document_id: None,
        }
    }
}

// =========================================================================
// Tests
// =========================================================================
