//! The decorated request pipeline for the docqa backend.
//!
//! Every call the application makes goes through one [`ApiClient`]. The
//! client owns two hooks that run around each request:
//!
//! - **Outbound**: just before dispatch, the shared [`Credential`] (the
//!   "decoration rule") is read and, if set, attached as
//!   `Authorization: Bearer <token>`. Clones of the client share the same
//!   credential, so installing or clearing it reaches every call site.
//! - **Inbound**: a `401 Unauthorized` on a [`Guard::Session`] request
//!   synchronously calls the registered [`InvalidationHook`] before the
//!   error is returned to the caller.
//!
//! ```text
//! call site → ApiRequest → [outbound: bearer] → reqwest → [inbound: 401?] → caller
//!                                                              │
//!                                                              └→ InvalidationHook (session logout)
//! ```

mod client;
mod config;
mod credential;
mod error;

pub use client::{ApiClient, ApiRequest};
pub use config::{ClientConfig, DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
pub use credential::Credential;
pub use error::TransportError;

/// Whether a request's `401` should invalidate the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Guard {
    /// A `401` means the credential is dead; run the invalidation hook.
    #[default]
    Session,
    /// A `401` is an ordinary answer (bad password on the login endpoint,
    /// a probe of a token that isn't installed yet). The hook is skipped.
    Exempt,
}

/// Receives server-signaled credential rejections.
///
/// Called synchronously from inside the pipeline, before the failing
/// request's error reaches its caller. `rejected` is the token the
/// request actually carried (`None` if it went out anonymous), which
/// lets the receiver ignore rejections of a token it has already
/// replaced.
///
/// Implementations must not block: they run on whatever task made the
/// request.
pub trait InvalidationHook: Send + Sync + 'static {
    fn on_unauthorized(&self, rejected: Option<&str>);
}
