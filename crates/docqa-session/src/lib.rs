//! Client-side authentication session for docqa.
//!
//! This crate owns the lifecycle of the user's credential on the client:
//!
//! 1. **Acquisition**: `login` exchanges credentials for a token
//! 2. **Persistence**: a [`TokenStore`] keeps the token across restarts
//! 3. **Attachment**: the token is installed as the pipeline's shared
//!    [`Credential`](docqa_transport::Credential)
//! 4. **Invalidation**: `logout`, or a `401` seen by the pipeline, wipes
//!    all three at once
//!
//! # How it fits in the stack
//!
//! ```text
//! UI layer (above)        ← reads status/identity, receives Route signals
//!     ↕
//! Session Layer (this crate)  ← SessionManager: the single source of truth
//!     ↕
//! Transport Layer (below) ← decorates requests, reports 401s back up
//! ```

mod auth;
mod error;
mod manager;
mod navigator;
mod session;
mod store;

pub use auth::{AuthFailure, AuthFailureKind, AuthOutcome};
pub use error::SessionError;
pub use manager::SessionManager;
pub use navigator::{ChannelNavigator, Navigator, NoopNavigator, Route};
pub use session::{Session, SessionConfig, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, TOKEN_KEY, TokenStore};
