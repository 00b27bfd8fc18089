//! Session types: the data the client holds about who is logged in.
//!
//! A "session" is the client's record of its own authentication. It
//! tracks:
//! - WHAT state it's in (uninitialized, checking, authenticated, anonymous)
//! - WHICH token is in force (if any)
//! - WHO the backend says the token belongs to

use std::fmt;

use docqa_protocol::Identity;

// ---------------------------------------------------------------------------
// SessionConfig
// ---------------------------------------------------------------------------

/// Messages shown when an auth action fails without a server `detail`.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub login_fallback: String,
    pub register_fallback: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_fallback: "Login failed. Please check your credentials."
                .to_string(),
            register_fallback: "Registration failed. Please try again."
                .to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of the client session.
///
/// ```text
///                  token persisted
///  Uninitialized ──────────────────→ Checking ──(identity ok)──→ Authenticated
///        │                              │                           │
///        │ no token                     │ identity failed           │ logout / 401
///        ▼                              ▼                           ▼
///    Anonymous ←────────────────────────┴───────────────────────────┘
///        │
///        └──(login ok)──→ Authenticated
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    /// Nothing has been read from storage yet.
    #[default]
    Uninitialized,
    /// A persisted token is installed and being verified.
    Checking,
    /// The token was verified and the identity is known.
    Authenticated,
    /// No usable token.
    Anonymous,
}

impl SessionStatus {
    /// `true` while the UI should show a loading indicator instead of
    /// deciding between the login view and the app.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Uninitialized | Self::Checking)
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Uninitialized => write!(f, "uninitialized"),
            Self::Checking => write!(f, "checking"),
            Self::Authenticated => write!(f, "authenticated"),
            Self::Anonymous => write!(f, "anonymous"),
        }
    }
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// A snapshot of the session.
///
/// Invariants kept by [`SessionManager`](crate::SessionManager):
/// - `user` is `Some` only when `status` is `Authenticated`
/// - `token` is `Some` only in `Checking` and `Authenticated`
#[derive(Clone, Default, PartialEq)]
pub struct Session {
    pub status: SessionStatus,
    pub token: Option<String>,
    pub user: Option<Identity>,
    /// Bumped on every transition. A suspended operation compares it
    /// before writing its result so a stale answer can't resurrect an
    /// old state.
    pub generation: u64,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

// The token must never end up in logs.
impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("status", &self.status)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user)
            .field("generation", &self.generation)
            .finish()
    }
}
