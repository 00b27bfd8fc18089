//! The shared decoration rule: the token attached to outbound requests.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

/// A cloneable handle to the single bearer token used by the pipeline.
///
/// All clones point at the same slot. The session layer installs and
/// clears it; the client only reads it at dispatch time.
#[derive(Clone, Default)]
pub struct Credential {
    slot: Arc<RwLock<Option<String>>>,
}

impl Credential {
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `token`, replacing whatever was there.
    pub fn install(&self, token: impl Into<String>) {
        *self.slot.write() = Some(token.into());
    }

    /// Removes the token. Returns the previous one, if any.
    pub fn clear(&self) -> Option<String> {
        self.slot.write().take()
    }

    /// A copy of the current token.
    pub fn current(&self) -> Option<String> {
        self.slot.read().clone()
    }

    pub fn is_installed(&self) -> bool {
        self.slot.read().is_some()
    }
}

// Never print the token itself.
impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credential")
            .field("installed", &self.is_installed())
            .finish()
    }
}
