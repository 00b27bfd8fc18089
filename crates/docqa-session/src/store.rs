//! Persistence for the session token.
//!
//! The token is stored under one fixed key, [`TOKEN_KEY`], so it survives
//! restarts. Storage is a trait so the manager doesn't care whether the
//! token lives in a file, in memory, or somewhere a host provides.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use docqa_protocol::{Codec, JsonCodec};
use parking_lot::Mutex;

use crate::SessionError;

/// The key the token is stored under.
pub const TOKEN_KEY: &str = "token";

/// Where the session token is persisted.
///
/// Methods are synchronous on purpose: the manager calls them while it
/// holds the session lock, so the stored token and the in-memory status
/// change together.
pub trait TokenStore: Send + Sync + 'static {
    /// The persisted token, or `None` if nothing is stored.
    fn load(&self) -> Result<Option<String>, SessionError>;

    /// Persists `token`, replacing any previous one.
    fn save(&self, token: &str) -> Result<(), SessionError>;

    /// Removes the token. Clearing an empty store is not an error.
    fn clear(&self) -> Result<(), SessionError>;
}

impl<T: TokenStore + ?Sized> TokenStore for Box<T> {
    fn load(&self) -> Result<Option<String>, SessionError> {
        (**self).load()
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        (**self).save(token)
    }

    fn clear(&self) -> Result<(), SessionError> {
        (**self).clear()
    }
}

// ---------------------------------------------------------------------------
// MemoryTokenStore
// ---------------------------------------------------------------------------

/// A store that lives as long as the process. Clones share the slot, so
/// a test can keep one clone and inspect what the manager wrote.
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenStore {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `token`, as if left by a previous run.
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(token.into()))),
        }
    }

    pub fn peek(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        Ok(self.peek())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        *self.slot.lock() = Some(token.to_string());
        Ok(())
    }

    fn clear(&self) -> Result<(), SessionError> {
        *self.slot.lock() = None;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FileTokenStore
// ---------------------------------------------------------------------------

/// A JSON key/value record on disk, e.g. `{"token": "eyJ..."}`.
///
/// Writes go to a sibling temp file that is renamed into place, and the
/// file is restricted to the owner on Unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
    codec: JsonCodec,
}

type Record = BTreeMap<String, String>;

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            codec: JsonCodec,
        }
    }

    /// `DOCQA_TOKEN_PATH` if set, else `<data dir>/docqa/session.json`.
    pub fn default_path() -> Result<PathBuf, SessionError> {
        if let Some(path) =
            env::var_os("DOCQA_TOKEN_PATH").filter(|p| !p.is_empty())
        {
            return Ok(PathBuf::from(path));
        }
        dirs::data_dir()
            .map(|dir| dir.join("docqa").join("session.json"))
            .ok_or(SessionError::NoStorageLocation)
    }

    pub fn at_default_location() -> Result<Self, SessionError> {
        Ok(Self::new(Self::default_path()?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn storage_error(&self, source: std::io::Error) -> SessionError {
        SessionError::Storage {
            path: self.path.clone(),
            source,
        }
    }

    fn read_record(&self) -> Result<Record, SessionError> {
        match fs::read(&self.path) {
            Ok(bytes) => self.codec.decode(&bytes).map_err(|source| {
                SessionError::Corrupt {
                    path: self.path.clone(),
                    source,
                }
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Record::new()),
            Err(e) => Err(self.storage_error(e)),
        }
    }

    fn write_record(&self, record: &Record) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.storage_error(e))?;
        }

        let bytes = self.codec.encode(record).map_err(|source| {
            SessionError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, bytes).map_err(|e| self.storage_error(e))?;
        restrict_permissions(&tmp).map_err(|e| self.storage_error(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| self.storage_error(e))
    }

    fn remove_file(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.storage_error(e)),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<String>, SessionError> {
        let record = self.read_record()?;
        Ok(record
            .get(TOKEN_KEY)
            .filter(|token| !token.is_empty())
            .cloned())
    }

    fn save(&self, token: &str) -> Result<(), SessionError> {
        let mut record = match self.read_record() {
            Ok(record) => record,
            Err(SessionError::Corrupt { .. }) => {
                tracing::warn!(
                    path = %self.path.display(),
                    "overwriting unreadable token record"
                );
                Record::new()
            }
            Err(e) => return Err(e),
        };
        record.insert(TOKEN_KEY.to_string(), token.to_string());
        self.write_record(&record)
    }

    fn clear(&self) -> Result<(), SessionError> {
        match self.read_record() {
            Ok(mut record) => {
                record.remove(TOKEN_KEY);
                if record.is_empty() {
                    self.remove_file()
                } else {
                    self.write_record(&record)
                }
            }
            Err(SessionError::Corrupt { .. }) => self.remove_file(),
            Err(e) => Err(e),
        }
    }
}

/// Owner read/write only (0600) on Unix.
fn restrict_permissions(path: &Path) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    #[cfg(not(unix))]
    {
        let _ = path;
    }

    Ok(())
}
