//! # Session Persistence
//!
//! The provider-side record of a completed login, so a later run can skip the
//! interactive step until the session expires.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::{AuthError, Result};

/// Default maximum lifetime of a stored session, in seconds.
pub const DEFAULT_SESSION_TTL_SECS: i64 = 8 * 60 * 60;

/// A persisted login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// URL of the provider that issued the credential.
    pub provider_url: String,

    /// Textual principal the session authenticated as.
    pub principal: String,

    /// When the login completed.
    pub created_at: DateTime<Utc>,

    /// When the session stops being restorable.
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    /// Creates a record for a login completing now.
    #[must_use]
    pub fn new(provider_url: impl Into<String>, principal: impl Into<String>, ttl: Duration) -> Self {
        let created_at = Utc::now();
        Self {
            provider_url: provider_url.into(),
            principal: principal.into(),
            created_at,
            expires_at: created_at + ttl,
        }
    }

    /// Returns true if the session has expired at `now`.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }
}

/// Storage for at most one [`StoredSession`].
pub trait SessionStore: Send + Sync {
    /// Loads the stored session, if any.
    ///
    /// # Errors
    ///
    /// Returns an error if the store exists but cannot be read or parsed.
    fn load(&self) -> Result<Option<StoredSession>>;

    /// Replaces the stored session.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be written.
    fn save(&self, session: &StoredSession) -> Result<()>;

    /// Removes the stored session. Clearing an empty store succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing session cannot be removed.
    fn clear(&self) -> Result<()>;
}

/// JSON file session store.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    /// Creates a store backed by `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at `<config dir>/blockxpand/session.json`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Store`] if the config directory cannot be
    /// determined.
    pub fn in_config_dir() -> Result<Self> {
        Self::default_path()
            .map(Self::new)
            .ok_or_else(|| AuthError::Store("could not determine config directory".to_string()))
    }

    /// Default session file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("blockxpand").join("session.json"))
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        if !self.path.exists() {
            tracing::debug!(path = ?self.path, "No stored session");
            return Ok(None);
        }

        let contents = fs::read_to_string(&self.path)?;
        let session = serde_json::from_str(&contents)?;
        tracing::debug!(path = ?self.path, "Loaded stored session");
        Ok(Some(session))
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(session)?;
        fs::write(&self.path, contents)?;

        tracing::info!(path = ?self.path, principal = %session.principal, "Saved session");
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                tracing::info!(path = ?self.path, "Cleared stored session");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// In-memory session store.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: Mutex<Option<StoredSession>>,
}

impl MemorySessionStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store already holding `session`.
    #[must_use]
    pub fn with_session(session: StoredSession) -> Self {
        Self {
            session: Mutex::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> Result<Option<StoredSession>> {
        Ok(self.session.lock().clone())
    }

    fn save(&self, session: &StoredSession) -> Result<()> {
        *self.session.lock() = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        *self.session.lock() = None;
        Ok(())
    }
}
