//! Persisted session storage.
//!
//! The store keeps the bearer token, the user's role and the user id between
//! runs. Storage is injected into [`crate::Store`] rather than looked up
//! ambiently, so tests and embedders choose where (or whether) it lands.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use cartwheel_core::{UserId, UserRole};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing the persisted session.
#[derive(Debug, Error)]
pub enum TokenStoreError {
    /// Filesystem operation failed.
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The session file exists but is not valid JSON.
    #[error("Corrupt session file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// What survives between runs after a successful sign-in.
///
/// Implements `Debug` manually to redact the token.
#[derive(Clone)]
pub struct PersistedSession {
    /// Bearer token issued by the backend.
    pub token: SecretString,
    /// Role of the signed-in user.
    pub user_role: Option<UserRole>,
    /// ID of the signed-in user.
    pub user_id: Option<UserId>,
}

impl std::fmt::Debug for PersistedSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedSession")
            .field("token", &"[REDACTED]")
            .field("user_role", &self.user_role)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// On-disk shape of a [`PersistedSession`].
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredSession {
    token: String,
    #[serde(default)]
    user_role: Option<UserRole>,
    #[serde(default)]
    user_id: Option<UserId>,
}

impl From<&PersistedSession> for StoredSession {
    fn from(session: &PersistedSession) -> Self {
        Self {
            token: session.token.expose_secret().to_owned(),
            user_role: session.user_role.clone(),
            user_id: session.user_id.clone(),
        }
    }
}

impl From<StoredSession> for PersistedSession {
    fn from(stored: StoredSession) -> Self {
        Self {
            token: SecretString::from(stored.token),
            user_role: stored.user_role,
            user_id: stored.user_id,
        }
    }
}

/// Storage for the persisted session.
pub trait TokenStore: Send + Sync {
    /// Load the persisted session, `None` if nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage exists but cannot be read.
    fn load(&self) -> Result<Option<PersistedSession>, TokenStoreError>;

    /// Persist `session`, replacing whatever was stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage cannot be written.
    fn save(&self, session: &PersistedSession) -> Result<(), TokenStoreError>;

    /// Remove the persisted session. Clearing empty storage is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if existing storage cannot be removed.
    fn clear(&self) -> Result<(), TokenStoreError>;
}

/// Shared storage, so a caller can keep a handle to what the store persists.
impl<T: TokenStore + ?Sized> TokenStore for Arc<T> {
    fn load(&self) -> Result<Option<PersistedSession>, TokenStoreError> {
        (**self).load()
    }

    fn save(&self, session: &PersistedSession) -> Result<(), TokenStoreError> {
        (**self).save(session)
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        (**self).clear()
    }
}

// =============================================================================
// FileTokenStore
// =============================================================================

/// Persists the session as a small JSON file.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    /// Store the session at `path`. Parent directories are created on save.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the session file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> TokenStoreError {
        TokenStoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl TokenStore for FileTokenStore {
    fn load(&self) -> Result<Option<PersistedSession>, TokenStoreError> {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(self.io_error(e)),
        };

        let stored: StoredSession =
            serde_json::from_str(&contents).map_err(|source| TokenStoreError::Corrupt {
                path: self.path.clone(),
                source,
            })?;

        if stored.token.is_empty() {
            return Ok(None);
        }
        Ok(Some(stored.into()))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), TokenStoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }

        let body = serde_json::to_vec_pretty(&StoredSession::from(session)).map_err(|source| {
            TokenStoreError::Corrupt {
                path: self.path.clone(),
                source,
            }
        })?;
        std::fs::write(&self.path, body).map_err(|e| self.io_error(e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .map_err(|e| self.io_error(e))?;
        }

        tracing::debug!(path = %self.path.display(), "Session persisted");
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_error(e)),
        }
    }
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

/// Keeps the session in process memory only.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    slot: Mutex<Option<StoredSessionSlot>>,
}

/// Redacting wrapper so the derived `Debug` of the store never prints the token.
struct StoredSessionSlot(StoredSession);

impl std::fmt::Debug for StoredSessionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StoredSession([REDACTED])")
    }
}

impl MemoryTokenStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that starts out holding `session`.
    #[must_use]
    pub fn with_session(session: &PersistedSession) -> Self {
        Self {
            slot: Mutex::new(Some(StoredSessionSlot(StoredSession::from(session)))),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Result<Option<PersistedSession>, TokenStoreError> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(slot.as_ref().map(|StoredSessionSlot(stored)| PersistedSession {
            token: SecretString::from(stored.token.clone()),
            user_role: stored.user_role.clone(),
            user_id: stored.user_id.clone(),
        }))
    }

    fn save(&self, session: &PersistedSession) -> Result<(), TokenStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) =
            Some(StoredSessionSlot(StoredSession::from(session)));
        Ok(())
    }

    fn clear(&self) -> Result<(), TokenStoreError> {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
        Ok(())
    }
}
