//! Durable storage for the session's credential material.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use shared::models::TokenResponse;
use std::{
    fmt, fs, io,
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};
use tracing::{debug, warn};

use crate::error::{ClientError, ClientResult};

/// Tokens for one session plus the absolute instant the access token stops working.
#[derive(Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl TokenBundle {
    /// Build a bundle from a login or refresh response received at `issued_at`.
    ///
    /// # Errors
    /// Returns [`ClientError::InvalidExpiry`] when `expires_in` is negative or the
    /// resulting instant is out of range.
    pub fn from_response(
        response: &TokenResponse,
        issued_at: DateTime<Utc>,
    ) -> ClientResult<Self> {
        let expires_at = (response.expires_in >= 0)
            .then(|| Duration::try_seconds(response.expires_in))
            .flatten()
            .and_then(|lifetime| issued_at.checked_add_signed(lifetime))
            .ok_or(ClientError::InvalidExpiry(response.expires_in))?;

        Ok(Self {
            access_token: response.access_token.clone(),
            refresh_token: response.refresh_token.clone(),
            id_token: response.id_token.clone(),
            expires_at,
        })
    }

    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at
    }
}

impl fmt::Debug for TokenBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenBundle")
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("has_id_token", &self.id_token.is_some())
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

/// Key-value persistence for a [`TokenBundle`].
///
/// Absence is a valid state: `read` never fails, it reports `None`.
pub trait TokenStore: Send + Sync {
    fn read(&self) -> Option<TokenBundle>;

    /// Replace whatever was stored before.
    ///
    /// # Errors
    /// Returns an I/O error when the backing storage cannot be written.
    fn write(&self, bundle: &TokenBundle) -> io::Result<()>;

    /// Remove every stored key. Clearing an empty store succeeds.
    ///
    /// # Errors
    /// Returns an I/O error when the backing storage cannot be removed.
    fn clear(&self) -> io::Result<()>;

    /// True when nothing is stored or the stored access token has expired.
    fn is_expired(&self) -> bool {
        self.read()
            .is_none_or(|bundle| bundle.is_expired_at(Utc::now()))
    }
}

/// Process-local store; the session ends with the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    bundle: Mutex<Option<TokenBundle>>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_bundle(bundle: TokenBundle) -> Self {
        Self {
            bundle: Mutex::new(Some(bundle)),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read(&self) -> Option<TokenBundle> {
        self.bundle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn write(&self, bundle: &TokenBundle) -> io::Result<()> {
        *self.bundle.lock().unwrap_or_else(PoisonError::into_inner) = Some(bundle.clone());
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        self.bundle
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        Ok(())
    }
}

/// JSON file store, readable only by the owning user on unix.
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_parent(&self) -> io::Result<()> {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => fs::create_dir_all(parent),
            _ => Ok(()),
        }
    }
}

impl TokenStore for FileTokenStore {
    fn read(&self) -> Option<TokenBundle> {
        let contents = match fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return None,
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read token file");
                return None;
            }
        };

        match serde_json::from_str(&contents) {
            Ok(bundle) => Some(bundle),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "ignoring unreadable token file");
                None
            }
        }
    }

    fn write(&self, bundle: &TokenBundle) -> io::Result<()> {
        self.ensure_parent()?;
        let contents = serde_json::to_vec_pretty(bundle).map_err(io::Error::other)?;
        fs::write(&self.path, contents)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, fs::Permissions::from_mode(0o600))?;
        }
        debug!(path = %self.path.display(), "stored session tokens");
        Ok(())
    }

    fn clear(&self) -> io::Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "removed session tokens");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err),
        }
    }
}
