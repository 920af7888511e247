// Session state storage.
//
// The session store is a dumb persistent map over a fixed set of keys --
// no validation happens here. It is the only shared mutable resource in
// the crate: the token manager and the request client both hold a
// reference and write whole values, never partial updates.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

/// The fixed set of session storage keys.
///
/// Cleared as a unit on logout or unrecoverable auth failure -- no key
/// may keep referencing a stale token after `clear`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SessionKey {
    AccessToken,
    RefreshToken,
    IsLoggedIn,
    Username,
    UserData,
    FullUserData,
    ActiveApp,
}

impl SessionKey {
    pub const ALL: [Self; 7] = [
        Self::AccessToken,
        Self::RefreshToken,
        Self::IsLoggedIn,
        Self::Username,
        Self::UserData,
        Self::FullUserData,
        Self::ActiveApp,
    ];

    /// The wire-compatible storage key name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccessToken => "accessToken",
            Self::RefreshToken => "refreshToken",
            Self::IsLoggedIn => "isLoggedIn",
            Self::Username => "username",
            Self::UserData => "userData",
            Self::FullUserData => "fullUserData",
            Self::ActiveApp => "activeApp",
        }
    }
}

/// Key/value storage for session state.
///
/// Injected by reference into [`TokenManager`](crate::token::TokenManager)
/// and [`ApiClient`](crate::client::ApiClient) so tests can substitute a
/// double and applications can choose their persistence.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: SessionKey) -> Option<String>;
    fn set(&self, key: SessionKey, value: &str);
    fn remove(&self, key: SessionKey);

    /// Clear the full set of auth-related keys as a unit.
    fn clear(&self) {
        for key in SessionKey::ALL {
            self.remove(key);
        }
    }
}

// ── In-memory store ─────────────────────────────────────────────────

/// Ephemeral in-memory session store. Used by tests and short-lived
/// embedders that don't want tokens to outlive the process.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<HashMap<SessionKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
            .cloned()
    }

    fn set(&self, key: SessionKey, value: &str) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value.to_owned());
    }

    fn remove(&self, key: SessionKey) {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&key);
    }
}

// ── File-backed store ───────────────────────────────────────────────

/// Session store persisted as a single JSON object on disk.
///
/// Every mutation rewrites the whole file (whole-value overwrites keep
/// corruption risk low). An unreadable or corrupt file is treated as an
/// empty session rather than an error -- the worst case is that the user
/// has to log in again.
pub struct FileSessionStore {
    path: PathBuf,
    values: Mutex<HashMap<String, String>>,
}

impl FileSessionStore {
    /// Open (or lazily create) the session file at `path`.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<HashMap<String, String>>(&contents) {
                Ok(map) => map,
                Err(err) => {
                    warn!("session file {} is corrupt, starting empty: {err}", path.display());
                    HashMap::new()
                }
            },
            Err(_) => HashMap::new(),
        };
        Self {
            path,
            values: Mutex::new(values),
        }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) {
        if let Some(parent) = self.path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!("failed to create session dir {}: {err}", parent.display());
                return;
            }
        }
        match serde_json::to_string_pretty(values) {
            Ok(json) => {
                if let Err(err) = std::fs::write(&self.path, json) {
                    warn!("failed to write session file {}: {err}", self.path.display());
                }
            }
            Err(err) => warn!("failed to serialize session state: {err}"),
        }
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: SessionKey) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key.as_str())
            .cloned()
    }

    fn set(&self, key: SessionKey, value: &str) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.as_str().to_owned(), value.to_owned());
        self.persist(&values);
    }

    fn remove(&self, key: SessionKey) {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        if values.remove(key.as_str()).is_some() {
            self.persist(&values);
        }
    }
}
