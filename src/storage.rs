// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable key-value storage for the session.
//!
//! String keys map to string values, like a browser's local storage.
//! When opened on a file, every write is flushed through as a single JSON
//! object (written to a temporary file, then renamed into place).

use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::models::UserRecord;

/// Storage keys shared with the session and identity adapters.
pub mod keys {
    pub const USER_DATA: &str = "user_data";
    pub const IS_LOGGED_IN: &str = "is_logged_in";
    pub const USER_ID: &str = "userId";
    pub const USER_ROLE: &str = "userRole";
    pub const TEST_TOKEN: &str = "testToken";
    pub const IDENTITY_REFRESH_TOKEN: &str = "identityRefreshToken";
    pub const IDENTITY_USER: &str = "identityUser";
}

/// Keys owned by the session; cleared together on logout.
const SESSION_KEYS: &[&str] = &[
    keys::USER_DATA,
    keys::IS_LOGGED_IN,
    keys::USER_ID,
    keys::USER_ROLE,
    keys::TEST_TOKEN,
];

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Corrupt storage file {}: {source}", path.display())]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug)]
struct Inner {
    entries: DashMap<String, String>,
    path: Option<PathBuf>,
    flush_lock: Mutex<()>,
}

/// Cheaply clonable handle to the key-value store.
#[derive(Debug, Clone)]
pub struct KeyValueStore {
    inner: Arc<Inner>,
}

impl KeyValueStore {
    /// Store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            inner: Arc::new(Inner {
                entries: DashMap::new(),
                path: None,
                flush_lock: Mutex::new(()),
            }),
        }
    }

    /// Open (or create on first write) a file-backed store.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let entries: DashMap<String, String> = match std::fs::read_to_string(&path) {
            Ok(raw) if !raw.trim().is_empty() => {
                let map: BTreeMap<String, String> =
                    serde_json::from_str(&raw).map_err(|source| StorageError::Corrupt {
                        path: path.clone(),
                        source,
                    })?;
                map.into_iter().collect()
            }
            Ok(_) => DashMap::new(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => DashMap::new(),
            Err(source) => return Err(StorageError::Io { path, source }),
        };

        tracing::debug!(path = %path.display(), entries = entries.len(), "Opened session storage");

        Ok(Self {
            inner: Arc::new(Inner {
                entries,
                path: Some(path),
                flush_lock: Mutex::new(()),
            }),
        })
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.inner.entries.get(key).map(|v| v.value().clone())
    }

    pub fn set(&self, key: &str, value: impl Into<String>) -> Result<(), StorageError> {
        self.inner.entries.insert(key.to_string(), value.into());
        self.flush()
    }

    pub fn remove(&self, key: &str) -> Result<(), StorageError> {
        if self.inner.entries.remove(key).is_some() {
            self.flush()?;
        }
        Ok(())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.inner.entries.contains_key(key)
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.inner.path else {
            return Ok(());
        };

        // Serialize writers so a stale snapshot never renames over a newer one.
        let _guard = self
            .inner
            .flush_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let snapshot: BTreeMap<String, String> = self
            .inner
            .entries
            .iter()
            .map(|e| (e.key().clone(), e.value().clone()))
            .collect();
        let json = serde_json::to_string_pretty(&snapshot)?;

        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, json).map_err(|source| StorageError::Io {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })
    }

    /// Persist an authenticated user record under the session keys.
    pub fn save_user_record(&self, user: &UserRecord) -> Result<(), StorageError> {
        self.set(keys::USER_DATA, serde_json::to_string(user)?)?;
        self.set(keys::IS_LOGGED_IN, "true")?;
        match user.id {
            Some(id) => self.set(keys::USER_ID, id.to_string())?,
            None => self.remove(keys::USER_ID)?,
        }
        match &user.role {
            Some(role) => self.set(keys::USER_ROLE, role.as_str())?,
            None => self.remove(keys::USER_ROLE)?,
        }
        Ok(())
    }

    /// Load the persisted user record.
    ///
    /// `Ok(None)` when nothing is stored; `Err` when the blob is unreadable.
    pub fn load_user_record(&self) -> Result<Option<UserRecord>, serde_json::Error> {
        self.get(keys::USER_DATA)
            .map(|raw| serde_json::from_str(&raw))
            .transpose()
    }

    pub fn is_logged_in(&self) -> bool {
        self.get(keys::IS_LOGGED_IN).as_deref() == Some("true")
    }

    /// Remove every session key, including the test token.
    pub fn clear_user(&self) -> Result<(), StorageError> {
        for key in SESSION_KEYS {
            self.inner.entries.remove(*key);
        }
        self.flush()
    }
}
