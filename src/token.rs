//! Token persistence boundary
//!
//! The session token lives behind a small async key-value trait so the
//! client core never knows where credentials are stored. Failures stay
//! inside the store: callers get `None` or a no-op, never an error.

use async_trait::async_trait;
use dashmap::DashMap;
use std::path::PathBuf;
use tracing::warn;

/// Storage key for the session token
pub const TOKEN_KEY: &str = "token";

/// Async key-value store for the session token
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Read a value, `None` when absent or unreadable
    async fn get(&self, key: &str) -> Option<String>;

    /// Write a value, overwriting any previous one
    async fn set(&self, key: &str, value: &str);

    /// Delete a value if present
    async fn remove(&self, key: &str);
}

/// In-memory token store, used in tests and short-lived processes
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: DashMap<String, String>,
}

impl MemoryTokenStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).map(|v| v.value().clone())
    }

    async fn set(&self, key: &str, value: &str) {
        self.values.insert(key.to_string(), value.to_string());
    }

    async fn remove(&self, key: &str) {
        self.values.remove(key);
    }
}

/// File-backed token store: one file per key under a data directory
#[derive(Debug)]
pub struct FileTokenStore {
    dir: PathBuf,
}

impl FileTokenStore {
    /// Create a store rooted at `dir`; the directory is created on first write
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn get(&self, key: &str) -> Option<String> {
        let path = self.key_path(key);
        match std::fs::read_to_string(&path) {
            Ok(value) => {
                let value = value.trim().to_string();
                if value.is_empty() {
                    None
                } else {
                    Some(value)
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
            Err(e) => {
                warn!(key = key, error = %e, "Failed to read token file");
                None
            }
        }
    }

    async fn set(&self, key: &str, value: &str) {
        if let Err(e) = std::fs::create_dir_all(&self.dir) {
            warn!(error = %e, "Failed to create token directory");
            return;
        }
        if let Err(e) = std::fs::write(self.key_path(key), value) {
            warn!(key = key, error = %e, "Failed to write token file");
        }
    }

    async fn remove(&self, key: &str) {
        match std::fs::remove_file(self.key_path(key)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => {
                warn!(key = key, error = %e, "Failed to remove token file");
            }
        }
    }
}
