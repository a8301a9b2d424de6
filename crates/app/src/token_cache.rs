//! Local key/value cache mirroring session presence.
//!
//! The session holder writes the signed-in uid under [`USER_TOKEN_KEY`] and
//! removes it on sign-out. Nothing reads it for authorization decisions; the
//! [`SessionHolder`](crate::session::SessionHolder) stays authoritative.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;

/// Key holding the signed-in user's uid.
pub const USER_TOKEN_KEY: &str = "userToken";

/// Errors from token cache backends.
#[derive(Debug, Error)]
pub enum TokenCacheError {
    /// Reading or writing the cache file failed.
    #[error("token cache I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The cache file is not a JSON object of strings.
    #[error("token cache is corrupt: {0}")]
    Format(#[from] serde_json::Error),
}

/// String key/value storage local to the device.
#[async_trait::async_trait]
pub trait TokenCache: Send + Sync {
    /// Read a value.
    async fn get(&self, key: &str) -> Result<Option<String>, TokenCacheError>;

    /// Store a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), TokenCacheError>;

    /// Remove a value. Removing a missing key succeeds.
    async fn remove(&self, key: &str) -> Result<(), TokenCacheError>;
}

/// Process-local [`TokenCache`].
#[derive(Debug, Clone, Default)]
pub struct MemoryTokenCache {
    entries: Arc<Mutex<HashMap<String, String>>>,
}

impl MemoryTokenCache {
    /// Create an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl TokenCache for MemoryTokenCache {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenCacheError> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenCacheError> {
        self.entries
            .lock()
            .await
            .insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), TokenCacheError> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// [`TokenCache`] persisted as a JSON object in a file.
///
/// The whole file is rewritten on every change; a missing file reads as empty.
#[derive(Debug, Clone)]
pub struct FileTokenCache {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process.
    lock: Arc<Mutex<()>>,
}

impl FileTokenCache {
    /// Create a cache stored at `path`. The file is created on first write.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::default(),
        }
    }

    /// Location of the cache file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<HashMap<String, String>, TokenCacheError> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) if content.trim().is_empty() => Ok(HashMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    async fn store(&self, entries: &HashMap<String, String>) -> Result<(), TokenCacheError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }
        let content = serde_json::to_string_pretty(entries)?;
        tokio::fs::write(&self.path, content).await?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl TokenCache for FileTokenCache {
    async fn get(&self, key: &str) -> Result<Option<String>, TokenCacheError> {
        let _guard = self.lock.lock().await;
        Ok(self.load().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), TokenCacheError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        entries.insert(key.to_owned(), value.to_owned());
        self.store(&entries).await
    }

    async fn remove(&self, key: &str) -> Result<(), TokenCacheError> {
        let _guard = self.lock.lock().await;
        let mut entries = self.load().await?;
        if entries.remove(key).is_some() {
            self.store(&entries).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_cache() {
        let cache = MemoryTokenCache::new();
        cache.set(USER_TOKEN_KEY, "u1").await.unwrap();
        assert_eq!(cache.get(USER_TOKEN_KEY).await.unwrap().as_deref(), Some("u1"));
        cache.remove(USER_TOKEN_KEY).await.unwrap();
        assert!(cache.get(USER_TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_cache_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        FileTokenCache::new(&path)
            .set(USER_TOKEN_KEY, "u42")
            .await
            .unwrap();

        let reopened = FileTokenCache::new(&path);
        assert_eq!(
            reopened.get(USER_TOKEN_KEY).await.unwrap().as_deref(),
            Some("u42")
        );

        reopened.remove(USER_TOKEN_KEY).await.unwrap();
        assert!(reopened.get(USER_TOKEN_KEY).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_cache_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileTokenCache::new(dir.path().join("absent.json"));
        assert!(cache.get(USER_TOKEN_KEY).await.unwrap().is_none());
        cache.remove(USER_TOKEN_KEY).await.unwrap();
    }

    #[tokio::test]
    async fn test_file_cache_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(matches!(
            FileTokenCache::new(&path).get(USER_TOKEN_KEY).await,
            Err(TokenCacheError::Format(_))
        ));
    }
}
