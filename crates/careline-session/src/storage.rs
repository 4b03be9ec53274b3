use async_trait::async_trait;
use careline_core::{CarelineError, CarelineResult};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::PathBuf;

/// Durable key-value capability backing the chat snapshot.
#[async_trait]
pub trait SnapshotStorage: Send + Sync {
    /// Returns the stored value, or `None` when the key is absent.
    async fn read(&self, key: &str) -> CarelineResult<Option<String>>;
    /// Stores `value` under `key`, replacing any previous value.
    async fn write(&self, key: &str, value: &str) -> CarelineResult<()>;
    /// Deletes `key`. Removing an absent key is not an error.
    async fn remove(&self, key: &str) -> CarelineResult<()>;
}

/// File-based storage: one `<key>.json` file per key.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    /// Open (and create if needed) a storage directory.
    pub async fn new(dir: PathBuf) -> CarelineResult<Self> {
        tokio::fs::create_dir_all(&dir).await?;
        Ok(Self { dir })
    }

    fn key_path(&self, key: &str) -> CarelineResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(CarelineError::Storage(format!("Invalid storage key '{key}'")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

#[async_trait]
impl SnapshotStorage for FileStorage {
    async fn read(&self, key: &str) -> CarelineResult<Option<String>> {
        let path = self.key_path(key)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(data) => Ok(Some(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, key: &str, value: &str) -> CarelineResult<()> {
        let path = self.key_path(key)?;
        // Readers never observe a half-written snapshot.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> CarelineResult<()> {
        let path = self.key_path(key)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Process-local storage, for tests and ephemeral chats.
#[derive(Default)]
pub struct MemoryStorage {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

#[async_trait]
impl SnapshotStorage for MemoryStorage {
    async fn read(&self, key: &str) -> CarelineResult<Option<String>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    async fn write(&self, key: &str, value: &str) -> CarelineResult<()> {
        self.entries.lock().insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> CarelineResult<()> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
