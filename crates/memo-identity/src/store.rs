use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use memo_config::{StorageBackend, StorageConfig};
use tempfile::NamedTempFile;

use crate::error::StoreError;
use crate::write_lock;

/// Key-value store scoped to one device or profile.
///
/// Writes are last-writer-wins per key; no multi-key transaction is offered
/// or needed because every mapping is stored under its own key.
pub trait KeyValueStore: Send + Sync {
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Removing a missing key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be written.
    fn remove(&self, key: &str) -> Result<(), StoreError>;

    /// All keys starting with `prefix`, in ascending order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backing storage cannot be read.
    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

impl<T: KeyValueStore + ?Sized> KeyValueStore for Arc<T> {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        (**self).get(key)
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        (**self).set(key, value)
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        (**self).remove(key)
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        (**self).keys(prefix)
    }
}

/// Open the store selected by configuration.
///
/// # Errors
///
/// Returns `StoreError` if the file store's path cannot be determined or its
/// existing contents cannot be read.
pub fn open_store(config: &StorageConfig) -> Result<Arc<dyn KeyValueStore>, StoreError> {
    match config.backend {
        StorageBackend::Memory => Ok(Arc::new(MemoryStore::new())),
        StorageBackend::File => {
            let path = config
                .resolved_path()
                .map_err(|e| StoreError::Unavailable(e.to_string()))?;
            Ok(Arc::new(FileStore::open(path)?))
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ---------------------------------------------------------------------------
// MemoryStore
// ---------------------------------------------------------------------------

/// Process-local store. Contents are lost when the value is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(lock(&self.entries).get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        lock(&self.entries).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        lock(&self.entries).remove(key);
        Ok(())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        Ok(lock(&self.entries)
            .keys()
            .filter(|key| key.starts_with(prefix))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// FileStore
// ---------------------------------------------------------------------------

/// JSON object on disk, one entry per key.
///
/// Every write rewrites the file through a uniquely named sibling temp file
/// and a rename, so a reader never sees a half-written object. Writers take
/// a `<file>.lock` lock file first, which serializes them across handles and
/// processes. The directory is created `0700` and the file `0600` on Unix.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    guard: Mutex<()>,
}

impl FileStore {
    /// Open (or prepare to create) the store at `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the parent directory cannot be created or an
    /// existing file is not a JSON object of strings.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self {
            path: path.into(),
            guard: Mutex::new(()),
        };
        if let Some(parent) = store.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::io(parent, e))?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Err(error) = fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                {
                    tracing::warn!(%error, dir = %parent.display(), "failed to chmod 0700");
                }
            }
        }
        store.read_all()?;
        Ok(store)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>, StoreError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let content = serde_json::to_string_pretty(entries)?;

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(content.as_bytes())
            .map_err(|e| StoreError::io(tmp.path(), e))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(tmp.path(), fs::Permissions::from_mode(0o600))
                .map_err(|e| StoreError::io(tmp.path(), e))?;
        }

        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;
        Ok(())
    }

    /// Read-modify-write under both the in-process guard and the
    /// cross-process lock file, so concurrent writers never drop each
    /// other's keys.
    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> Result<(), StoreError> {
        let _guard = lock(&self.guard);
        let _write_lock = write_lock::acquire(&self.path)?;
        let mut entries = self.read_all()?;
        if apply(&mut entries) {
            self.write_all(&entries)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = lock(&self.guard);
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
    }

    fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.update(|entries| entries.remove(key).is_some())
    }

    fn keys(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let _guard = lock(&self.guard);
        Ok(self
            .read_all()?
            .into_keys()
            .filter(|key| key.starts_with(prefix))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn exercise(store: &dyn KeyValueStore) {
        assert_eq!(store.get("a:1").unwrap(), None);
        store.set("a:1", "one").unwrap();
        store.set("a:2", "two").unwrap();
        store.set("b:1", "other").unwrap();
        assert_eq!(store.get("a:1").unwrap().as_deref(), Some("one"));

        store.set("a:1", "uno").unwrap();
        assert_eq!(store.get("a:1").unwrap().as_deref(), Some("uno"));
        assert_eq!(store.keys("a:").unwrap(), vec!["a:1", "a:2"]);

        store.remove("a:1").unwrap();
        store.remove("missing").unwrap();
        assert_eq!(store.get("a:1").unwrap(), None);
        assert_eq!(store.keys("").unwrap(), vec!["a:2", "b:1"]);
    }

    #[test]
    fn memory_store_contract() {
        exercise(&MemoryStore::new());
    }

    #[test]
    fn file_store_contract() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let store = FileStore::open(tmp.path().join("ids.json")).expect("open");
        exercise(&store);
    }

    #[test]
    fn file_store_survives_reopen() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("nested").join("ids.json");

        FileStore::open(&path).unwrap().set("k", "v").unwrap();
        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn concurrent_handles_keep_every_key() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("ids.json");

        let writers: Vec<_> = ["a", "b"]
            .into_iter()
            .map(|writer| {
                let store = FileStore::open(&path).expect("open");
                std::thread::spawn(move || {
                    for i in 0..100 {
                        store.set(&format!("{writer}:{i}"), "v").expect("set");
                    }
                })
            })
            .collect();
        for writer in writers {
            writer.join().expect("writer thread");
        }

        let reopened = FileStore::open(&path).unwrap();
        assert_eq!(reopened.keys("a:").unwrap().len(), 100);
        assert_eq!(reopened.keys("b:").unwrap().len(), 100);
        assert!(!write_lock::lock_path(&path).exists());
    }

    #[cfg(unix)]
    #[test]
    fn file_store_is_private() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("ids.json");
        FileStore::open(&path).unwrap().set("k", "v").unwrap();

        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o600, "store file should be 0600");
    }

    #[test]
    fn corrupt_file_is_rejected_on_open() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("ids.json");
        fs::write(&path, "not json").unwrap();

        let error = FileStore::open(&path).unwrap_err();
        assert!(matches!(error, StoreError::Corrupt(_)), "{error}");
    }

    #[test]
    fn whitespace_file_reads_as_empty() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let path = tmp.path().join("ids.json");
        fs::write(&path, "  \n").unwrap();

        let store = FileStore::open(&path).unwrap();
        assert!(store.keys("").unwrap().is_empty());
    }

    #[test]
    fn open_store_honours_backend() {
        let tmp = tempfile::TempDir::new().expect("tmp dir");
        let config = StorageConfig {
            backend: StorageBackend::File,
            path: tmp.path().join("ids.json").display().to_string(),
        };
        open_store(&config).unwrap().set("k", "v").unwrap();
        assert!(tmp.path().join("ids.json").exists());

        let memory = open_store(&StorageConfig {
            backend: StorageBackend::Memory,
            ..Default::default()
        })
        .unwrap();
        assert_eq!(memory.get("k").unwrap(), None);
    }
}
