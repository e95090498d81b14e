//! Cross-process write lock for the file store.
//!
//! The lock is a sibling `<store>.lock` file created with `create_new`, so at
//! most one writer (in any process) holds it. A lock file older than
//! [`STALE_AFTER`] is assumed to belong to a crashed writer and is removed.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant, SystemTime};

use crate::error::StoreError;

const LOCK_WAIT_TIMEOUT: Duration = Duration::from_secs(10);
const LOCK_RETRY_DELAY: Duration = Duration::from_millis(5);
const STALE_AFTER: Duration = Duration::from_secs(30);

/// Removes the lock file on drop.
#[derive(Debug)]
pub struct WriteLockGuard {
    path: PathBuf,
}

impl Drop for WriteLockGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

/// Lock file path for the store at `store_path`.
#[must_use]
pub fn lock_path(store_path: &Path) -> PathBuf {
    let mut name = store_path.as_os_str().to_owned();
    name.push(".lock");
    PathBuf::from(name)
}

/// Block until the write lock for `store_path` is held.
///
/// # Errors
///
/// Returns `StoreError::Locked` if another writer holds the lock for longer
/// than the wait timeout, or `StoreError::Io` if the lock file cannot be
/// created for any other reason.
pub fn acquire(store_path: &Path) -> Result<WriteLockGuard, StoreError> {
    let path = lock_path(store_path);
    let started = Instant::now();

    loop {
        match try_acquire(&path) {
            Ok(guard) => return Ok(guard),
            Err(LockState::Held) => {
                if is_stale(&path) {
                    tracing::warn!(lock = %path.display(), "removing stale store lock");
                    let _ = std::fs::remove_file(&path);
                    continue;
                }
                if started.elapsed() >= LOCK_WAIT_TIMEOUT {
                    return Err(StoreError::Locked { path });
                }
                std::thread::sleep(LOCK_RETRY_DELAY);
            }
            Err(LockState::Failed(source)) => return Err(StoreError::io(&path, source)),
        }
    }
}

#[derive(Debug)]
enum LockState {
    Held,
    Failed(std::io::Error),
}

fn try_acquire(path: &Path) -> Result<WriteLockGuard, LockState> {
    match OpenOptions::new().create_new(true).write(true).open(path) {
        Ok(mut file) => {
            let _ = writeln!(file, "{}", std::process::id());
            Ok(WriteLockGuard {
                path: path.to_path_buf(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Err(LockState::Held),
        Err(e) => Err(LockState::Failed(e)),
    }
}

fn is_stale(path: &Path) -> bool {
    std::fs::metadata(path)
        .and_then(|meta| meta.modified())
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age >= STALE_AFTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn acquires_and_releases_lock_file() {
        let temp = tempfile::tempdir().expect("tempdir should create");
        let store = temp.path().join("ids.json");

        let guard = acquire(&store).expect("lock should acquire");
        assert!(lock_path(&store).is_file());
        assert!(matches!(try_acquire(&lock_path(&store)), Err(LockState::Held)));
        drop(guard);
        assert!(!lock_path(&store).exists());
    }

    #[test]
    fn lock_sits_next_to_store() {
        assert_eq!(
            lock_path(Path::new("/data/memoreee/identity.json")),
            PathBuf::from("/data/memoreee/identity.json.lock")
        );
    }
}
