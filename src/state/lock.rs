//! Advisory file locking for configuration files
//!
//! Readers take a shared lock and writers an exclusive one on a sibling
//! `.lock` file, so a save never interleaves with a concurrent load.

use fd_lock::RwLock;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use super::StateError;

/// Lock mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers
    Shared,
    /// One writer
    Exclusive,
}

/// Path of the lock file guarding `path`
pub fn lock_path(path: &Path) -> PathBuf {
    path.with_extension("lock")
}

fn open_lock_file(path: &Path) -> Result<File, StateError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| StateError::IoError(e.to_string()))?;
    }

    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path(path))
        .map_err(|e| StateError::LockError(format!("Failed to open lock file: {e}")))
}

/// Run `f` while holding a lock on `path`
///
/// Blocks until the lock is available; it is released when `f` returns.
pub fn with_lock<T, F>(path: &Path, mode: LockMode, f: F) -> Result<T, StateError>
where
    F: FnOnce() -> Result<T, StateError>,
{
    let mut lock = RwLock::new(open_lock_file(path)?);

    match mode {
        LockMode::Shared => {
            let _guard = lock
                .read()
                .map_err(|e| StateError::LockError(format!("Failed to acquire read lock: {e}")))?;
            f()
        }
        LockMode::Exclusive => {
            let _guard = lock
                .write()
                .map_err(|e| StateError::LockError(format!("Failed to acquire write lock: {e}")))?;
            f()
        }
    }
}
