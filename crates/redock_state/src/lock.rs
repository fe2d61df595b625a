//! Process-level locking of the state file.
//!
//! The lock is taken with `fs2` (flock on unix, LockFileEx on windows) on a
//! sidecar `<state file>.lock` that is never replaced, so the state file
//! itself can be swapped in by rename. It is advisory: only processes going
//! through this module are kept out.
//!
//! Note: std::fs::File::lock() requires Rust 1.89+, so fs2 methods are
//! called with fully qualified syntax throughout.

use fs2::FileExt;
use std::ffi::OsString;
use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Result, StoreError};

const MAX_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// The lock file guarding `state_path`: the same name with `.lock` appended.
pub fn lock_path_for(state_path: &Path) -> PathBuf {
    let mut name = state_path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_else(|| OsString::from("state"));
    name.push(".lock");
    state_path.with_file_name(name)
}

/// Exclusive lock over one state file, held on its sidecar lock file.
///
/// The lock is released and the handle closed when the guard is dropped.
pub struct StateLock {
    file: File,
    path: PathBuf,
    lock_path: PathBuf,
}

impl StateLock {
    /// Open (creating if needed) the lock file for `path` and block until
    /// the exclusive lock is ours.
    pub fn acquire(path: &Path) -> Result<Self> {
        let lock_path = lock_path_for(path);
        let file = open_lock_file(path, &lock_path)?;

        debug!(lock = %lock_path.display(), "Waiting for state lock");
        FileExt::lock_exclusive(&file).map_err(|e| StoreError::io("lock", &lock_path, e))?;
        debug!(lock = %lock_path.display(), "Acquired state lock");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            lock_path,
        })
    }

    /// Like [`acquire`](Self::acquire), but give up after `wait`.
    pub fn acquire_timeout(path: &Path, wait: Duration) -> Result<Self> {
        let lock_path = lock_path_for(path);
        let file = open_lock_file(path, &lock_path)?;
        let started = Instant::now();
        let mut interval = Duration::from_millis(1);

        debug!(lock = %lock_path.display(), ?wait, "Polling for state lock");
        loop {
            match FileExt::try_lock_exclusive(&file) {
                Ok(()) => break,
                Err(e) if is_contended(&e) => {
                    let waited = started.elapsed();
                    if waited >= wait {
                        return Err(StoreError::LockTimeout {
                            path: path.to_path_buf(),
                            waited,
                        });
                    }
                    thread::sleep(interval.min(wait - waited));
                    interval = (interval * 2).min(MAX_POLL_INTERVAL);
                }
                Err(e) => return Err(StoreError::io("lock", &lock_path, e)),
            }
        }
        debug!(lock = %lock_path.display(), waited = ?started.elapsed(), "Acquired state lock");

        Ok(Self {
            file,
            path: path.to_path_buf(),
            lock_path,
        })
    }

    /// The state file this lock guards.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }
}

impl Drop for StateLock {
    fn drop(&mut self) {
        if let Err(e) = FileExt::unlock(&self.file) {
            // Closing the handle below releases it anyway.
            warn!(lock = %self.lock_path.display(), "Failed to unlock state file: {}", e);
        }
        debug!(lock = %self.lock_path.display(), "Released state lock");
    }
}

impl std::fmt::Debug for StateLock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateLock")
            .field("path", &self.path)
            .field("lock_path", &self.lock_path)
            .finish()
    }
}

fn open_lock_file(state_path: &Path, lock_path: &Path) -> Result<File> {
    if let Some(parent) = state_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .map_err(|e| StoreError::io("create directory for", state_path, e))?;
    }
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(lock_path)
        .map_err(|e| StoreError::io("open", lock_path, e))
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}
