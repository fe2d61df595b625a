//! Transactions over the runtime state file.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{Result, StoreError, TransactionError};
use crate::lock::StateLock;
use crate::migrate::{self, CURRENT_SCHEMA_VERSION};
use crate::record::{encode, PersistedRecord};

/// Serialized, cross-process safe access to the runtime state file.
///
/// The store itself holds no state beyond the path; every call opens and
/// locks `<path>.lock` afresh, so separate `StateStore` values (in this
/// process or any other) exclude each other.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// A store backed by `path`. Nothing is touched until the first
    /// transaction; missing parent directories are created then.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store at the well-known location, `~/.redock/state.json`.
    pub fn open_default() -> Result<Self> {
        let home = redock_config::ensure_redock_home()
            .map_err(|e| StoreError::io("create directory for", redock_config::state_file_path(), e))?;
        Ok(Self::new(home.join("state.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Run `f` against the current record under the exclusive lock.
    ///
    /// The record is written back only if `f` returns `Ok`. Blocks for as
    /// long as another process holds the lock.
    pub fn with_transaction<T, E, F>(&self, f: F) -> std::result::Result<T, TransactionError<E>>
    where
        F: FnOnce(&mut PersistedRecord) -> std::result::Result<T, E>,
    {
        let lock = StateLock::acquire(&self.path)?;
        run_transaction(lock, f)
    }

    /// Same as [`with_transaction`](Self::with_transaction), but fails with
    /// [`StoreError::LockTimeout`] if the lock is not free within `wait`.
    pub fn with_transaction_timeout<T, E, F>(
        &self,
        wait: Duration,
        f: F,
    ) -> std::result::Result<T, TransactionError<E>>
    where
        F: FnOnce(&mut PersistedRecord) -> std::result::Result<T, E>,
    {
        let lock = StateLock::acquire_timeout(&self.path, wait)?;
        run_transaction(lock, f)
    }

    /// Load (and migrate, in memory only) the current record without
    /// writing anything back.
    pub fn snapshot(&self) -> Result<PersistedRecord> {
        let lock = StateLock::acquire(&self.path)?;
        load(lock.path())
    }
}

fn run_transaction<T, E, F>(lock: StateLock, f: F) -> std::result::Result<T, TransactionError<E>>
where
    F: FnOnce(&mut PersistedRecord) -> std::result::Result<T, E>,
{
    let mut record = load(lock.path())?;
    match f(&mut record) {
        Ok(value) => {
            save(lock.path(), &record)?;
            Ok(value)
        }
        Err(err) => {
            warn!(path = %lock.path().display(), "Not saving state, the transaction was aborted");
            Err(TransactionError::Aborted(err))
        }
    }
}

fn load(path: &Path) -> Result<PersistedRecord> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => Vec::new(),
        Err(e) => return Err(StoreError::io("read", path, e)),
    };
    if bytes.is_empty() {
        debug!(path = %path.display(), "No existing state, starting from defaults");
        return Ok(PersistedRecord::default());
    }

    debug!(path = %path.display(), bytes = bytes.len(), "Loading state");
    let value: Value = serde_json::from_slice(&bytes).map_err(|e| StoreError::corrupt(path, e))?;
    let Value::Object(mut doc) = value else {
        return Err(StoreError::corrupt(path, "top-level value is not an object"));
    };
    let stored_version = migrate::upgrade(&mut doc).map_err(|r| StoreError::corrupt(path, r))?;
    if stored_version > CURRENT_SCHEMA_VERSION {
        debug!(
            stored_version,
            current = CURRENT_SCHEMA_VERSION,
            "State was written by a newer version, keeping it as is"
        );
    }

    serde_json::from_value(Value::Object(doc)).map_err(|e| StoreError::corrupt(path, e))
}

fn save(path: &Path, record: &PersistedRecord) -> Result<()> {
    replace_file(path, &encode(record))?;
    debug!(
        path = %path.display(),
        containers = record.containers.len(),
        "Saved state"
    );
    Ok(())
}

/// Write `bytes` to a temporary sibling of `path`, flush it to disk and
/// rename it into place. On any error `path` is untouched and the temporary
/// file is removed.
fn replace_file(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut prefix = std::ffi::OsString::from(".");
    if let Some(name) = path.file_name() {
        prefix.push(name);
    }

    let mut temp = tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(".tmp")
        .tempfile_in(dir)
        .map_err(|e| StoreError::io("create a temporary file for", path, e))?;
    temp.write_all(bytes)
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| StoreError::io("write", path, e))?;
    temp.persist(path)
        .map_err(|e| StoreError::io("replace", path, e.error))?;

    // The new content is already in place; a failed directory sync only
    // weakens durability across a power loss.
    if let Err(e) = sync_dir(dir) {
        warn!(dir = %dir.display(), "Failed to sync state directory: {}", e);
    }
    Ok(())
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> io::Result<()> {
    fs::File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    fn store_in(temp_dir: &TempDir) -> StateStore {
        StateStore::new(temp_dir.path().join("state.json"))
    }

    #[test]
    fn test_missing_parent_directory_is_created() {
        let temp_dir = TempDir::new().unwrap();
        let store = StateStore::new(temp_dir.path().join("deep").join("er").join("state.json"));

        store
            .with_transaction(|_| Ok::<_, String>(()))
            .unwrap();
        assert!(store.path().is_file());
    }

    #[test]
    fn test_returns_closure_value() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        let count = store
            .with_transaction(|record| {
                record.containers.insert("abc".into(), json!(1));
                Ok::<_, String>(record.containers.len())
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_non_object_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), b"[1, 2, 3]").unwrap();

        let err = store.snapshot().unwrap_err();
        assert!(matches!(err, StoreError::CorruptState { .. }), "{err}");
    }

    #[test]
    fn test_bad_containers_shape_is_corrupt() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        fs::write(store.path(), br#"{"schema_version": 1, "containers": [1]}"#).unwrap();

        let err = store.snapshot().unwrap_err();
        assert_eq!(err.kind(), "corrupt state");
    }

    #[test]
    fn test_snapshot_never_writes() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);
        let legacy = br#"{"containers": {"abc": "x"}}"#;
        fs::write(store.path(), legacy).unwrap();

        let record = store.snapshot().unwrap();
        assert_eq!(record.schema_version(), CURRENT_SCHEMA_VERSION);
        assert_eq!(record.containers["abc"], json!("x"));
        assert_eq!(fs::read(store.path()).unwrap(), legacy);
    }

    #[test]
    fn test_shorter_rewrite_truncates() {
        let temp_dir = TempDir::new().unwrap();
        let store = store_in(&temp_dir);

        store
            .with_transaction(|record| {
                for i in 0..20 {
                    record.containers.insert(format!("container-{i}"), json!({"n": i}));
                }
                Ok::<_, String>(())
            })
            .unwrap();
        store
            .with_transaction(|record| {
                record.containers.clear();
                Ok::<_, String>(())
            })
            .unwrap();

        let bytes = fs::read(store.path()).unwrap();
        assert_eq!(bytes, encode(&PersistedRecord::default()));
    }

    #[test]
    fn test_failed_replace_keeps_target_and_cleans_up() {
        let temp_dir = TempDir::new().unwrap();
        // A non-empty directory cannot be renamed over
        let target = temp_dir.path().join("state.json");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        let err = replace_file(&target, b"{}\n").unwrap_err();
        assert_eq!(err.kind(), "I/O failure");
        assert_eq!(fs::read(target.join("keep")).unwrap(), b"x");

        let leftovers: Vec<_> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("state.json")]);
    }

    #[test]
    fn test_replace_creates_and_overwrites() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("state.json");

        replace_file(&target, b"first").unwrap();
        replace_file(&target, b"2").unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"2");
        assert_eq!(fs::read_dir(temp_dir.path()).unwrap().count(), 1);
    }
}
