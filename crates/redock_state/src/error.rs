//! Error types for the state store.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// State store result type.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Failures raised by the store itself.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The state file exists but does not hold a valid record.
    #[error("State file {} is corrupt: {reason}", .path.display())]
    CorruptState { path: PathBuf, reason: String },

    /// Opening, reading, writing or locking the state file failed.
    #[error("Failed to {op} state file {}: {source}", .path.display())]
    IoFailure {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The bounded wait in `with_transaction_timeout` expired.
    #[error("Timed out after {waited:?} waiting for the lock on {}", .path.display())]
    LockTimeout { path: PathBuf, waited: Duration },
}

impl StoreError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoFailure {
            op,
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, reason: impl fmt::Display) -> Self {
        Self::CorruptState {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    /// Short label for the failure kind, for user-facing reports.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::CorruptState { .. } => "corrupt state",
            Self::IoFailure { .. } => "I/O failure",
            Self::LockTimeout { .. } => "lock timeout",
        }
    }
}

/// Outcome of a failed transaction.
///
/// In both cases the state file keeps its previous content. A save that
/// fails partway only ever touches a temporary file, never the record.
#[derive(Error, Debug)]
pub enum TransactionError<E> {
    /// The store failed before or after the caller's closure ran.
    #[error("{0} (state left unchanged)")]
    Store(#[from] StoreError),

    /// The caller's closure returned an error, passed through verbatim.
    #[error("Transaction aborted, state left unchanged: {0}")]
    Aborted(E),
}

impl<E> TransactionError<E> {
    /// The store error, if this was not a caller failure.
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            Self::Store(err) => Some(err),
            Self::Aborted(_) => None,
        }
    }

    /// Unwrap the caller's own error, if that is what aborted the transaction.
    pub fn into_aborted(self) -> Option<E> {
        match self {
            Self::Store(_) => None,
            Self::Aborted(err) => Some(err),
        }
    }
}
