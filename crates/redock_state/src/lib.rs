//! Redock runtime state store.
//!
//! Redock shares a small amount of runtime state (the containers it manages
//! and whatever else callers hang off the record) between independent
//! invocations. All access goes through [`StateStore::with_transaction`],
//! which holds an exclusive advisory lock (on `state.json.lock`) for the
//! whole load, migrate, mutate and save cycle. Saves go through a temporary
//! file renamed over `state.json`, so readers only ever see a complete
//! record.
//!
//! # Usage
//!
//! ```rust,no_run
//! use redock_state::{StateStore, TransactionError};
//!
//! let store = StateStore::open_default()?;
//! store.with_transaction(|record| {
//!     record.containers.insert("4e3f0c7f2d1a".into(), serde_json::json!({"image": "web:latest"}));
//!     Ok::<_, std::convert::Infallible>(())
//! })?;
//! # Ok::<(), TransactionError<std::convert::Infallible>>(())
//! ```

mod error;
mod lock;
pub mod migrate;
mod record;
mod store;

pub use error::{Result, StoreError, TransactionError};
pub use lock::{lock_path_for, StateLock};
pub use migrate::CURRENT_SCHEMA_VERSION;
pub use record::{decode, encode, PersistedRecord, RESERVED_FIELDS};
pub use store::StateStore;
