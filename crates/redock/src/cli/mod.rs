//! CLI module for Redock
//!
//! Commands that read or change the shared runtime state go through
//! [`redock_state::StateStore`]; the host commands wrap the helpers in
//! `redock_host`.

pub mod container;
pub mod error;
pub mod host;
pub mod output;
pub mod state;

use std::path::PathBuf;

use anyhow::Result;
use redock_state::StateStore;

use error::HelpfulError;

/// Resolve the state store from `--state-file` / `REDOCK_STATE_FILE`, or
/// fall back to `~/.redock/state.json`.
pub fn open_store(state_file: Option<PathBuf>) -> Result<StateStore> {
    match state_file {
        Some(path) => Ok(StateStore::new(path)),
        None => StateStore::open_default().map_err(|e| HelpfulError::store_failed(&e).into()),
    }
}
