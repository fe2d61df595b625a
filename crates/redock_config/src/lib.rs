//! Configuration paths for Redock.
//!
//! Everything Redock persists on the host lives in one directory,
//! `~/.redock` by default. There is no config file; the only knobs are
//! environment variables.

pub mod paths;

pub use paths::{
    ensure_redock_home, logs_dir, mirror_file_path, private_key_path, public_key_path,
    redock_home, state_file_path, HOME_ENV, STATE_FILE_ENV,
};
