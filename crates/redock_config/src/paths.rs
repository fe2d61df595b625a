use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

/// Overrides the configuration directory.
pub const HOME_ENV: &str = "REDOCK_HOME";

/// Overrides the state file location (read by the CLI).
pub const STATE_FILE_ENV: &str = "REDOCK_STATE_FILE";

const HOME_DIR_NAME: &str = ".redock";

/// Resolve the Redock configuration directory.
///
/// Priority:
/// 1) REDOCK_HOME
/// 2) ~/.redock
/// 3) ./.redock
pub fn redock_home() -> PathBuf {
    resolve_home(std::env::var_os(HOME_ENV).map(PathBuf::from), dirs::home_dir())
}

fn resolve_home(override_path: Option<PathBuf>, user_home: Option<PathBuf>) -> PathBuf {
    if let Some(path) = override_path.filter(|p| !p.as_os_str().is_empty()) {
        return path;
    }
    match user_home {
        Some(home) => home.join(HOME_DIR_NAME),
        None => PathBuf::from(".").join(HOME_DIR_NAME),
    }
}

/// Create the configuration directory (recursively) if it is missing.
pub fn ensure_redock_home() -> io::Result<PathBuf> {
    let home = redock_home();
    ensure_dir(&home)?;
    Ok(home)
}

pub(crate) fn ensure_dir(dir: &Path) -> io::Result<()> {
    if !dir.is_dir() {
        info!(path = %dir.display(), "Creating directory");
        std::fs::create_dir_all(dir)?;
    }
    Ok(())
}

/// Serialized runtime state: ~/.redock/state.json
pub fn state_file_path() -> PathBuf {
    redock_home().join("state.json")
}

/// Cached package mirror: ~/.redock/ubuntu-mirror.txt
pub fn mirror_file_path() -> PathBuf {
    redock_home().join("ubuntu-mirror.txt")
}

/// Generated private key: ~/.redock/id_rsa
pub fn private_key_path() -> PathBuf {
    redock_home().join("id_rsa")
}

/// Generated public key: ~/.redock/id_rsa.pub
pub fn public_key_path() -> PathBuf {
    redock_home().join("id_rsa.pub")
}

/// Log directory: ~/.redock/logs
pub fn logs_dir() -> PathBuf {
    redock_home().join("logs")
}
