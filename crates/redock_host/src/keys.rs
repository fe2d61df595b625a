//! SSH key pair used to reach containers from the host.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{HostError, Result};
use crate::shell::quote_command_line;

const SSH_KEYGEN: &str = "ssh-keygen";

/// What [`KeyProvisioner::ensure_key_pair`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPairStatus {
    Existing,
    Generated,
}

/// Makes sure an RSA key pair exists at two fixed paths, running
/// `ssh-keygen` when it does not.
#[derive(Debug, Clone)]
pub struct KeyProvisioner {
    private_key: PathBuf,
    public_key: PathBuf,
    program: OsString,
    leading_args: Vec<OsString>,
}

impl KeyProvisioner {
    pub fn new(private_key: impl Into<PathBuf>, public_key: impl Into<PathBuf>) -> Self {
        Self {
            private_key: private_key.into(),
            public_key: public_key.into(),
            program: SSH_KEYGEN.into(),
            leading_args: Vec::new(),
        }
    }

    /// Keys under the Redock configuration directory.
    pub fn from_config() -> Self {
        Self::new(
            redock_config::private_key_path(),
            redock_config::public_key_path(),
        )
    }

    /// Run `program leading_args.. <ssh-keygen args>` instead of `ssh-keygen`.
    pub fn with_keygen_command<I, S>(mut self, program: impl Into<OsString>, leading_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.program = program.into();
        self.leading_args = leading_args.into_iter().map(Into::into).collect();
        self
    }

    pub fn private_key(&self) -> &Path {
        &self.private_key
    }

    pub fn public_key_path(&self) -> &Path {
        &self.public_key
    }

    /// Generate the key pair unless the private key already exists.
    pub fn ensure_key_pair(&self) -> Result<KeyPairStatus> {
        debug!("Checking if we need to generate a new SSH key pair");
        if self.private_key.is_file() {
            debug!(path = %self.private_key.display(), "SSH key pair was previously generated");
            return Ok(KeyPairStatus::Existing);
        }

        if let Some(parent) = self.private_key.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| HostError::io("create directory", parent, e))?;
        }

        let program = which::which(&self.program).map_err(|source| HostError::ToolNotFound {
            program: self.program.to_string_lossy().into_owned(),
            source,
        })?;
        let args = self.keygen_args();
        let command_line = quote_command_line(
            std::iter::once(self.program.to_string_lossy().into_owned())
                .chain(self.leading_args.iter().map(|a| a.to_string_lossy().into_owned()))
                .chain(args.iter().cloned()),
        );

        info!(path = %self.private_key.display(), "No existing SSH key pair found, generating new key");
        let status = Command::new(&program)
            .args(&self.leading_args)
            .args(&args)
            .status()
            .map_err(|source| HostError::Spawn {
                command: command_line.clone(),
                source,
            })?;
        if !status.success() {
            return Err(HostError::KeyGenFailure {
                code: status.code(),
                command: command_line,
            });
        }
        Ok(KeyPairStatus::Generated)
    }

    /// Contents of the public key, generating the pair first if needed.
    pub fn public_key(&self) -> Result<String> {
        if !self.public_key.is_file() {
            self.ensure_key_pair()?;
        }
        let key = std::fs::read_to_string(&self.public_key)
            .map_err(|e| HostError::io("read", &self.public_key, e))?;
        Ok(key.trim().to_string())
    }

    fn keygen_args(&self) -> Vec<String> {
        vec![
            "-t".to_string(),
            "rsa".to_string(),
            "-f".to_string(),
            self.private_key.to_string_lossy().into_owned(),
            "-N".to_string(),
            String::new(),
            "-C".to_string(),
            format!("root@{}", local_hostname()),
        ]
    }
}

#[cfg(unix)]
fn local_hostname() -> String {
    nix::unistd::gethostname()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(not(unix))]
fn local_hostname() -> String {
    std::env::var("COMPUTERNAME").unwrap_or_else(|_| "localhost".to_string())
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    // Stands in for ssh-keygen: $4 is the -f argument, $8 the comment.
    const FAKE_KEYGEN: &str = r#"
        echo run >> "$(dirname "$4")/runs"
        echo "PRIVATE KEY" > "$4"
        echo "ssh-rsa AAAAB3Nza $8" > "$4.pub"
    "#;

    fn provisioner(temp_dir: &TempDir, script: &str) -> KeyProvisioner {
        let dir = temp_dir.path().join("keys");
        KeyProvisioner::new(dir.join("id_rsa"), dir.join("id_rsa.pub"))
            .with_keygen_command("sh", ["-c", script, "ssh-keygen"])
    }

    #[test]
    fn test_generates_once() {
        let temp_dir = TempDir::new().unwrap();
        let keys = provisioner(&temp_dir, FAKE_KEYGEN);

        assert_eq!(keys.ensure_key_pair().unwrap(), KeyPairStatus::Generated);
        assert!(keys.private_key().is_file());
        assert_eq!(keys.ensure_key_pair().unwrap(), KeyPairStatus::Existing);

        let runs = fs::read_to_string(temp_dir.path().join("keys").join("runs")).unwrap();
        assert_eq!(runs.lines().count(), 1);
    }

    #[test]
    fn test_public_key_generates_on_demand() {
        let temp_dir = TempDir::new().unwrap();
        let keys = provisioner(&temp_dir, FAKE_KEYGEN);

        let key = keys.public_key().unwrap();
        assert!(key.starts_with("ssh-rsa AAAAB3Nza root@"), "{key}");
        assert!(!key.ends_with('\n'));
    }

    #[test]
    fn test_failing_keygen() {
        let temp_dir = TempDir::new().unwrap();
        let keys = provisioner(&temp_dir, "exit 3");

        match keys.ensure_key_pair() {
            Err(HostError::KeyGenFailure { code, command }) => {
                assert_eq!(code, Some(3));
                assert!(command.contains("-t rsa -f"), "{command}");
                assert!(command.contains("-N ''"), "{command}");
            }
            other => panic!("expected KeyGenFailure, got {other:?}"),
        }
        assert!(!keys.private_key().exists());
    }

    #[test]
    fn test_missing_program() {
        let temp_dir = TempDir::new().unwrap();
        let keys = KeyProvisioner::new(
            temp_dir.path().join("id_rsa"),
            temp_dir.path().join("id_rsa.pub"),
        )
        .with_keygen_command("redock-no-such-keygen", Vec::<String>::new());

        assert!(matches!(
            keys.ensure_key_pair(),
            Err(HostError::ToolNotFound { .. })
        ));
    }
}
