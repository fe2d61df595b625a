//! Helpers for running the `redock` binary against a throwaway home.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Output, Stdio};

use serde::de::DeserializeOwned;
use tempfile::TempDir;

pub struct TestHome {
    dir: TempDir,
}

impl TestHome {
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("create temp home"),
        }
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn state_file(&self) -> PathBuf {
        self.path().join("state.json")
    }

    pub fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_redock"));
        cmd.args(args)
            .env("REDOCK_HOME", self.path())
            .env("RUST_LOG", "error")
            .env_remove("REDOCK_STATE_FILE")
            .env_remove("REDOCK_DEBUG");
        cmd
    }

    /// Run with the file-size limit (`ulimit -f`, in shell blocks) lowered
    /// and SIGXFSZ ignored, so oversized writes fail with EFBIG.
    #[cfg(unix)]
    pub fn run_with_file_size_limit(&self, blocks: u32, args: &[&str]) -> Output {
        let redock = self.command(args);
        let mut cmd = Command::new("sh");
        cmd.arg("-c")
            .arg(format!("trap '' XFSZ; ulimit -f {blocks}; exec \"$0\" \"$@\""))
            .arg(redock.get_program())
            .args(redock.get_args());
        for (key, value) in redock.get_envs() {
            match value {
                Some(value) => cmd.env(key, value),
                None => cmd.env_remove(key),
            };
        }
        cmd.output().expect("run redock under sh")
    }

    pub fn run(&self, args: &[&str]) -> Output {
        self.command(args).output().expect("run redock")
    }

    pub fn spawn(&self, args: &[&str]) -> Child {
        self.command(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .expect("spawn redock")
    }

    pub fn run_ok(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert_cli_success(&output, args);
        String::from_utf8(output.stdout).expect("utf-8 stdout")
    }

    pub fn run_json<T: DeserializeOwned>(&self, args: &[&str]) -> T {
        let stdout = self.run_ok(args);
        serde_json::from_str(&stdout)
            .unwrap_or_else(|e| panic!("invalid JSON from {:?}: {}\n{}", args, e, stdout))
    }
}

pub fn assert_cli_success(output: &Output, args: &[&str]) {
    assert!(
        output.status.success(),
        "redock {:?} failed ({:?})\nstdout:\n{}\nstderr:\n{}",
        args,
        output.status.code(),
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
}
