//! Showing a container's terminal output on the host.
//!
//! Attaching runs `docker attach <id>` with stdin closed and its stdout sent
//! to our stderr, so the user can see what a container is busy with. The
//! process is killed on detach, or when the guard is dropped.

use std::ffi::OsString;
use std::io;
use std::process::{Child, Command, ExitStatus, Stdio};

use tracing::{debug, warn};

use crate::error::{HostError, Result};
use crate::ids::summarize_id;
use crate::shell::quote_command_line;

#[derive(Debug, Clone)]
pub struct RemoteTerminal {
    container_id: String,
    program: OsString,
    args: Vec<OsString>,
}

impl RemoteTerminal {
    pub fn new(container_id: impl Into<String>) -> Self {
        let container_id = container_id.into();
        Self {
            program: "docker".into(),
            args: vec!["attach".into(), container_id.clone().into()],
            container_id,
        }
    }

    /// Replace the `docker attach` invocation.
    pub fn with_command<I, S>(mut self, program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.program = program.into();
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Start the attach process.
    pub fn attach(&self) -> Result<AttachedTerminal> {
        debug!(container = summarize_id(&self.container_id), "Attaching to terminal of container");
        let child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::from(io::stderr()))
            .spawn()
            .map_err(|source| HostError::Spawn {
                command: self.command_line(),
                source,
            })?;
        Ok(AttachedTerminal {
            child: Some(child),
            container_id: self.container_id.clone(),
        })
    }

    fn command_line(&self) -> String {
        quote_command_line(
            std::iter::once(&self.program)
                .chain(&self.args)
                .map(|s| s.to_string_lossy().into_owned()),
        )
    }
}

/// A running attach process. Dropping it kills the process.
#[derive(Debug)]
pub struct AttachedTerminal {
    child: Option<Child>,
    container_id: String,
}

impl AttachedTerminal {
    pub fn is_running(&mut self) -> bool {
        match self.child.as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(None)),
            None => false,
        }
    }

    /// Kill the attach process (if it is still running) and reap it.
    pub fn detach(mut self) -> Result<ExitStatus> {
        match self.child.take() {
            Some(child) => stop(child, &self.container_id),
            None => Err(HostError::Spawn {
                command: format!("attach {}", self.container_id),
                source: io::Error::new(io::ErrorKind::Other, "terminal already detached"),
            }),
        }
    }
}

impl Drop for AttachedTerminal {
    fn drop(&mut self) {
        if let Some(child) = self.child.take() {
            if let Err(e) = stop(child, &self.container_id) {
                warn!("Failed to detach from container: {}", e);
            }
        }
    }
}

fn stop(mut child: Child, container_id: &str) -> Result<ExitStatus> {
    debug!(container = summarize_id(container_id), "Detaching from container");
    let pid = child.id();
    let context = |source| HostError::Spawn {
        command: format!("attach process {pid}"),
        source,
    };
    if child.try_wait().map_err(context)?.is_none() {
        // Fails only if it exited in between, which is what we want anyway.
        let _ = child.kill();
    }
    child.wait().map_err(context)
}
