//! Error type shared by the host helpers.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, HostError>;

#[derive(Error, Debug)]
pub enum HostError {
    #[error("Required program `{program}` was not found: {source}")]
    ToolNotFound {
        program: String,
        #[source]
        source: which::Error,
    },

    #[error("Failed to generate SSH key pair! (command exited with {}: {command})", exit_code_label(.code))]
    KeyGenFailure { code: Option<i32>, command: String },

    #[error("Failed to start `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("Failed to {op} {}: {source}", .path.display())]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to download mirror list from {url}: {source}")]
    MirrorFetch {
        url: String,
        #[source]
        source: Box<ureq::Error>,
    },

    #[error("Failed to read mirror list from {url}: {source}")]
    MirrorRead {
        url: String,
        #[source]
        source: io::Error,
    },

    #[error("Mirror list at {url} was empty")]
    EmptyMirrorList { url: String },

    #[error("Failed to enumerate network interfaces: {0}")]
    Interfaces(#[source] io::Error),
}

impl HostError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            op,
            path: path.into(),
            source,
        }
    }
}

fn exit_code_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("code {code}"),
        None => "a signal".to_string(),
    }
}
