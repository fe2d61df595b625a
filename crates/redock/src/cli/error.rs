//! Helpful error types for CLI commands
//!
//! Every error says what went wrong and, for state failures, that the
//! state file was left as it was.

use std::fmt;
use std::path::Path;

use redock_state::{StoreError, TransactionError};

/// An error with helpful context and suggestions
#[derive(Debug)]
pub struct HelpfulError {
    pub message: String,
    pub context: Option<String>,
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Describe a failed state transaction. The previous record survives
    /// either way: saves replace the file by rename or not at all.
    pub fn transaction_failed(err: TransactionError<anyhow::Error>) -> Self {
        match err {
            TransactionError::Aborted(cause) => Self::new(format!("{:#}", cause))
                .with_context("The command was aborted; the state file was not modified"),
            TransactionError::Store(store) => Self::store_failed(&store),
        }
    }

    /// Describe a failure of the store itself.
    pub fn store_failed(err: &StoreError) -> Self {
        let base = Self::new(err.to_string()).with_context(format!(
            "State store failure ({}); the state file was not modified",
            err.kind()
        ));
        match err {
            StoreError::CorruptState { path, .. } => base
                .with_suggestion(format!("TRY: Inspect the file: cat {}", path.display()))
                .with_suggestion(format!(
                    "TRY: Move it aside to start from scratch: mv {0} {0}.broken",
                    path.display()
                )),
            StoreError::IoFailure { path, .. } => {
                let dir = path.parent().unwrap_or(Path::new("."));
                base.with_suggestion(format!(
                    "TRY: Check permissions of the directory: ls -la {}",
                    dir.display()
                ))
                .with_suggestion(format!("TRY: Check free disk space: df -h {}", dir.display()))
            }
            StoreError::LockTimeout { .. } => {
                base.with_suggestion("TRY: Wait for other redock commands to finish")
            }
        }
    }

    /// A JSON argument could not be parsed
    pub fn invalid_json(arg: &str, details: &str) -> Self {
        Self::new(format!("Invalid JSON value: {}", details))
            .with_context(format!("Could not parse argument: {}", arg))
            .with_suggestion("TRY: Quote strings inside the JSON: '\"web:latest\"'")
            .with_suggestion("TRY: Pass objects in single quotes: '{\"image\": \"web\"}'")
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_helpful_error_display() {
        let err = HelpfulError::new("Something went wrong")
            .with_context("While saving state")
            .with_suggestion("Try again");

        let display = format!("{}", err);
        assert!(display.contains("ERROR: Something went wrong"));
        assert!(display.contains("CONTEXT: While saving state"));
        assert!(display.contains("Try again"));
    }

    #[test]
    fn test_aborted_transaction() {
        let err = HelpfulError::transaction_failed(TransactionError::Aborted(anyhow::anyhow!(
            "No such container: abc"
        )));
        let display = err.to_string();
        assert!(display.contains("No such container: abc"));
        assert!(display.contains("not modified"));
    }

    #[test]
    fn test_corrupt_state_suggestions() {
        let store = StoreError::CorruptState {
            path: PathBuf::from("/home/u/.redock/state.json"),
            reason: "expected value at line 1 column 1".to_string(),
        };
        let display = HelpfulError::transaction_failed(store.into()).to_string();
        assert!(display.contains("corrupt state"));
        assert!(display.contains("mv /home/u/.redock/state.json"));
    }

    #[test]
    fn test_failed_save_suggestions() {
        let err = StoreError::IoFailure {
            op: "write",
            path: PathBuf::from("/home/dev/.redock/state.json"),
            source: std::io::Error::new(std::io::ErrorKind::Other, "File too large"),
        };
        let display = HelpfulError::store_failed(&err).to_string();
        assert!(display.contains("Failed to write state file"), "{display}");
        assert!(display.contains("(I/O failure); the state file was not modified"), "{display}");
        assert!(display.contains("df -h /home/dev/.redock"), "{display}");
    }
}
