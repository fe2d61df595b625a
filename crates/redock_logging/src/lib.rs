//! Shared logging setup for the Redock binary.

use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_LOG_FILTER: &str = "redock=info,redock_state=info,redock_host=info,redock_config=info";
const VERBOSE_LOG_FILTER: &str = "redock=debug,redock_state=debug,redock_host=debug,redock_config=debug";
const TRACE_LOG_FILTER: &str = "redock=trace,redock_state=trace,redock_host=trace,redock_config=trace";

/// Forces debug output, like `-v`.
pub const DEBUG_ENV: &str = "REDOCK_DEBUG";

/// Logging configuration for the Redock binary.
pub struct LogConfig<'a> {
    pub app_name: &'a str,
    /// Number of `-v` flags given on the command line.
    pub verbosity: u8,
    /// Also write a daily rolling log file under ~/.redock/logs.
    pub log_to_file: bool,
}

/// Keeps the background file writer alive. Drop it last in `main`.
pub struct LoggingGuard {
    _file_guard: Option<WorkerGuard>,
}

/// Initialize tracing with stderr output and, if possible, a rolling file.
///
/// `RUST_LOG` takes precedence over everything else.
pub fn init_logging(config: LogConfig<'_>) -> Result<LoggingGuard> {
    let debug_forced = std::env::var_os(DEBUG_ENV).is_some();
    let directives = default_directives(config.verbosity, debug_forced);
    let make_filter =
        || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives));

    let mut file_guard = None;
    let file_layer = if config.log_to_file {
        match ensure_logs_dir() {
            Ok(dir) => {
                let appender =
                    tracing_appender::rolling::daily(dir, format!("{}.log", config.app_name));
                let (writer, guard) = tracing_appender::non_blocking(appender);
                file_guard = Some(guard);
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_filter(make_filter()),
                )
            }
            Err(err) => {
                eprintln!("Warning: failed to create logs directory: {:#}", err);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(file_layer)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(make_filter()),
        )
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(LoggingGuard {
        _file_guard: file_guard,
    })
}

fn default_directives(verbosity: u8, debug_forced: bool) -> &'static str {
    match (verbosity, debug_forced) {
        (0, false) => DEFAULT_LOG_FILTER,
        (0, true) | (1, _) => VERBOSE_LOG_FILTER,
        _ => TRACE_LOG_FILTER,
    }
}

/// Ensure the logs directory exists.
pub fn ensure_logs_dir() -> Result<PathBuf> {
    let logs = redock_config::logs_dir();
    std::fs::create_dir_all(&logs)
        .with_context(|| format!("Failed to create logs directory: {}", logs.display()))?;
    Ok(logs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives() {
        assert_eq!(default_directives(0, false), DEFAULT_LOG_FILTER);
        assert_eq!(default_directives(0, true), VERBOSE_LOG_FILTER);
        assert_eq!(default_directives(1, false), VERBOSE_LOG_FILTER);
        assert_eq!(default_directives(2, false), TRACE_LOG_FILTER);
        assert_eq!(default_directives(5, true), TRACE_LOG_FILTER);
    }

    #[test]
    fn test_directives_parse() {
        for directives in [DEFAULT_LOG_FILTER, VERBOSE_LOG_FILTER, TRACE_LOG_FILTER] {
            assert!(EnvFilter::try_new(directives).is_ok(), "{directives}");
            for krate in ["redock", "redock_state", "redock_host", "redock_config"] {
                assert!(
                    directives.split(',').any(|d| d.split('=').next() == Some(krate)),
                    "{krate} missing from {directives}"
                );
            }
        }
    }
}
