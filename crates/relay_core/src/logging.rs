use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, filter::LevelFilter, fmt, prelude::*};

use crate::config::RelayConfig;

const DEFAULT_FILTER: &str = "info,relay_app=debug,relay_core=debug,relay_ai=debug";
const LOG_FILE_PREFIX: &str = "relay";

/// Logs to a daily file under `~/.claude/vertex-provider/logs` and echoes
/// warnings to stderr. Stdout is never written to.
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_logging() -> Result<WorkerGuard> {
    install(&RelayConfig::logs_dir()?, DEFAULT_FILTER, true)
}

/// File-only logging into `logs_dir`. `RUST_LOG` overrides `filter`.
pub fn init_logging_to_dir(logs_dir: &Path, filter: &str) -> Result<WorkerGuard> {
    install(logs_dir, filter, false)
}

fn install(logs_dir: &Path, filter: &str, stderr_warnings: bool) -> Result<WorkerGuard> {
    std::fs::create_dir_all(logs_dir)
        .with_context(|| format!("Failed to create log directory: {}", logs_dir.display()))?;

    let appender = tracing_appender::rolling::daily(logs_dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    let file_layer = fmt::layer().with_ansi(false).with_writer(writer);
    let stderr_layer = stderr_warnings.then(|| {
        fmt::layer()
            .without_time()
            .with_target(false)
            .with_writer(std::io::stderr)
            .compact()
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_dir_is_created_even_when_subscriber_exists() {
        let tmp = tempfile::tempdir().unwrap();
        let logs_dir = tmp.path().join("vertex-provider").join("logs");

        // Another test may have installed the global subscriber first.
        let _guard = init_logging_to_dir(&logs_dir, "warn");
        assert!(logs_dir.is_dir());
    }

    #[test]
    fn second_install_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let first = init_logging_to_dir(&tmp.path().join("one"), "debug");
        let second = init_logging_to_dir(&tmp.path().join("two"), "debug");

        assert!(first.is_err() || second.is_err());
        if let Err(e) = second {
            assert!(e.to_string().contains("initialize logging"), "{e}");
        }
    }

    #[test]
    fn default_filter_is_valid() {
        assert!(EnvFilter::try_new(DEFAULT_FILTER).is_ok());
    }
}
