//! File logging. The terminal belongs to the UI, so tracing output goes to a
//! log file through a non-blocking writer.

use std::path::{Path, PathBuf};

use directories::BaseDirs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use crate::config::CONFIG_DIR;
use crate::error::{ForkfulError, Result};

const LOG_FILE: &str = "forkful.log";

/// Split the configured log path into (directory, file name), defaulting to
/// `<data dir>/forkful/forkful.log`.
pub fn log_target(log_file: Option<&Path>) -> Result<(PathBuf, String)> {
    if let Some(path) = log_file {
        let file_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| ForkfulError::Config(format!("Invalid log file path: {}", path.display())))?;
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        return Ok((dir, file_name.to_string()));
    }

    BaseDirs::new()
        .map(|dirs| (dirs.data_local_dir().join(CONFIG_DIR), LOG_FILE.to_string()))
        .ok_or_else(|| ForkfulError::Config("Could not determine data directory".to_string()))
}

/// `RUST_LOG` wins; otherwise `level` (falling back to `info` if unparsable).
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Install the global subscriber. Keep the returned guard alive for the
/// whole run or buffered lines are lost.
pub fn init(level: &str, log_file: Option<&Path>) -> Result<WorkerGuard> {
    let (dir, file_name) = log_target(log_file)?;
    std::fs::create_dir_all(&dir)
        .map_err(|e| ForkfulError::Config(format!("Failed to create log dir: {}", e)))?;

    let appender = tracing_appender::rolling::never(&dir, &file_name);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(writer)
        .with_ansi(false)
        .try_init()
        .map_err(|e| ForkfulError::Config(format!("Failed to initialize logging: {}", e)))?;

    tracing::info!("Logging to {}", dir.join(&file_name).display());
    Ok(guard)
}
