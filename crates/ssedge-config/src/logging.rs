// ── File logging ──
//
// The client must not log to stdout/stderr; everything goes to the log
// file the backend reports, falling back to the configured one.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use ssedge_api::{BackendClient, Invoke};

use crate::{ConfigError, LoggingSettings};

const DEFAULT_LOG_FILENAME: &str = "ssedge.log";

/// `RUST_LOG` wins over the configured level.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
}

/// Where to write logs: the backend's log file when it can tell us,
/// else the configured file, else the platform data directory.
pub async fn resolve_log_file<I: Invoke>(
    client: &BackendClient<I>,
    settings: &LoggingSettings,
) -> PathBuf {
    match client.log_path().await {
        Ok(path) if !path.trim().is_empty() => PathBuf::from(path),
        Ok(_) => configured_log_file(settings),
        Err(e) => {
            warn!(error = %e, "backend did not report a log path");
            configured_log_file(settings)
        }
    }
}

fn configured_log_file(settings: &LoggingSettings) -> PathBuf {
    settings.file.clone().unwrap_or_else(|| {
        directories::ProjectDirs::from("com", "ssedge", "ssedge").map_or_else(
            || std::env::temp_dir().join(DEFAULT_LOG_FILENAME),
            |dirs| dirs.data_local_dir().join(DEFAULT_LOG_FILENAME),
        )
    })
}

/// Install a global subscriber writing to `path`.
///
/// The returned guard must be held for the lifetime of the application
/// so buffered lines are flushed.
pub fn init_file_tracing(path: &Path, level: &str) -> Result<WorkerGuard, ConfigError> {
    let log_dir = path.parent().unwrap_or(Path::new("."));
    let log_filename = path
        .file_name()
        .unwrap_or(OsStr::new(DEFAULT_LOG_FILENAME));
    std::fs::create_dir_all(log_dir)?;

    let file_appender = tracing_appender::rolling::never(log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(build_filter(level))
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true),
        )
        .try_init()
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    debug!(path = %path.display(), "file logging initialised");
    Ok(guard)
}
