use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_FILE_PREFIX: &str = "wordbook-cli.log";

/// Holds the non-blocking file writer open. Dropping it flushes pending lines.
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// Directory for rolling log files, when `ENABLE_FILE_LOGS` is on.
pub fn file_log_dir() -> Option<PathBuf> {
    let enabled = std::env::var("ENABLE_FILE_LOGS")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);
    if !enabled {
        return None;
    }
    Some(PathBuf::from(
        std::env::var("LOG_DIR").unwrap_or_else(|_| "./logs".to_string()),
    ))
}

/// Installs the global subscriber: stderr always, plus a daily rolling file
/// when enabled. Calling it twice keeps the first subscriber.
pub fn init_tracing(log_level: &str) -> Option<FileLogGuard> {
    let env_filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let mut guard = None;
    let file_layer = file_log_dir().and_then(|dir| match std::fs::create_dir_all(&dir) {
        Ok(()) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, &dir, LOG_FILE_PREFIX);
            let (writer, worker) = tracing_appender::non_blocking(appender);
            guard = Some(FileLogGuard { _guard: worker });
            Some(fmt::layer().with_writer(writer).with_ansi(false).with_target(true))
        }
        Err(err) => {
            eprintln!("failed to create log directory {}: {err}", dir.display());
            None
        }
    });

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }

    guard
}
