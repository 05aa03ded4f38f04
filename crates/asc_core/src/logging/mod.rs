//! Logging setup.
//!
//! The engine logs through `tracing` macros only; binaries call
//! [`init_tracing`] once at startup to decide where the events go.
//!
//! # Example
//!
//! ```no_run
//! use asc_core::logging::{init_tracing, LogLevel};
//!
//! // Keep the guard alive so the log file is flushed on exit
//! let _guard = init_tracing(LogLevel::Info, Some(std::path::Path::new(".logs")));
//! tracing::info!("ready");
//! ```

mod types;

pub use types::LogLevel;

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Name of the log file written inside the log folder.
pub const LOG_FILE_NAME: &str = "asc.log";

/// Initialize the global tracing subscriber.
///
/// This sets up a subscriber that:
/// - Respects RUST_LOG environment variable
/// - Falls back to the provided default level
/// - Outputs to stderr
/// - Also writes to `<log_dir>/asc.log` when a folder is given
///
/// Returns the file writer's guard; dropping it flushes pending lines.
/// Calling this more than once leaves the first subscriber in place.
pub fn init_tracing(default_level: LogLevel, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_level.as_filter_str()));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);

    let (file_layer, guard) = match log_dir.map(file_writer) {
        Some(Ok((writer, guard))) => (
            Some(fmt::layer().with_writer(writer).with_ansi(false)),
            Some(guard),
        ),
        Some(Err(e)) => {
            eprintln!("File logging disabled: {}", e);
            (None, None)
        }
        None => (None, None),
    };

    let result = tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init();

    if result.is_err() {
        tracing::debug!("Tracing subscriber already installed");
    }

    guard
}

fn file_writer(
    dir: &Path,
) -> std::io::Result<(tracing_appender::non_blocking::NonBlocking, WorkerGuard)> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::never(dir, LOG_FILE_NAME);
    Ok(tracing_appender::non_blocking(appender))
}

/// Initialize tracing for tests (only logs warnings and above).
#[cfg(test)]
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_test_writer()
        .try_init();
}
