//! Tracing setup for taskloom binaries and examples (feature `tracing-init`).
//!
//! - **RUST_LOG**: level filter, e.g. `info`, `taskloom=debug`. Default: `info`.
//! - **LOG_FILE**: when set, logs are appended to that file without ANSI colors
//!   through a non-blocking writer; otherwise they go to stderr so stdout keeps
//!   only task output.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Default filter when `RUST_LOG` is unset; keeps HTTP internals quiet.
pub const DEFAULT_FILTER: &str = "info,hyper_util=off,reqwest=warn";

/// Installs the global subscriber.
///
/// Returns the file writer's guard when `LOG_FILE` is set; keep it alive until
/// exit or buffered lines are lost. Fails if a subscriber is already installed
/// or the log file cannot be opened.
pub fn init() -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    match std::env::var("LOG_FILE") {
        Ok(path) => {
            let guard = init_file(Path::new(&path), filter)?;
            tracing::info!(path = %path, "taskloom logging to file");
            Ok(Some(guard))
        }
        Err(_) => {
            let stderr_layer = tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_filter(filter);
            tracing_subscriber::registry().with(stderr_layer).try_init()?;
            Ok(None)
        }
    }
}

fn init_file(
    path: &Path,
    filter: EnvFilter,
) -> Result<WorkerGuard, Box<dyn std::error::Error + Send + Sync>> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_filter(filter);
    tracing_subscriber::registry().with(file_layer).try_init()?;
    Ok(guard)
}
