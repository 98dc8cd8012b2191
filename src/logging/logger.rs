// file: src/logging/logger.rs
// version: 1.0.0
// guid: 3481f930-520e-4b40-aa8d-15b38caefc17

//! Logger initialization and configuration

use crate::error::DeployError;
use crate::Result;
use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;
use tracing::Instrument;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Level directive for the console and file layers
fn level_for(verbose: bool, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "info"
    }
}

/// Initialize the logging system
///
/// Console output goes to stderr so that operator status lines on stdout stay
/// readable. When `log_file` is given every event is also appended there
/// without ANSI colors.
pub fn init_logger(verbose: bool, quiet: bool, log_file: Option<&Path>) -> Result<()> {
    let level = level_for(verbose, quiet);

    let console_layer = fmt::layer()
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .with_writer(io::stderr)
        .compact()
        .with_filter(EnvFilter::new(level));

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent() {
                if !parent.as_os_str().is_empty() && !parent.exists() {
                    fs::create_dir_all(parent)?;
                }
            }
            let file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| {
                    DeployError::ConfigError(format!(
                        "Failed to open log file {}: {}",
                        path.display(),
                        e
                    ))
                })?;

            // The file keeps debug detail unless the operator asked for quiet
            let file_level = if quiet { "error" } else { "debug" };
            Some(
                fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new(file_level)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| DeployError::ConfigError(format!("Failed to initialize logger: {}", e)))?;

    if let Some(path) = log_file {
        tracing::debug!("Logging initialized - writing to stderr and {}", path.display());
    }

    Ok(())
}

/// Create an async scoped logger for a recipe run, tagged with a run id
pub async fn with_async_operation_span<F, Fut, R>(operation: &str, run_id: &str, f: F) -> R
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future<Output = R>,
{
    let span = tracing::info_span!("operation", name = operation, run = run_id);
    async move { f().await }.instrument(span).await
}

// Re-export tracing macros for convenience
pub use tracing::{debug, error, info, trace, warn};
