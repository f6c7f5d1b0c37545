//! Tracing subscriber setup for the command line tool

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

/// Log file name inside the log directory, rotated daily
pub const LOG_FILE_NAME: &str = "restore-engine.log";

/// Build the filter from `RUST_LOG`, falling back to the verbosity flag
pub fn env_filter(verbose: u8) -> EnvFilter {
    let default = match verbose {
        0 => "restore_engine=info",
        1 => "restore_engine=debug",
        _ => "restore_engine=trace",
    };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber
///
/// Logs go to stderr. With `log_dir`, they are also written to a daily rotated
/// JSON file; the returned guard must be held until exit to flush it.
pub fn init(verbose: u8, log_dir: Option<&Path>) -> Option<WorkerGuard> {
    let filter = env_filter(verbose);

    let Some(log_dir) = log_dir else {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(false)
            .without_time()
            .try_init();
        return None;
    };

    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "Failed to create log directory {}: {}; logging to stderr only",
            log_dir.display(),
            e
        );
        return init(verbose, None);
    }

    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_NAME);
    let (file_writer, guard) = tracing_appender::non_blocking(file_appender);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .with(fmt::layer().json().with_writer(file_writer))
        .try_init();

    Some(guard)
}
