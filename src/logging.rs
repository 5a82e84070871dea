//! Logging configuration for the explorer.
//!
//! Logs always go to stderr: stdout carries protocol messages when the stdio
//! transport is active.

use tracing_subscriber::EnvFilter;

/// Initializes logging to stderr.
///
/// `RUST_LOG` wins when set; otherwise `level` is used as the filter.
pub fn init_stderr_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(build_filter(level))
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Builds the log filter, falling back to `info` for an unparseable level.
pub fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}
