//! tracing subscriber setup.
//!
//! Command mode writes to stderr so stdout stays clean for JSON output.
//! The TUI owns the terminal, so it logs to a daily-rolling file under the
//! data directory instead.

use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// File name prefix for TUI log files (`brief.log.YYYY-MM-DD`).
pub const LOG_FILE_PREFIX: &str = "brief.log";

/// Build the filter: `RUST_LOG` wins, then `-v`, then the configured level.
pub fn build_filter(configured: &str, verbose: bool) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let directive = if verbose { "debug" } else { configured };
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new(crate::config::DEFAULT_LOG_LEVEL))
}

/// Log to stderr. Safe to call more than once; later calls are no-ops.
pub fn init_stderr(configured: &str, verbose: bool) {
    let _ = tracing_subscriber::registry()
        .with(build_filter(configured, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .try_init();
}

/// Log to a daily-rolling file in `dir`.
///
/// The returned guard flushes buffered lines when dropped; keep it alive for
/// the lifetime of the TUI.
pub fn init_file(dir: &Path, configured: &str, verbose: bool) -> crate::Result<WorkerGuard> {
    std::fs::create_dir_all(dir)?;
    let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let _ = tracing_subscriber::registry()
        .with(build_filter(configured, verbose))
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(writer),
        )
        .try_init();

    Ok(guard)
}
