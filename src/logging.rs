//! Logging initialization for gator.
//!
//! Diagnostics always go to stderr so that command output on stdout stays
//! clean for the operator.

use tracing::Level;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::WARN,
    }
}

/// Build the log filter.
///
/// A non-empty, valid `RUST_LOG` replaces the configured level entirely.
fn build_filter(level: &str, rust_log: Option<&str>) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::default().add_directive(parse_level(level).into()))
}

/// Initialize the logging system.
///
/// Uses the configured level unless `RUST_LOG` is set, in which case its
/// directives win.
pub fn init(level: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = build_filter(level, rust_log.as_deref());

    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        )
        .with(filter)
        .try_init();
}
