//! Logging setup for the residence-impute binary.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize tracing with a default filter.
///
/// `RUST_LOG` wins over `default_filter` when set. Logs go to stderr so the
/// JSON response on stdout stays machine-readable.
pub fn init_with_filter(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact().with_writer(std::io::stderr))
        .init();
}

/// Map a `--log-level` value to a filter directive.
///
/// Unknown levels fall back to `info`.
pub fn level_filter(level: &str) -> &'static str {
    match level.to_ascii_lowercase().as_str() {
        "trace" => "trace",
        "debug" => "debug",
        "warn" => "warn",
        "error" => "error",
        _ => "info",
    }
}
