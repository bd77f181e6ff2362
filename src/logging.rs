//! Logging setup for tools that embed the decoders.
//!
//! The decoders emit `tracing` events under the `hemmer_provider_config`
//! target: a `debug` summary per decoded block and `trace` events per entry
//! or rejected name. Problems in the configuration itself are never logged;
//! they are returned as diagnostics.
//!
//! Logs are written to **stderr** so they never mix with a tool's regular
//! output.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Controls log levels (e.g., `info`, `hemmer_provider_config=trace`)
//!
//! # Example
//!
//! ```ignore
//! use hemmer_provider_config::init_logging_with_default;
//!
//! fn main() {
//!     init_logging_with_default("hemmer_provider_config=debug");
//!     // decode configuration...
//! }
//! ```

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

const DEFAULT_LEVEL: &str = "info";

fn filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn try_init_with(default_level: &str) -> bool {
    tracing_subscriber::registry()
        .with(filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
        .is_ok()
}

/// Initialize the default logging subscriber.
///
/// Respects `RUST_LOG` and falls back to the `info` level.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LEVEL);
}

/// Initialize logging with a custom default filter, used when `RUST_LOG` is
/// not set.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    assert!(
        try_init_with(default_level),
        "a global tracing subscriber has already been set"
    );
}

/// Try to initialize logging, returning false if already initialized.
///
/// Unlike [`init_logging`], this never panics, which makes it suitable for
/// tests and for libraries that may be initialized more than once.
pub fn try_init_logging() -> bool {
    try_init_with(DEFAULT_LEVEL)
}

#[cfg(test)]
mod tests {
    // The global subscriber can be set once per process, so only the filter
    // parsing and the idempotent entry point are exercised here.

    use super::*;

    #[test]
    fn test_env_filter_parsing() {
        assert!(EnvFilter::try_new("info").is_ok());
        assert!(EnvFilter::try_new("hemmer_provider_config=trace").is_ok());
        assert!(EnvFilter::try_new("warn,hemmer_provider_config=debug").is_ok());
    }

    #[test]
    fn test_try_init_logging_is_repeatable() {
        let _ = try_init_logging();
        assert!(!try_init_logging());
    }
}
