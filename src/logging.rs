//! Logging configuration for db-envelope.
//!
//! Logs always go to stderr so that stdout carries nothing but the JSON
//! envelope.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is not set.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "db_envelope=debug,info"
    } else {
        "info"
    }
}

/// Initializes logging to stderr.
///
/// `RUST_LOG` takes precedence over the `verbose` default.
pub fn init_stderr_logging(verbose: bool) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose))),
        )
        .with_writer(std::io::stderr)
        .init();
}
