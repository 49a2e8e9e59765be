//! Log subscriber setup for the binary.

use tracing_subscriber::{fmt, EnvFilter};

const DEFAULT_FILTER: &str = "rock_trivia=info,tower_http=info";

/// Installs the global `fmt` subscriber, filtered by `RUST_LOG` when set.
/// Safe to call more than once; later calls are ignored.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let _ = fmt().with_env_filter(filter).with_target(true).try_init();
}
