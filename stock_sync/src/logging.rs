//! Log output for the `stock-sync` binary.
//!
//! Events are written to stderr without their targets. `--log-level` sets the
//! filter for a run; a valid `RUST_LOG` replaces it entirely, for example
//! `RUST_LOG=jquants_client=debug,stock_sync=info` to follow token refreshes
//! and chunk writes.

use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. Call once, before the first event.
pub fn init(log_level: &str) {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(filter(rust_log.as_deref(), log_level))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn filter(rust_log: Option<&str>, log_level: &str) -> EnvFilter {
    rust_log
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new(log_level))
}
