//! Logging setup.

use tracing_subscriber::{EnvFilter, prelude::*};

/// Install a `tracing` subscriber writing to stderr, honoring `RUST_LOG`.
///
/// Safe to call more than once (`try_init` swallows the "already set" error),
/// which matters for tests that each bring up their own assembly service.
pub fn init() {
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
    .with(EnvFilter::try_new("info").unwrap_or_else(|_| EnvFilter::from_default_env()))
    .try_init()
    .ok();
}
