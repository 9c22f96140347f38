//! Console subscriber setup
//!
//! Installs a `tracing` subscriber that writes to stderr, so messages mirrored
//! by a [`TracingSink`](super::TracingSink) and the crate's own diagnostics
//! become visible.

use anyhow::{Context, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset
pub const DEFAULT_DIRECTIVE: &str = "layerlog=info";

/// Build the filter from `RUST_LOG`, falling back to `default_directive`
pub fn env_filter(default_directive: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive))
}

/// Initialize console logging
///
/// Fails if a global subscriber is already installed.
pub fn init_console_logging(default_directive: &str) -> Result<()> {
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true);

    tracing_subscriber::registry()
        .with(env_filter(default_directive))
        .with(console_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}
