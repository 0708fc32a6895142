//! Tracing setup for binaries and tests that embed ripple.
//!
//! The library itself only emits `tracing` events; nothing is printed unless a subscriber is
//! installed. [`install_tracing`] installs a formatted stderr subscriber filtered by `RUST_LOG`.

use std::sync::Once;

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const DEFAULT_FILTER: &str = "info";

static TRACING_INSTALLED: Once = Once::new();

// ============================================================================
// Installation
// ============================================================================

/// Install the global tracing subscriber (idempotent).
///
/// Reads the filter from `RUST_LOG`, falling back to `info`. If another subscriber is already
/// installed the call leaves it in place.
pub fn install_tracing() {
    TRACING_INSTALLED.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

        let result = tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init();

        if let Err(error) = result {
            eprintln!("[ripple] tracing subscriber not installed: {error}");
        }
    });
}
