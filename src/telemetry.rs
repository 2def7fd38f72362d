//! Tracing bootstrap for binaries and tests embedding the engine.
//!
//! The library itself only emits through `tracing`; installing a subscriber
//! is the embedder's call. This helper wires the conventional stack: an
//! env-filtered fmt layer plus span-trace capture for error reports.

use tracing_error::ErrorLayer;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the default subscriber. Safe to call more than once; later calls
/// are no-ops when a global subscriber is already set.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer())
        .with(ErrorLayer::default())
        .try_init();
}
