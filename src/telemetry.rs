//! Tracing setup for binaries and examples embedding the crate.
//!
//! Libraries only emit spans and events; installing a subscriber is the
//! embedder's call. `RUST_LOG` overrides the default filter.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "error,lingograph=info";

/// Install the global subscriber: env-filtered, compact, span close events.
///
/// Errors if a subscriber is already installed, which lets tests call this
/// repeatedly and ignore the result.
pub fn try_init() -> Result<(), TryInitError> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .compact()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
}

/// Like [`try_init`], but quietly keeps an already installed subscriber.
pub fn init() {
    let _ = try_init();
}
