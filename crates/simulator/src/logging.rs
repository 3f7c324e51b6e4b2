//! tracing-subscriber setup for hosted runs.
//!
//! Filtering is runtime-only: `RUST_LOG` if set, otherwise `info` for
//! everything and `debug` for the DAC driver.

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,dac=debug,simulator=debug";

/// Install the global subscriber.
///
/// # Errors
///
/// Fails if a global subscriber is already installed.
pub fn try_init() -> Result<(), TryInitError> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER)))
        .with(tracing_subscriber::fmt::layer().with_thread_names(true))
        .try_init()
}
