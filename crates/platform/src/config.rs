//! Driver configuration and constants
//!
//! Central place for the values every layer agrees on: timer clock scaling,
//! queue capacity, and the default streaming rate. Reference these constants
//! rather than hardcoding values.

/// Driver name used in log banners.
pub const DRIVER_NAME: &str = "dac-stream";

/// Driver version (synchronized with Cargo.toml)
pub const DRIVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Timer group base clock in Hz (APB clock feeding the timer groups).
pub const TIMER_BASE_CLK_HZ: u64 = 80_000_000;

/// Prescaler applied to [`TIMER_BASE_CLK_HZ`].
///
/// Must divide the base clock exactly.
pub const TIMER_DIVIDER: u64 = 8;

/// Timer counter rate after prescaling: 10 MHz, i.e. one count per 100 ns.
#[allow(clippy::arithmetic_side_effects)] // Safety: const division by a non-zero literal
pub const TIMER_SCALE_HZ: u64 = TIMER_BASE_CLK_HZ / TIMER_DIVIDER;

/// Default `tick_hz` used when a period is given in ticks rather than as a
/// frequency (period 1 at 1000 ticks/s = 1 ms).
pub const DEFAULT_TICK_HZ: u32 = 1_000;

/// Maximum number of buffers a single channel may hold at once.
///
/// Enqueue beyond this depth fails with a queue-full error instead of
/// allocating.
pub const QUEUE_DEPTH: usize = 32;

/// Rate used by hosted tools when none is given on the command line.
pub const DEFAULT_RATE_HZ: f32 = 8_000.0;

/// Highest update rate accepted for a channel.
///
/// Each update is a single 8-bit register write; beyond this the tick
/// handler cannot keep up with the interrupt rate.
pub const MAX_RATE_HZ: f32 = 1_000_000.0;

/// Development mode banner
pub const fn dev_banner() -> &'static str {
    "dac-stream - hosted simulation"
}
