//! Hosted DAC streaming target.
//!
//! Replaces the board's timer group and DAC with [`SimTimer`] (one OS
//! thread per armed timer) and [`SimDacOutput`] (captures every write), so
//! the `dac` driver runs unchanged on a desktop.
#![warn(missing_docs)]

pub mod logging;
pub mod output;
pub mod timer;
pub mod waveform;

pub use output::{SimDacOutput, Sample};
pub use timer::SimTimer;
pub use waveform::Waveform;

/// DAC registry wired to the simulated peripherals.
pub type SimRegistry = dac::DacRegistry<SimDacOutput, SimTimer, Vec<u8>>;

/// Build a registry with a fresh output per channel. Returns the registry
/// and a probe for each output, in channel order.
pub fn registry() -> (SimRegistry, [SimDacOutput; 2]) {
    let probes = [SimDacOutput::new(), SimDacOutput::new()];
    let [one, two] = probes.clone();
    let registry = SimRegistry::new(|channel| match channel {
        platform::DacChannel::One => one.clone(),
        platform::DacChannel::Two => two.clone(),
    });
    (registry, probes)
}
