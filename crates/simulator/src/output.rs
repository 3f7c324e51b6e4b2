//! Recording DAC output.
//!
//! `SimDacOutput` stands in for the on-chip DAC: every write is captured
//! with its timestamp so a run can be inspected afterwards. Clones share
//! the same capture, so the caller keeps a probe while the device owns the
//! output.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use platform::{DacChannel, DacOutput, DacValue, OutputError};

/// Full-scale output voltage of the on-chip DAC, in millivolts.
pub const VREF_MV: u32 = 3_300;

/// One captured write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sample {
    /// Time of the write
    pub at: Instant,
    /// Output code
    pub value: u8,
}

#[derive(Debug, Default)]
struct Capture {
    enabled: bool,
    samples: Vec<Sample>,
}

/// Simulated single-channel DAC output.
#[derive(Debug, Clone, Default)]
pub struct SimDacOutput {
    capture: Arc<Mutex<Capture>>,
}

impl SimDacOutput {
    /// Create an output with an empty capture.
    pub fn new() -> Self {
        Self::default()
    }

    fn capture(&self) -> MutexGuard<'_, Capture> {
        self.capture.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Captured writes, oldest first.
    pub fn samples(&self) -> Vec<Sample> {
        self.capture().samples.clone()
    }

    /// Captured output codes, oldest first.
    pub fn values(&self) -> Vec<u8> {
        self.capture().samples.iter().map(|s| s.value).collect()
    }

    /// Number of captured writes.
    pub fn write_count(&self) -> usize {
        self.capture().samples.len()
    }

    /// Voltage currently on the pad, in millivolts.
    pub fn level_mv(&self) -> u32 {
        self.capture()
            .samples
            .last()
            .map_or(0, |s| code_to_mv(s.value))
    }
}

/// Convert an output code to millivolts.
pub fn code_to_mv(code: u8) -> u32 {
    u32::from(code).saturating_mul(VREF_MV) / 255
}

impl DacOutput for SimDacOutput {
    fn enable_channel(&mut self, channel: DacChannel) -> Result<(), OutputError> {
        self.capture().enabled = true;
        tracing::debug!(%channel, pin = %channel.pin(), "output stage enabled");
        Ok(())
    }

    fn write(&mut self, _channel: DacChannel, value: DacValue) -> Result<(), OutputError> {
        let mut capture = self.capture();
        if !capture.enabled {
            return Err(OutputError::NotEnabled);
        }
        capture.samples.push(Sample {
            at: Instant::now(),
            value: value.get(),
        });
        Ok(())
    }
}
