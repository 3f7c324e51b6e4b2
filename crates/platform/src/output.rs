//! DAC output abstraction

use crate::dac_types::{DacChannel, DacValue};

/// Physical DAC output.
///
/// Implementations drive the analog pad directly; there is no buffering at
/// this level. `write` is called from interrupt context on the streaming
/// path, so it must not block.
pub trait DacOutput {
    /// Power up the channel's output stage and route it to its pad.
    fn enable_channel(&mut self, channel: DacChannel) -> Result<(), OutputError>;

    /// Set the channel's output code.
    fn write(&mut self, channel: DacChannel, value: DacValue) -> Result<(), OutputError>;
}

/// DAC output errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum OutputError {
    /// The driver rejected the channel or value
    Parameter,
    /// Write attempted before `enable_channel`
    NotEnabled,
    /// Register access failed
    Bus,
}

#[cfg(feature = "std")]
impl std::error::Error for OutputError {}

impl core::fmt::Display for OutputError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Parameter => write!(f, "DAC parameter error"),
            Self::NotEnabled => write!(f, "DAC channel not enabled"),
            Self::Bus => write!(f, "DAC register access failed"),
        }
    }
}
