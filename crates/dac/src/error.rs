//! Errors returned by the DAC control surface.

use platform::{OutputError, TimerError};

/// Why an argument was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reason {
    /// Output value outside `0..=255`
    ValueOutOfRange,
    /// Zero-length buffer passed to `enqueue`
    EmptyBuffer,
    /// Mode code or name not recognised
    UnknownMode,
    /// Pin is not routed to a DAC channel
    UnknownPin,
    /// Update rate not positive, not finite, or above the timer's limit
    InvalidRate,
}

impl core::fmt::Display for Reason {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::ValueOutOfRange => write!(f, "value out of range"),
            Self::EmptyBuffer => write!(f, "buffer is empty"),
            Self::UnknownMode => write!(f, "unknown playback mode"),
            Self::UnknownPin => write!(f, "invalid pin for DAC"),
            Self::InvalidRate => write!(f, "invalid update rate"),
        }
    }
}

/// DAC errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DacError {
    /// Caller passed an unusable argument
    InvalidArgument(Reason),
    /// Operation needs a timer and none is bound
    InvalidState,
    /// Queue already holds `QUEUE_DEPTH` buffers
    QueueFull,
    /// Physical output rejected the write
    Device(OutputError),
    /// Timer could not be armed
    Timer(TimerError),
}

impl From<OutputError> for DacError {
    fn from(err: OutputError) -> Self {
        Self::Device(err)
    }
}

impl From<TimerError> for DacError {
    fn from(err: TimerError) -> Self {
        Self::Timer(err)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for DacError {}

impl core::fmt::Display for DacError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument(reason) => write!(f, "Invalid argument: {reason}"),
            Self::InvalidState => write!(f, "No timer bound to DAC"),
            Self::QueueFull => write!(f, "DAC queue full"),
            Self::Device(err) => write!(f, "DAC output error: {err}"),
            Self::Timer(err) => write!(f, "DAC timer error: {err}"),
        }
    }
}
