//! DAC domain newtypes for compile-time safety.
//!
//! These zero-cost abstractions prevent common errors:
//! - `DacChannel`: only the two physical channels exist
//! - `GpioNum`: pins are looked up, never trusted as channel ids
//! - `DacValue`: 8-bit output code, validated from caller integers

// ── Error type ───────────────────────────────────────────────────────────────

/// Error returned when a value is out of the valid range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct OutOfRangeError {
    /// The value that was out of range.
    pub value: i64,
    /// The inclusive minimum allowed value.
    pub min: i64,
    /// The inclusive maximum allowed value.
    pub max: i64,
}

impl core::fmt::Display for OutOfRangeError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "value {} out of range [{}, {}]",
            self.value, self.min, self.max
        )
    }
}

#[cfg(feature = "std")]
impl std::error::Error for OutOfRangeError {}

// ── GpioNum ──────────────────────────────────────────────────────────────────

/// Raw GPIO pad number as written on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct GpioNum(pub u8);

impl core::fmt::Display for GpioNum {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "GPIO{}", self.0)
    }
}

// ── DacChannel ───────────────────────────────────────────────────────────────

/// One of the two on-chip DAC output channels.
///
/// | Channel | Pad    |
/// |---------|--------|
/// | 1       | GPIO25 |
/// | 2       | GPIO26 |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum DacChannel {
    /// Channel 1, routed to GPIO25.
    One = 1,
    /// Channel 2, routed to GPIO26.
    Two = 2,
}

impl DacChannel {
    /// Both channels, in hardware order.
    pub const ALL: [DacChannel; 2] = [DacChannel::One, DacChannel::Two];

    /// The pad this channel drives.
    #[must_use]
    pub const fn pin(self) -> GpioNum {
        match self {
            DacChannel::One => GpioNum(25),
            DacChannel::Two => GpioNum(26),
        }
    }

    /// Find the channel routed to `pin`, if any.
    #[must_use]
    pub fn from_pin(pin: GpioNum) -> Option<Self> {
        Self::ALL.into_iter().find(|ch| ch.pin() == pin)
    }

    /// Hardware channel number (1 or 2).
    #[must_use]
    pub const fn number(self) -> u8 {
        self as u8
    }
}

impl core::fmt::Display for DacChannel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "DAC{}", self.number())
    }
}

// ── DacValue ─────────────────────────────────────────────────────────────────

/// 8-bit DAC output code (0 = 0 V, 255 = full scale).
///
/// Bytes taken from queued buffers convert infallibly via `From<u8>`.
/// Integers supplied by callers go through [`DacValue::try_new`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct DacValue(u8);

impl DacValue {
    /// Lowest output code.
    pub const MIN: DacValue = DacValue(0);

    /// Highest output code.
    pub const MAX: DacValue = DacValue(u8::MAX);

    /// Validate an arbitrary integer as an output code.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `value` is outside `0..=255`.
    pub fn try_new(value: i32) -> Result<Self, OutOfRangeError> {
        u8::try_from(value).map(Self).map_err(|_| OutOfRangeError {
            value: i64::from(value),
            min: 0,
            max: i64::from(u8::MAX),
        })
    }

    /// Return the raw code.
    #[must_use]
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl From<u8> for DacValue {
    fn from(value: u8) -> Self {
        Self(value)
    }
}
