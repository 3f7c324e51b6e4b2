//! Hardware timer abstraction
//!
//! The DAC streaming layer only needs three things from a timer: arm it with
//! a period and a tick handler, disarm it, and ask whether it is armed. The
//! register-level programming sequence lives behind [`HardwareTimer`].
//!
//! # Disable contract
//!
//! [`HardwareTimer::disable`] is synchronous: once it returns, the handler
//! is not running and will not be invoked again until the next `enable`.
//! It is idempotent and infallible.
//!
//! # Tick handlers
//!
//! The handler runs in interrupt context (or the simulator's timer thread).
//! It reports back through [`TickAction`] instead of calling into the timer,
//! so a handler never needs a reference to the timer that is invoking it.

use crate::config::{MAX_RATE_HZ, TIMER_SCALE_HZ};
use crate::dac_types::OutOfRangeError;

/// Timer firing mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerMode {
    /// Fire once, then disarm.
    OneShot,
    /// Auto-reload and fire every period until disabled.
    Periodic,
}

/// What the timer should do after a tick handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TickAction {
    /// Keep firing (periodic timers only).
    Continue,
    /// Disarm the timer; equivalent to calling `disable` after this tick.
    Stop,
}

/// Callback invoked on every timer expiry.
///
/// Must not block: implementations may only use non-blocking lock
/// acquisition.
pub trait TickHandler: Sync {
    /// Handle one expiry.
    fn on_tick(&self) -> TickAction;
}

/// Hardware timer trait
pub trait HardwareTimer {
    /// Arm the timer.
    ///
    /// Any previous arming is cancelled first. `handler` is invoked once per
    /// `period` until the timer is disabled or the handler returns
    /// [`TickAction::Stop`].
    fn enable(
        &mut self,
        period: TickPeriod,
        mode: TimerMode,
        handler: &'static dyn TickHandler,
    ) -> Result<(), TimerError>;

    /// Disarm the timer. Synchronous and idempotent.
    fn disable(&mut self);

    /// `true` while the timer is armed.
    fn is_running(&self) -> bool;
}

/// Timer errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerError {
    /// Timer group/index or divider rejected by the peripheral
    InvalidConfig,
    /// No interrupt line could be allocated for the timer
    InterruptAlloc,
    /// Timer resource (or simulator thread) could not be started
    Unavailable,
}

#[cfg(feature = "std")]
impl std::error::Error for TimerError {}

impl core::fmt::Display for TimerError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidConfig => write!(f, "Timer configuration rejected"),
            Self::InterruptAlloc => write!(f, "Timer interrupt allocation failed"),
            Self::Unavailable => write!(f, "Timer unavailable"),
        }
    }
}

// ── TickPeriod ───────────────────────────────────────────────────────────────

/// Timer period, in counts of the prescaled timer clock
/// ([`TIMER_SCALE_HZ`], 10 MHz).
///
/// Always at least one count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(transparent)]
pub struct TickPeriod(u64);

impl TickPeriod {
    /// Period for an update rate of `hz` updates per second.
    ///
    /// `period = TIMER_SCALE_HZ / hz`, truncated.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] unless `0 < hz <= MAX_RATE_HZ`.
    #[allow(clippy::cast_possible_truncation)] // value field is diagnostic only
    #[allow(clippy::cast_sign_loss)] // Safety: hz > 0 checked, quotient is positive
    #[allow(clippy::arithmetic_side_effects)] // Safety: float division by hz > 0
    pub fn from_hz(hz: f32) -> Result<Self, OutOfRangeError> {
        if !hz.is_finite() || hz <= 0.0 || hz > MAX_RATE_HZ {
            return Err(OutOfRangeError {
                value: hz as i64,
                min: 0,
                max: MAX_RATE_HZ as i64,
            });
        }
        let ticks = (TIMER_SCALE_HZ as f64 / f64::from(hz)) as u64;
        Self::from_ticks(ticks)
    }

    /// Period given directly in timer counts.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `ticks == 0`.
    pub fn from_ticks(ticks: u64) -> Result<Self, OutOfRangeError> {
        if ticks == 0 {
            Err(OutOfRangeError {
                value: 0,
                min: 1,
                max: i64::MAX,
            })
        } else {
            Ok(Self(ticks))
        }
    }

    /// Period of `period` units where one unit is `1 / tick_hz` seconds.
    ///
    /// `from_period(5, 1000)` is 5 ms.
    ///
    /// # Errors
    ///
    /// Returns [`OutOfRangeError`] if `tick_hz == 0` or the result rounds
    /// down to zero counts.
    pub fn from_period(period: u32, tick_hz: u32) -> Result<Self, OutOfRangeError> {
        let ticks = u64::from(period)
            .checked_mul(TIMER_SCALE_HZ)
            .and_then(|scaled| scaled.checked_div(u64::from(tick_hz)))
            .ok_or(OutOfRangeError {
                value: i64::from(tick_hz),
                min: 1,
                max: i64::from(u32::MAX),
            })?;
        Self::from_ticks(ticks)
    }

    /// Raw timer counts.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.0
    }

    /// Period length in nanoseconds (saturating).
    #[must_use]
    #[allow(clippy::arithmetic_side_effects)] // Safety: u64 * 1e9 fits in u128; TIMER_SCALE_HZ != 0
    pub fn as_nanos(self) -> u64 {
        let nanos = u128::from(self.0) * 1_000_000_000 / u128::from(TIMER_SCALE_HZ);
        u64::try_from(nanos).unwrap_or(u64::MAX)
    }

    /// Update rate this period corresponds to.
    #[must_use]
    #[allow(clippy::cast_precision_loss)] // rate is informational
    #[allow(clippy::arithmetic_side_effects)] // Safety: self.0 >= 1 by construction
    pub fn frequency_hz(self) -> f32 {
        (TIMER_SCALE_HZ as f64 / self.0 as f64) as f32
    }
}
