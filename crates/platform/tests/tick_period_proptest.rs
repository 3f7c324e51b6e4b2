//! Property-based tests for timer period math.
//! Verifies invariants hold for ALL valid inputs, not just fixed examples.

use platform::config::{MAX_RATE_HZ, TIMER_SCALE_HZ};
use platform::TickPeriod;

proptest::proptest! {
    /// TickPeriod::from_hz never panics for any f32 input.
    #[test]
    fn from_hz_never_panics(hz in proptest::num::f32::ANY) {
        // May return Err but must not panic
        let _ = TickPeriod::from_hz(hz);
    }

    /// Every accepted rate yields a period of at least one count.
    #[test]
    fn from_hz_valid_range_always_succeeds(hz in 1.0f32..=MAX_RATE_HZ) {
        let period = TickPeriod::from_hz(hz);
        assert!(period.is_ok(), "{hz} Hz should be accepted");
        if let Ok(p) = period {
            assert!(p.ticks() >= 1);
        }
    }

    /// Faster rate → shorter or equal period.
    #[test]
    fn period_is_monotone_inverse_of_rate(a in 1.0f32..=MAX_RATE_HZ, b in 1.0f32..=MAX_RATE_HZ) {
        if let (Ok(pa), Ok(pb)) = (TickPeriod::from_hz(a), TickPeriod::from_hz(b)) {
            if a > b {
                assert!(pa.ticks() <= pb.ticks(),
                    "{} Hz → {} counts should be <= {} Hz → {} counts",
                    a, pa.ticks(), b, pb.ticks());
            }
        }
    }

    /// Nanosecond conversion is exact for whole counts of the 10 MHz clock.
    #[test]
    fn as_nanos_is_100ns_per_count(ticks in 1u64..=1_000_000_000u64) {
        assert_eq!(TIMER_SCALE_HZ, 10_000_000);
        let p = TickPeriod::from_ticks(ticks);
        assert_eq!(p.map(TickPeriod::as_nanos), Ok(ticks.saturating_mul(100)));
    }

    /// from_period never panics, including u32 extremes.
    #[test]
    fn from_period_never_panics(period in 0u32..=u32::MAX, tick_hz in 0u32..=u32::MAX) {
        let _ = TickPeriod::from_period(period, tick_hz);
    }
}
