//! Thread-backed hardware timer.
//!
//! Each armed `SimTimer` owns one OS thread named `dac-timer` that sleeps
//! for the configured period and then calls the tick handler, standing in
//! for the timer-group interrupt on the target. Deadlines are absolute, so
//! a slow handler makes later ticks fire back-to-back instead of drifting.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use platform::{HardwareTimer, TickAction, TickHandler, TickPeriod, TimerError, TimerMode};

#[derive(Default)]
struct Shared {
    running: AtomicBool,
    ticks: AtomicU64,
}

/// Hosted stand-in for a hardware timer.
#[derive(Default)]
pub struct SimTimer {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
    period: Option<TickPeriod>,
}

impl SimTimer {
    /// Create a disarmed timer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Expiries delivered since the timer was created.
    pub fn ticks(&self) -> u64 {
        self.shared.ticks.load(Ordering::Relaxed)
    }

    /// Counter time elapsed, in milliseconds: delivered ticks times the
    /// current period.
    pub fn value_ms(&self) -> u64 {
        let Some(period) = self.period else {
            return 0;
        };
        let nanos = u128::from(self.ticks()).saturating_mul(u128::from(period.as_nanos()));
        u64::try_from(nanos.checked_div(1_000_000).unwrap_or(0)).unwrap_or(u64::MAX)
    }

    fn run(
        shared: &Shared,
        interval: Duration,
        mode: TimerMode,
        handler: &'static dyn TickHandler,
    ) {
        let mut deadline = Instant::now();
        while shared.running.load(Ordering::Acquire) {
            deadline = deadline.checked_add(interval).unwrap_or(deadline);
            let wait = deadline.saturating_duration_since(Instant::now());
            if !wait.is_zero() {
                thread::sleep(wait);
            }
            if !shared.running.load(Ordering::Acquire) {
                break;
            }

            shared.ticks.fetch_add(1, Ordering::Relaxed);
            let action = handler.on_tick();
            if action == TickAction::Stop || mode == TimerMode::OneShot {
                shared.running.store(false, Ordering::Release);
                break;
            }
        }
    }
}

impl HardwareTimer for SimTimer {
    fn enable(
        &mut self,
        period: TickPeriod,
        mode: TimerMode,
        handler: &'static dyn TickHandler,
    ) -> Result<(), TimerError> {
        self.disable();

        let interval = Duration::from_nanos(period.as_nanos());
        let shared = Arc::clone(&self.shared);
        shared.running.store(true, Ordering::Release);

        let worker = thread::Builder::new()
            .name("dac-timer".into())
            .spawn(move || Self::run(&shared, interval, mode, handler))
            .map_err(|err| {
                tracing::warn!(%err, "failed to spawn timer thread");
                self.shared.running.store(false, Ordering::Release);
                TimerError::Unavailable
            })?;

        self.worker = Some(worker);
        self.period = Some(period);
        tracing::trace!(ticks = period.ticks(), ?mode, "timer armed");
        Ok(())
    }

    fn disable(&mut self) {
        self.shared.running.store(false, Ordering::Release);
        if let Some(worker) = self.worker.take() {
            // A handler can never join its own thread.
            if worker.thread().id() != thread::current().id() {
                let _ = worker.join();
            }
        }
    }

    fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }
}

impl Drop for SimTimer {
    fn drop(&mut self) {
        self.disable();
    }
}
