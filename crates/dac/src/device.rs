//! Per-channel DAC device: the control surface and the tick handler.
//!
//! # Concurrency
//!
//! All mutable state sits behind one `embassy_sync` mutex. Task-context
//! methods take it with `lock().await`; the tick handler, which runs in
//! interrupt context, only ever uses `try_lock()` and gives up the tick if
//! the lock is held. Skipped ticks are counted, never retried.
//!
//! The lock is held across timer reprogramming, so a tick can never observe
//! a half-configured device. Timer `disable` is synchronous, so once a
//! control method has halted the timer no further tick runs.
//!
//! # States
//!
//! ```text
//!            start()                    queue exhausted / stop() / clear()
//!   Idle ─────────────► Running ──────────────────────────────────────► Idle
//!                         │  ▲
//!      configure_rate()   ▼  │  (lock held; not observable)
//!                       Configuring
//! ```

use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::mutex::Mutex;
use platform::config::{DEFAULT_RATE_HZ, QUEUE_DEPTH};
use platform::{
    DacChannel, DacOutput, DacValue, HardwareTimer, TickAction, TickHandler, TickPeriod,
    TimerMode,
};

use crate::engine::{Cursor, StreamEngine};
use crate::error::{DacError, Reason};
use crate::policy::PlaybackMode;

/// Update rate for [`DacDevice::configure_rate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Rate {
    /// Updates per second
    Frequency(f32),
    /// Explicit timer period
    Period(TickPeriod),
}

/// Whether the timer is streaming bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DeviceState {
    /// Timer disarmed
    Idle,
    /// Timer armed; one byte per tick
    Running,
}

/// Point-in-time view of a device.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceStatus {
    /// Output channel
    pub channel: DacChannel,
    /// Whether the output stage has been enabled
    pub output_enabled: bool,
    /// Playback policy
    pub mode: PlaybackMode,
    /// Idle or running
    pub state: DeviceState,
    /// Configured timer period, if any
    pub period: Option<TickPeriod>,
    /// Queued buffers
    pub depth: usize,
    /// Read position
    pub cursor: Option<Cursor>,
    /// Tick-path writes the output rejected
    pub dropped_writes: u32,
    /// Ticks skipped because the lock was held
    pub missed_ticks: u32,
}

struct Inner<O, T, B> {
    output: O,
    timer: Option<T>,
    period: Option<TickPeriod>,
    engine: StreamEngine<B, QUEUE_DEPTH>,
    enabled: bool,
    // Authoritative Running flag. The timer may stop itself after a tick, so
    // `is_running()` on the timer can lag behind what the device decided.
    armed: bool,
    dropped_writes: u32,
}

impl<O, T, B> Inner<O, T, B>
where
    O: DacOutput,
    T: HardwareTimer,
    B: AsRef<[u8]>,
{
    /// Enable the output stage and drive it to 0, once.
    fn ensure_enabled(&mut self, channel: DacChannel) -> Result<(), DacError> {
        if self.enabled {
            return Ok(());
        }
        self.output.enable_channel(channel)?;
        self.output.write(channel, DacValue::MIN)?;
        self.enabled = true;
        debug!("{}: output enabled on {}", channel, channel.pin());
        Ok(())
    }

    fn halt(&mut self) {
        if let Some(timer) = self.timer.as_mut() {
            timer.disable();
        }
        self.armed = false;
    }

    fn arm(&mut self, handler: &'static dyn TickHandler) -> Result<TickPeriod, DacError> {
        let (Some(timer), Some(period)) = (self.timer.as_mut(), self.period) else {
            return Err(DacError::InvalidState);
        };
        timer.enable(period, TimerMode::Periodic, handler)?;
        self.armed = true;
        Ok(period)
    }

    fn emit_next(&mut self, channel: DacChannel) -> Option<u8> {
        let byte = self.engine.advance()?;
        if self.output.write(channel, DacValue::from(byte)).is_err() {
            self.dropped_writes = self.dropped_writes.saturating_add(1);
        }
        Some(byte)
    }

    fn state(&self) -> DeviceState {
        if self.armed {
            DeviceState::Running
        } else {
            DeviceState::Idle
        }
    }
}

/// One DAC channel with its queue, policy and timer binding.
///
/// Methods that arm the timer take `&'static self` because the device
/// registers itself as the timer's tick handler. Place devices in a
/// `static` (through [`crate::DacRegistry`] and a `StaticCell`).
pub struct DacDevice<O, T, B> {
    channel: DacChannel,
    state: Mutex<CriticalSectionRawMutex, Inner<O, T, B>>,
    missed_ticks: AtomicU32,
}

impl<O, T, B> DacDevice<O, T, B>
where
    O: DacOutput + Send + 'static,
    T: HardwareTimer + Default + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
{
    /// Create the device for `channel`, idle, in [`PlaybackMode::Loop`].
    ///
    /// The output stage is not touched until [`DacDevice::open`].
    pub fn new(channel: DacChannel, output: O) -> Self {
        Self {
            channel,
            state: Mutex::new(Inner {
                output,
                timer: None,
                period: None,
                engine: StreamEngine::new(PlaybackMode::default()),
                enabled: false,
                armed: false,
                dropped_writes: 0,
            }),
            missed_ticks: AtomicU32::new(0),
        }
    }

    /// Output channel this device drives.
    pub fn channel(&self) -> DacChannel {
        self.channel
    }

    /// Enable the output stage and drive it to 0. Only the first call
    /// touches the hardware.
    ///
    /// `write`, `start` and `step` open the output themselves if needed, so
    /// calling this up front only moves the reset to a known point.
    pub async fn open(&self) -> Result<(), DacError> {
        self.state.lock().await.ensure_enabled(self.channel)
    }

    /// Set the output directly. Halts any running stream first.
    ///
    /// # Errors
    ///
    /// - [`Reason::ValueOutOfRange`] unless `0 <= value <= 255`; the output
    ///   is left unchanged.
    /// - [`DacError::Device`] if the hardware rejects the write.
    pub async fn write(&self, value: i32) -> Result<(), DacError> {
        let mut inner = self.state.lock().await;
        inner.halt();
        let Ok(value) = DacValue::try_new(value) else {
            warn!("{}: value {} out of range", self.channel, value);
            return Err(DacError::InvalidArgument(Reason::ValueOutOfRange));
        };
        inner.ensure_enabled(self.channel)?;
        inner.output.write(self.channel, value).map_err(|err| {
            warn!("{}: write failed", self.channel);
            DacError::Device(err)
        })
    }

    /// Set the streaming rate, creating the default timer if none is bound.
    ///
    /// A running stream is halted, reprogrammed and restarted; an idle one
    /// stays idle.
    pub async fn configure_rate(&'static self, rate: Rate) -> Result<(), DacError> {
        let period = match rate {
            Rate::Frequency(hz) => {
                TickPeriod::from_hz(hz).map_err(|_| DacError::InvalidArgument(Reason::InvalidRate))?
            }
            Rate::Period(period) => period,
        };

        let mut inner = self.state.lock().await;
        let was_running = inner.armed;
        inner.halt();
        if inner.timer.is_none() {
            inner.timer = Some(T::default());
        }
        inner.period = Some(period);
        if was_running {
            inner.arm(self)?;
        }
        debug!(
            "{}: rate set to {} ticks (running: {})",
            self.channel,
            period.ticks(),
            was_running
        );
        Ok(())
    }

    /// Attach a caller-supplied timer, replacing (and disarming) any
    /// previous one. Keeps the configured period, or falls back to the
    /// default rate if none was set. The device is left idle.
    pub async fn bind_timer(&self, timer: T) {
        let mut inner = self.state.lock().await;
        inner.halt();
        inner.timer = Some(timer);
        if inner.period.is_none() {
            inner.period = TickPeriod::from_hz(DEFAULT_RATE_HZ).ok();
        }
        debug!("{}: timer bound", self.channel);
    }

    /// Start streaming. A no-op if already running.
    ///
    /// # Errors
    ///
    /// - [`DacError::InvalidState`] if no timer is bound.
    /// - [`DacError::Timer`] if the timer cannot be armed.
    /// - [`DacError::Device`] if the output stage cannot be enabled.
    pub async fn start(&'static self) -> Result<(), DacError> {
        let mut inner = self.state.lock().await;
        if inner.armed {
            return Ok(());
        }
        inner.ensure_enabled(self.channel)?;
        let period = inner.arm(self)?;
        debug!("{}: started, period {} ticks", self.channel, period.ticks());
        Ok(())
    }

    /// Stop streaming. Idempotent; the queue and cursor are kept.
    pub async fn stop(&self) {
        let mut inner = self.state.lock().await;
        inner.halt();
        debug!("{}: stopped", self.channel);
    }

    /// Queue a buffer for playback. Returns the new queue depth.
    ///
    /// # Errors
    ///
    /// - [`Reason::EmptyBuffer`] for a zero-length buffer.
    /// - [`DacError::QueueFull`] if `QUEUE_DEPTH` buffers are already queued.
    pub async fn enqueue(&self, buffer: B) -> Result<usize, DacError> {
        if buffer.as_ref().is_empty() {
            warn!("{}: rejected empty buffer", self.channel);
            return Err(DacError::InvalidArgument(Reason::EmptyBuffer));
        }
        let mut inner = self.state.lock().await;
        inner.engine.push(buffer).map_err(|_| {
            warn!("{}: queue full", self.channel);
            DacError::QueueFull
        })
    }

    /// Stop streaming and drop every queued buffer. Always succeeds.
    pub async fn clear(&self) {
        let mut inner = self.state.lock().await;
        inner.halt();
        inner.engine.clear();
        debug!("{}: cleared", self.channel);
    }

    /// Stop streaming, then emit exactly one byte. Returns the byte, or
    /// `None` if there is nothing to play or the output cannot be enabled.
    pub async fn step(&self) -> Option<u8> {
        let mut inner = self.state.lock().await;
        inner.halt();
        if inner.ensure_enabled(self.channel).is_err() {
            warn!("{}: output could not be enabled", self.channel);
            return None;
        }
        inner.emit_next(self.channel)
    }

    /// Change the playback policy. Takes effect at the next end-of-buffer.
    pub async fn set_mode(&self, mode: PlaybackMode) {
        self.state.lock().await.engine.set_mode(mode);
        debug!("{}: mode {}", self.channel, mode);
    }

    /// Current playback policy.
    pub async fn mode(&self) -> PlaybackMode {
        self.state.lock().await.engine.mode()
    }

    /// Number of queued buffers.
    pub async fn queue_depth(&self) -> usize {
        self.state.lock().await.engine.depth()
    }

    /// Snapshot of the device.
    pub async fn status(&self) -> DeviceStatus {
        let inner = self.state.lock().await;
        DeviceStatus {
            channel: self.channel,
            output_enabled: inner.enabled,
            mode: inner.engine.mode(),
            state: inner.state(),
            period: inner.period,
            depth: inner.engine.depth(),
            cursor: inner.engine.cursor(),
            dropped_writes: inner.dropped_writes,
            missed_ticks: self.missed_ticks.load(Ordering::Relaxed),
        }
    }
}

impl<O, T, B> TickHandler for DacDevice<O, T, B>
where
    O: DacOutput + Send,
    T: HardwareTimer + Send,
    B: AsRef<[u8]> + Send,
{
    fn on_tick(&self) -> TickAction {
        let Ok(mut inner) = self.state.try_lock() else {
            // Saturates like `dropped_writes`; Err only means already at MAX.
            let _ = self
                .missed_ticks
                .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1));
            return TickAction::Continue;
        };
        if !inner.armed {
            return TickAction::Stop;
        }
        if inner.emit_next(self.channel).is_some() {
            TickAction::Continue
        } else {
            inner.armed = false;
            TickAction::Stop
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)] // Tests use unwrap() for readable assertions
mod tests {
    use super::*;
    use platform::mocks::{MockDacOutput, MockTimer};
    use platform::{OutputError, TimerError};

    type Device = DacDevice<MockDacOutput, MockTimer, &'static [u8]>;

    fn leak_device(channel: DacChannel) -> (&'static Device, MockDacOutput) {
        let output = MockDacOutput::new();
        let device: &'static Device = Box::leak(Box::new(DacDevice::new(channel, output.clone())));
        (device, output)
    }

    #[tokio::test]
    async fn test_open_enables_once_and_zeroes() {
        let (dac, out) = leak_device(DacChannel::One);
        dac.open().await.unwrap();
        dac.open().await.unwrap();

        assert!(out.is_enabled(DacChannel::One));
        assert_eq!(out.enable_calls(), 1);
        assert_eq!(out.values(DacChannel::One), [0]);
    }

    #[tokio::test]
    async fn test_start_without_timer_is_invalid_state() {
        let (dac, _) = leak_device(DacChannel::One);
        assert_eq!(dac.start().await, Err(DacError::InvalidState));
        assert_eq!(dac.status().await.state, DeviceState::Idle);
    }

    #[tokio::test]
    async fn test_tick_streams_queue_and_stops() {
        let (dac, out) = leak_device(DacChannel::Two);
        let timer = MockTimer::new();
        dac.open().await.unwrap();
        dac.bind_timer(timer.clone()).await;
        dac.set_mode(PlaybackMode::Once).await;
        dac.enqueue(&[1, 2, 3]).await.unwrap();

        dac.start().await.unwrap();
        assert_eq!(dac.status().await.state, DeviceState::Running);
        assert_eq!(timer.mode(), Some(TimerMode::Periodic));

        // three bytes, then one tick that finds nothing and disarms
        assert_eq!(timer.run(10), 4);
        assert_eq!(out.values(DacChannel::Two), [0, 1, 2, 3]);
        assert!(!timer.is_running());
        assert_eq!(dac.status().await.state, DeviceState::Idle);
        assert_eq!(dac.queue_depth().await, 0);
    }

    #[tokio::test]
    async fn test_configure_rate_creates_timer_and_keeps_idle() {
        let (dac, _) = leak_device(DacChannel::One);
        dac.configure_rate(Rate::Frequency(8_000.0)).await.unwrap();

        let status = dac.status().await;
        assert_eq!(status.state, DeviceState::Idle);
        assert_eq!(status.period.map(TickPeriod::ticks), Some(1_250));
        // lazily created timer lets start() succeed
        dac.start().await.unwrap();
        assert_eq!(dac.status().await.state, DeviceState::Running);
    }

    #[tokio::test]
    async fn test_configure_rate_restarts_running_timer() {
        let (dac, _) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.bind_timer(timer.clone()).await;
        dac.enqueue(&[7]).await.unwrap();
        dac.start().await.unwrap();

        let period = TickPeriod::from_ticks(500).unwrap();
        dac.configure_rate(Rate::Period(period)).await.unwrap();

        assert!(timer.is_running());
        assert_eq!(timer.period(), Some(period));
        assert_eq!(timer.enable_calls(), 2);
        assert!(timer.disable_calls() >= 1);
    }

    #[tokio::test]
    async fn test_configure_rate_rejects_bad_frequency() {
        let (dac, _) = leak_device(DacChannel::One);
        assert_eq!(
            dac.configure_rate(Rate::Frequency(0.0)).await,
            Err(DacError::InvalidArgument(Reason::InvalidRate))
        );
        assert_eq!(dac.status().await.period, None);
    }

    #[tokio::test]
    async fn test_timer_failure_surfaces_from_start() {
        let (dac, _) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.bind_timer(timer.clone()).await;
        timer.fail_next_enable(TimerError::InterruptAlloc);

        assert_eq!(
            dac.start().await,
            Err(DacError::Timer(TimerError::InterruptAlloc))
        );
        assert_eq!(dac.status().await.state, DeviceState::Idle);
    }

    #[tokio::test]
    async fn test_write_halts_stream_and_validates() {
        let (dac, out) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.open().await.unwrap();
        dac.bind_timer(timer.clone()).await;
        dac.enqueue(&[1, 2]).await.unwrap();
        dac.start().await.unwrap();

        assert_eq!(
            dac.write(300).await,
            Err(DacError::InvalidArgument(Reason::ValueOutOfRange))
        );
        assert!(!timer.is_running());
        assert_eq!(out.values(DacChannel::One), [0], "rejected value never reaches hardware");

        dac.write(200).await.unwrap();
        assert_eq!(out.last(DacChannel::One), Some(200));
    }

    #[tokio::test]
    async fn test_write_surfaces_device_error() {
        let (dac, out) = leak_device(DacChannel::One);
        dac.open().await.unwrap();
        out.set_fail_writes(true);
        assert_eq!(
            dac.write(10).await,
            Err(DacError::Device(OutputError::Bus))
        );
    }

    #[tokio::test]
    async fn test_tick_write_failures_are_counted() {
        let (dac, out) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.open().await.unwrap();
        dac.bind_timer(timer.clone()).await;
        dac.enqueue(&[1, 2]).await.unwrap();
        dac.start().await.unwrap();

        out.set_fail_writes(true);
        assert_eq!(timer.fire(), Some(TickAction::Continue));
        assert_eq!(timer.fire(), Some(TickAction::Continue));

        let status = dac.status().await;
        assert_eq!(status.dropped_writes, 2);
        assert_eq!(status.cursor, Some(Cursor { entry: 0, offset: 2 }));
    }

    #[tokio::test]
    async fn test_enqueue_rejects_empty_and_full() {
        let (dac, _) = leak_device(DacChannel::One);
        assert_eq!(
            dac.enqueue(&[]).await,
            Err(DacError::InvalidArgument(Reason::EmptyBuffer))
        );
        for depth in 1..=QUEUE_DEPTH {
            assert_eq!(dac.enqueue(&[0]).await, Ok(depth));
        }
        assert_eq!(dac.enqueue(&[0]).await, Err(DacError::QueueFull));
        assert_eq!(dac.queue_depth().await, QUEUE_DEPTH);
    }

    #[tokio::test]
    async fn test_step_stops_timer_and_emits() {
        let (dac, out) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.open().await.unwrap();
        dac.bind_timer(timer.clone()).await;
        dac.enqueue(&[42]).await.unwrap();
        dac.start().await.unwrap();

        assert_eq!(dac.step().await, Some(42));
        assert!(!timer.is_running());
        assert_eq!(out.last(DacChannel::One), Some(42));
    }

    #[tokio::test]
    async fn test_clear_drops_queue_and_stops() {
        let (dac, _) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.bind_timer(timer.clone()).await;
        dac.enqueue(&[1, 2]).await.unwrap();
        dac.start().await.unwrap();
        dac.step().await;

        dac.clear().await;
        assert!(!timer.is_running());
        assert_eq!(dac.queue_depth().await, 0);
        assert_eq!(dac.step().await, None);
        assert_eq!(dac.status().await.cursor, None);
    }

    #[tokio::test]
    async fn test_tick_after_stop_is_refused() {
        let (dac, _) = leak_device(DacChannel::One);
        dac.bind_timer(MockTimer::new()).await;
        dac.enqueue(&[1]).await.unwrap();
        dac.start().await.unwrap();
        dac.stop().await;
        dac.stop().await;

        assert_eq!(dac.on_tick(), TickAction::Stop);
        assert_eq!(dac.queue_depth().await, 1);
    }

    #[test]
    fn test_contended_tick_is_counted_not_blocked() {
        let (dac, _) = leak_device(DacChannel::One);
        embassy_futures::block_on(async {
            let _guard = dac.state.lock().await;
            assert_eq!(dac.on_tick(), TickAction::Continue);
            assert_eq!(dac.on_tick(), TickAction::Continue);
        });
        let status = embassy_futures::block_on(dac.status());
        assert_eq!(status.missed_ticks, 2);
    }

    #[test]
    fn test_missed_ticks_saturate() {
        let (dac, _) = leak_device(DacChannel::One);
        dac.missed_ticks.store(u32::MAX - 1, Ordering::Relaxed);
        embassy_futures::block_on(async {
            let _guard = dac.state.lock().await;
            for _ in 0..3 {
                assert_eq!(dac.on_tick(), TickAction::Continue);
            }
        });
        let status = embassy_futures::block_on(dac.status());
        assert_eq!(status.missed_ticks, u32::MAX);
    }

    #[tokio::test]
    async fn test_step_without_open_enables_output_first() {
        let (dac, out) = leak_device(DacChannel::One);
        dac.set_mode(PlaybackMode::Once).await;
        dac.enqueue(&[1, 2, 3]).await.unwrap();

        let emitted = [dac.step().await, dac.step().await, dac.step().await, dac.step().await];
        assert_eq!(emitted, [Some(1), Some(2), Some(3), None]);
        assert!(out.is_enabled(DacChannel::One));
        assert_eq!(out.enable_calls(), 1);
        assert_eq!(out.values(DacChannel::One), [0, 1, 2, 3]);

        let status = dac.status().await;
        assert!(status.output_enabled);
        assert_eq!(status.dropped_writes, 0);
    }

    #[tokio::test]
    async fn test_start_without_open_streams_to_enabled_output() {
        let (dac, out) = leak_device(DacChannel::Two);
        let timer = MockTimer::new();
        dac.bind_timer(timer.clone()).await;
        dac.set_mode(PlaybackMode::Once).await;
        dac.enqueue(&[7, 8]).await.unwrap();

        dac.start().await.unwrap();
        timer.run(10);
        assert_eq!(out.values(DacChannel::Two), [0, 7, 8]);
        assert_eq!(dac.status().await.dropped_writes, 0);
    }

    #[tokio::test]
    async fn test_write_without_open_enables_output() {
        let (dac, out) = leak_device(DacChannel::One);
        dac.write(99).await.unwrap();
        assert_eq!(out.values(DacChannel::One), [0, 99]);
    }

    #[tokio::test]
    async fn test_configure_rate_restart_failure_surfaces() {
        let (dac, _) = leak_device(DacChannel::One);
        let timer = MockTimer::new();
        dac.bind_timer(timer.clone()).await;
        dac.enqueue(&[1]).await.unwrap();
        dac.start().await.unwrap();

        timer.fail_next_enable(TimerError::InterruptAlloc);
        let period = TickPeriod::from_ticks(2_000).unwrap();
        assert_eq!(
            dac.configure_rate(Rate::Period(period)).await,
            Err(DacError::Timer(TimerError::InterruptAlloc))
        );

        let status = dac.status().await;
        assert_eq!(status.state, DeviceState::Idle);
        assert_eq!(status.period, Some(period));
        assert!(!timer.is_running());
    }
}
