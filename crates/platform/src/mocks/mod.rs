//! Mock implementations for testing
//!
//! This module provides mock implementations of the platform traits for use
//! in unit and integration tests. The DAC output and timer mocks are cheap
//! `Clone` handles over shared state, so a test can keep one handle while
//! the device under test owns another.

#![cfg(any(test, feature = "std"))]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::vec::Vec;

use crate::dac_types::{DacChannel, DacValue};
use crate::output::{DacOutput, OutputError};
use crate::peripheral::{UartConfig, UartPeripheral};
use crate::ppp::{IpConfig, PppStack};
use crate::timer::{HardwareTimer, TickAction, TickHandler, TickPeriod, TimerError, TimerMode};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// ── DAC output ───────────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct OutputState {
    enabled: Vec<DacChannel>,
    enable_calls: usize,
    writes: Vec<(DacChannel, u8)>,
    fail_writes: bool,
}

/// Mock DAC output that records every write.
#[derive(Debug, Clone, Default)]
pub struct MockDacOutput {
    state: Arc<Mutex<OutputState>>,
}

impl MockDacOutput {
    /// Create new mock output with both channels disabled
    pub fn new() -> Self {
        Self::default()
    }

    /// All writes so far, in order
    pub fn writes(&self) -> Vec<(DacChannel, u8)> {
        lock(&self.state).writes.clone()
    }

    /// Values written to one channel, in order
    pub fn values(&self, channel: DacChannel) -> Vec<u8> {
        lock(&self.state)
            .writes
            .iter()
            .filter(|(ch, _)| *ch == channel)
            .map(|(_, v)| *v)
            .collect()
    }

    /// Last value written to `channel`
    pub fn last(&self, channel: DacChannel) -> Option<u8> {
        lock(&self.state)
            .writes
            .iter()
            .rev()
            .find(|(ch, _)| *ch == channel)
            .map(|(_, v)| *v)
    }

    /// Check if `channel` has been enabled
    pub fn is_enabled(&self, channel: DacChannel) -> bool {
        lock(&self.state).enabled.contains(&channel)
    }

    /// Number of `enable_channel` calls
    pub fn enable_calls(&self) -> usize {
        lock(&self.state).enable_calls
    }

    /// Make subsequent writes fail with [`OutputError::Bus`]
    pub fn set_fail_writes(&self, fail: bool) {
        lock(&self.state).fail_writes = fail;
    }

    /// Forget recorded writes
    pub fn clear_writes(&self) {
        lock(&self.state).writes.clear();
    }
}

impl DacOutput for MockDacOutput {
    fn enable_channel(&mut self, channel: DacChannel) -> Result<(), OutputError> {
        let mut state = lock(&self.state);
        state.enable_calls = state.enable_calls.saturating_add(1);
        if !state.enabled.contains(&channel) {
            state.enabled.push(channel);
        }
        Ok(())
    }

    fn write(&mut self, channel: DacChannel, value: DacValue) -> Result<(), OutputError> {
        let mut state = lock(&self.state);
        if state.fail_writes {
            return Err(OutputError::Bus);
        }
        if !state.enabled.contains(&channel) {
            return Err(OutputError::NotEnabled);
        }
        state.writes.push((channel, value.get()));
        Ok(())
    }
}

// ── Timer ────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct TimerState {
    running: bool,
    period: Option<TickPeriod>,
    mode: Option<TimerMode>,
    handler: Option<&'static dyn TickHandler>,
    enable_calls: usize,
    disable_calls: usize,
    fired: u64,
    fail_next_enable: Option<TimerError>,
}

/// Mock hardware timer driven manually with [`MockTimer::fire`].
///
/// Nothing ticks on its own; tests decide exactly when each expiry happens.
#[derive(Clone, Default)]
pub struct MockTimer {
    state: Arc<Mutex<TimerState>>,
}

impl MockTimer {
    /// Create new disarmed mock timer
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulate one expiry. Returns the handler's verdict, or `None` if the
    /// timer is not armed.
    ///
    /// The internal lock is released while the handler runs so the handler
    /// may observe the timer through another handle.
    pub fn fire(&self) -> Option<TickAction> {
        let (handler, mode) = {
            let state = lock(&self.state);
            if !state.running {
                return None;
            }
            (state.handler?, state.mode?)
        };

        let action = handler.on_tick();

        let mut state = lock(&self.state);
        state.fired = state.fired.saturating_add(1);
        if action == TickAction::Stop || mode == TimerMode::OneShot {
            state.running = false;
        }
        Some(action)
    }

    /// Fire until the timer disarms or `max` expiries have happened.
    /// Returns the number of expiries delivered.
    pub fn run(&self, max: usize) -> usize {
        let mut delivered = 0usize;
        while delivered < max && self.fire().is_some() {
            delivered = delivered.saturating_add(1);
        }
        delivered
    }

    /// Period passed to the last `enable`
    pub fn period(&self) -> Option<TickPeriod> {
        lock(&self.state).period
    }

    /// Mode passed to the last `enable`
    pub fn mode(&self) -> Option<TimerMode> {
        lock(&self.state).mode
    }

    /// Number of `enable` calls (including failed ones)
    pub fn enable_calls(&self) -> usize {
        lock(&self.state).enable_calls
    }

    /// Number of `disable` calls
    pub fn disable_calls(&self) -> usize {
        lock(&self.state).disable_calls
    }

    /// Expiries delivered so far
    pub fn fired(&self) -> u64 {
        lock(&self.state).fired
    }

    /// Make the next `enable` fail with `error`
    pub fn fail_next_enable(&self, error: TimerError) {
        lock(&self.state).fail_next_enable = Some(error);
    }
}

impl HardwareTimer for MockTimer {
    fn enable(
        &mut self,
        period: TickPeriod,
        mode: TimerMode,
        handler: &'static dyn TickHandler,
    ) -> Result<(), TimerError> {
        let mut state = lock(&self.state);
        state.enable_calls = state.enable_calls.saturating_add(1);
        state.running = false;
        if let Some(error) = state.fail_next_enable.take() {
            return Err(error);
        }
        state.period = Some(period);
        state.mode = Some(mode);
        state.handler = Some(handler);
        state.running = true;
        Ok(())
    }

    fn disable(&mut self) {
        let mut state = lock(&self.state);
        state.disable_calls = state.disable_calls.saturating_add(1);
        state.running = false;
    }

    fn is_running(&self) -> bool {
        lock(&self.state).running
    }
}

// ── UART ─────────────────────────────────────────────────────────────────────

/// Mock UART with scripted inbound bytes and a captured outbound stream.
#[derive(Debug, Default)]
pub struct MockUart {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    config: Option<UartConfig>,
    fail: bool,
    fail_configure: bool,
}

impl MockUart {
    /// Create new mock UART
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be returned by subsequent reads
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend(data.iter().copied());
    }

    /// Everything written so far
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    /// Last configuration applied, `None` until `configure` is called
    pub fn config(&self) -> Option<UartConfig> {
        self.config
    }

    /// Make reads and writes fail
    pub fn set_fail(&mut self, fail: bool) {
        self.fail = fail;
    }

    /// Make `configure` fail
    pub fn set_fail_configure(&mut self, fail: bool) {
        self.fail_configure = fail;
    }
}

/// Error returned by [`MockUart`] when failure is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockUartError;

impl UartPeripheral for MockUart {
    type Error = MockUartError;

    async fn write(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        if self.fail {
            return Err(MockUartError);
        }
        self.tx.extend_from_slice(data);
        Ok(())
    }

    async fn read(&mut self, buffer: &mut [u8]) -> Result<usize, Self::Error> {
        if self.fail {
            return Err(MockUartError);
        }
        let mut count = 0usize;
        for slot in buffer.iter_mut() {
            let Some(byte) = self.rx.pop_front() else {
                break;
            };
            *slot = byte;
            count = count.saturating_add(1);
        }
        Ok(count)
    }

    fn configure(&mut self, config: UartConfig) -> Result<(), Self::Error> {
        if self.fail_configure {
            return Err(MockUartError);
        }
        self.config = Some(config);
        Ok(())
    }
}

// ── PPP stack ────────────────────────────────────────────────────────────────

/// Mock PPP stack with scripted output and status events.
#[derive(Debug, Default)]
pub struct MockPppStack {
    open: bool,
    connect_calls: usize,
    close_calls: usize,
    fail_open: bool,
    received: Vec<u8>,
    outbound: VecDeque<u8>,
    statuses: VecDeque<i32>,
    ip: IpConfig,
}

/// Error returned by [`MockPppStack`] when failure is injected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockPppError;

impl MockPppStack {
    /// Create new mock stack
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `open` fail
    pub fn set_fail_open(&mut self, fail: bool) {
        self.fail_open = fail;
    }

    /// Queue bytes the stack will hand to the UART
    pub fn queue_output(&mut self, data: &[u8]) {
        self.outbound.extend(data.iter().copied());
    }

    /// Queue a status-callback code
    pub fn queue_status(&mut self, code: i32) {
        self.statuses.push_back(code);
    }

    /// Set the addressing reported by `ip_config`
    pub fn set_ip_config(&mut self, ip: IpConfig) {
        self.ip = ip;
    }

    /// Bytes fed in through `input`
    pub fn received(&self) -> &[u8] {
        &self.received
    }

    /// Check if the session is open
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Number of `connect` calls
    pub fn connect_calls(&self) -> usize {
        self.connect_calls
    }

    /// Number of `close` calls
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }
}

impl PppStack for MockPppStack {
    type Error = MockPppError;

    fn open(&mut self) -> Result<(), Self::Error> {
        if self.fail_open {
            return Err(MockPppError);
        }
        self.open = true;
        Ok(())
    }

    fn connect(&mut self, _holdoff_secs: u16) -> Result<(), Self::Error> {
        self.connect_calls = self.connect_calls.saturating_add(1);
        Ok(())
    }

    fn close(&mut self) -> Result<(), Self::Error> {
        self.close_calls = self.close_calls.saturating_add(1);
        self.open = false;
        // lwIP reports PPPERR_USER once the session is torn down.
        self.statuses.push_back(5);
        Ok(())
    }

    fn input(&mut self, data: &[u8]) {
        self.received.extend_from_slice(data);
    }

    fn poll_output(&mut self, out: &mut [u8]) -> usize {
        let mut count = 0usize;
        for slot in out.iter_mut() {
            let Some(byte) = self.outbound.pop_front() else {
                break;
            };
            *slot = byte;
            count = count.saturating_add(1);
        }
        count
    }

    fn poll_status(&mut self) -> Option<i32> {
        self.statuses.pop_front()
    }

    fn ip_config(&self) -> IpConfig {
        self.ip
    }
}
