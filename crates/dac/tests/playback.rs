//! Playback ordering tests. Drive a device through `step()` and check what
//! reaches the output.
// Integration test file: unwrap/panic are intentional test mechanisms.
#![allow(clippy::unwrap_used, clippy::panic, clippy::arithmetic_side_effects)]
//!
//! Run with: cargo test -p dac --test playback

use dac::{DacDevice, DacError, PlaybackMode, Reason, QUEUE_DEPTH};
use embassy_futures::block_on;
use platform::mocks::{MockDacOutput, MockTimer};
use platform::DacChannel;
use proptest::prelude::*;

type Device = DacDevice<MockDacOutput, MockTimer, Vec<u8>>;

fn device(mode: PlaybackMode) -> (Device, MockDacOutput) {
    let out = MockDacOutput::new();
    let dac = DacDevice::new(DacChannel::One, out.clone());
    block_on(async {
        dac.open().await.unwrap();
        dac.set_mode(mode).await;
    });
    out.clear_writes();
    (dac, out)
}

fn steps(dac: &Device, n: usize) -> Vec<Option<u8>> {
    (0..n).map(|_| block_on(dac.step())).collect()
}

fn buffers() -> impl Strategy<Value = Vec<Vec<u8>>> {
    prop::collection::vec(prop::collection::vec(any::<u8>(), 1..8), 1..6)
}

proptest! {
    /// Once: every byte of every buffer exactly once, in order, then nothing.
    #[test]
    fn once_emits_concatenation_then_stops(bufs in buffers()) {
        let (dac, out) = device(PlaybackMode::Once);
        for buf in &bufs {
            block_on(dac.enqueue(buf.clone())).unwrap();
        }
        let expected: Vec<u8> = bufs.concat();

        let emitted = steps(&dac, expected.len());
        prop_assert_eq!(emitted, expected.iter().copied().map(Some).collect::<Vec<_>>());
        prop_assert_eq!(block_on(dac.step()), None);
        prop_assert_eq!(block_on(dac.queue_depth()), 0);
        prop_assert_eq!(out.values(DacChannel::One), expected);
    }

    /// Loop: the concatenation repeats and nothing leaves the queue.
    #[test]
    fn loop_repeats_concatenation(bufs in buffers(), rounds in 1usize..4) {
        let (dac, _) = device(PlaybackMode::Loop);
        for buf in &bufs {
            block_on(dac.enqueue(buf.clone())).unwrap();
        }
        let once: Vec<u8> = bufs.concat();
        let expected: Vec<Option<u8>> = once
            .iter()
            .copied()
            .cycle()
            .take(once.len() * rounds)
            .map(Some)
            .collect();

        prop_assert_eq!(steps(&dac, expected.len()), expected);
        prop_assert_eq!(block_on(dac.queue_depth()), bufs.len());
    }

    /// clear() at any point leaves an empty, idle device.
    #[test]
    fn clear_anywhere_empties(bufs in buffers(), before in 0usize..20, mode_once in any::<bool>()) {
        let mode = if mode_once { PlaybackMode::Once } else { PlaybackMode::Loop };
        let (dac, _) = device(mode);
        for buf in &bufs {
            block_on(dac.enqueue(buf.clone())).unwrap();
        }
        steps(&dac, before);

        block_on(dac.clear());
        prop_assert_eq!(block_on(dac.queue_depth()), 0);
        prop_assert_eq!(block_on(dac.step()), None);
    }
}

#[test]
fn zero_length_enqueue_is_rejected() {
    let (dac, _) = device(PlaybackMode::Once);
    block_on(dac.enqueue(vec![1])).unwrap();

    assert_eq!(
        block_on(dac.enqueue(Vec::new())),
        Err(DacError::InvalidArgument(Reason::EmptyBuffer))
    );
    assert_eq!(block_on(dac.queue_depth()), 1);
}

#[test]
fn out_of_range_write_leaves_hardware_unchanged() {
    let (dac, out) = device(PlaybackMode::Once);
    block_on(dac.write(17)).unwrap();

    for bad in [-1, 256, 1_000, i32::MIN] {
        assert_eq!(
            block_on(dac.write(bad)),
            Err(DacError::InvalidArgument(Reason::ValueOutOfRange)),
            "{bad} must be rejected"
        );
    }
    assert_eq!(out.values(DacChannel::One), [17]);
}

#[test]
fn switching_loop_to_once_drains_as_buffers_finish() {
    let (dac, _) = device(PlaybackMode::Loop);
    for b in [[1u8, 1], [2, 2], [3, 3]] {
        block_on(dac.enqueue(b.to_vec())).unwrap();
    }
    // one full lap plus the first byte of the head
    assert_eq!(
        steps(&dac, 7),
        [1, 1, 2, 2, 3, 3, 1].map(Some)
    );
    assert_eq!(block_on(dac.queue_depth()), 3);

    block_on(dac.set_mode(PlaybackMode::Once));
    assert_eq!(block_on(dac.step()), Some(1));
    assert_eq!(block_on(dac.step()), Some(2));
    assert_eq!(block_on(dac.queue_depth()), 2);
    assert_eq!(steps(&dac, 3), [Some(2), Some(3), Some(3)]);
    assert_eq!(block_on(dac.queue_depth()), 1);
    assert_eq!(block_on(dac.step()), None);
    assert_eq!(block_on(dac.queue_depth()), 0);
}

#[test]
fn two_buffers_once_yields_three_bytes_then_nothing() {
    let (dac, out) = device(PlaybackMode::Once);
    block_on(dac.enqueue(vec![0x10, 0x20])).unwrap();
    block_on(dac.enqueue(vec![0x30])).unwrap();

    assert_eq!(steps(&dac, 4), [Some(0x10), Some(0x20), Some(0x30), None]);
    assert_eq!(out.values(DacChannel::One), [0x10, 0x20, 0x30]);
}

#[test]
fn queue_capacity_is_bounded() {
    let (dac, _) = device(PlaybackMode::Once);
    for _ in 0..QUEUE_DEPTH {
        block_on(dac.enqueue(vec![0])).unwrap();
    }
    assert_eq!(block_on(dac.enqueue(vec![0])), Err(DacError::QueueFull));

    // one buffer drained frees one slot
    assert_eq!(block_on(dac.step()), Some(0));
    assert_eq!(block_on(dac.step()), Some(0));
    assert_eq!(block_on(dac.enqueue(vec![9])), Ok(QUEUE_DEPTH));
}

#[test]
fn mode_defaults_to_loop() {
    let dac: Device = DacDevice::new(DacChannel::Two, MockDacOutput::new());
    assert_eq!(block_on(dac.mode()), PlaybackMode::Loop);
}
