// Desktop binary: prints its summary to stdout.
#![allow(clippy::print_stdout)]

use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use dac::{DeviceState, PlaybackMode, Rate};
use embassy_futures::block_on;
use platform::config::{dev_banner, DEFAULT_RATE_HZ, DEFAULT_TICK_HZ, DRIVER_NAME, DRIVER_VERSION};
use platform::{DacChannel, TickPeriod};
use simulator::{logging, output, waveform, Sample, SimRegistry, Waveform};
use static_cell::StaticCell;

static REGISTRY: StaticCell<SimRegistry> = StaticCell::new();

#[derive(Parser)]
#[command(name = "dac-sim")]
#[command(about = "Stream a waveform through the simulated DAC", long_about = None)]
#[command(version)]
struct Cli {
    /// DAC channel (1 = GPIO25, 2 = GPIO26)
    #[arg(long, default_value_t = 1)]
    channel: u8,
    /// Output updates per second
    #[arg(long, default_value_t = DEFAULT_RATE_HZ)]
    rate_hz: f32,
    /// Timer period in milliseconds; overrides --rate-hz
    #[arg(long)]
    period_ms: Option<u32>,
    /// Playback mode: `once` drops each buffer after playing it, `loop` replays the queue
    #[arg(long, default_value = "loop")]
    mode: PlaybackMode,
    /// How long to let the stream run
    #[arg(long, default_value_t = 100)]
    duration_ms: u64,
    /// Waveform to queue
    #[arg(long, value_enum, default_value_t = Waveform::Sine)]
    waveform: Waveform,
    /// Samples per waveform period
    #[arg(long, default_value_t = 64)]
    samples: usize,
    /// Number of periods to queue, one buffer each
    #[arg(long, default_value_t = 1)]
    periods: usize,
}

/// Mean update rate over the samples written at or after `since`.
#[allow(clippy::cast_precision_loss)] // sample counts are small
#[allow(clippy::arithmetic_side_effects)] // float math; span checked positive
fn measured_rate_hz(samples: &[Sample], since: Instant) -> Option<f64> {
    let streamed: Vec<&Sample> = samples.iter().filter(|s| s.at >= since).collect();
    let (first, last) = (streamed.first()?, streamed.last()?);
    let span = last.at.duration_since(first.at).as_secs_f64();
    if span <= 0.0 {
        return None;
    }
    Some(streamed.len().saturating_sub(1) as f64 / span)
}

fn main() -> Result<()> {
    logging::try_init()?;
    let cli = Cli::parse();
    tracing::info!(name = DRIVER_NAME, version = DRIVER_VERSION, "{}", dev_banner());

    let channel = DacChannel::ALL
        .into_iter()
        .find(|ch| ch.number() == cli.channel)
        .ok_or_else(|| anyhow!("no DAC channel {} (expected 1 or 2)", cli.channel))?;

    let (registry, probes) = simulator::registry();
    let registry: &'static SimRegistry = REGISTRY.init(registry);
    let [probe_one, probe_two] = &probes;
    let probe = match channel {
        DacChannel::One => probe_one,
        DacChannel::Two => probe_two,
    };

    let dac = block_on(registry.open(channel.pin())).context("opening DAC")?;
    block_on(dac.set_mode(cli.mode));
    let rate = match cli.period_ms {
        Some(ms) => Rate::Period(
            TickPeriod::from_period(ms, DEFAULT_TICK_HZ)
                .map_err(|err| anyhow!("invalid --period-ms: {err}"))?,
        ),
        None => Rate::Frequency(cli.rate_hz),
    };
    block_on(dac.configure_rate(rate)).context("setting rate")?;

    let buffer = waveform::render(cli.waveform, cli.samples);
    for _ in 0..cli.periods {
        block_on(dac.enqueue(buffer.clone())).context("queueing waveform")?;
    }

    tracing::info!(
        %channel,
        mode = %cli.mode,
        ticks_per_update = block_on(dac.status()).period.map_or(0, TickPeriod::ticks),
        depth = block_on(dac.queue_depth()),
        "streaming"
    );
    let started = Instant::now();
    block_on(dac.start()).context("starting stream")?;

    let deadline = started
        .checked_add(Duration::from_millis(cli.duration_ms))
        .ok_or_else(|| anyhow!("duration out of range"))?;
    while Instant::now() < deadline {
        if block_on(dac.status()).state == DeviceState::Idle {
            break;
        }
        thread::sleep(Duration::from_millis(1));
    }
    block_on(dac.stop());
    let elapsed = started.elapsed();

    let status = block_on(dac.status());
    let values = probe.values();
    let (min, max) = values
        .iter()
        .fold((u8::MAX, u8::MIN), |(lo, hi), &v| (lo.min(v), hi.max(v)));

    println!(
        "{channel} on {}: {} writes in {} ms",
        channel.pin(),
        values.len(),
        elapsed.as_millis()
    );
    if !values.is_empty() {
        println!(
            "  range {min}..={max} ({}..={} mV), final {} mV",
            output::code_to_mv(min),
            output::code_to_mv(max),
            probe.level_mv()
        );
    }
    if let Some(hz) = measured_rate_hz(&probe.samples(), started) {
        println!("  measured rate {hz:.0} Hz");
    }
    println!(
        "  queue depth {}, dropped writes {}, missed ticks {}",
        status.depth, status.dropped_writes, status.missed_ticks
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::arithmetic_side_effects)] // Tests use unwrap() for readable assertions
mod tests {
    use super::*;

    fn sample(at: Instant) -> Sample {
        Sample { at, value: 0 }
    }

    #[test]
    fn test_measured_rate_ignores_samples_before_start() {
        let t0 = Instant::now();
        let started = t0 + Duration::from_millis(50);
        let samples: Vec<Sample> = std::iter::once(sample(t0))
            .chain((0..5).map(|i| sample(started + Duration::from_millis(i * 10))))
            .collect();

        let hz = measured_rate_hz(&samples, started).unwrap();
        assert!((hz - 100.0).abs() < 1e-6, "4 intervals over 40 ms, got {hz}");
    }

    #[test]
    fn test_measured_rate_needs_a_span() {
        let t0 = Instant::now();
        assert_eq!(measured_rate_hz(&[], t0), None);
        assert_eq!(measured_rate_hz(&[sample(t0)], t0), None);
    }
}
