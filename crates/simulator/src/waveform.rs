//! Test waveforms rendered as one period of 8-bit output codes.

use std::f32::consts::TAU;

/// Waveform shape
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Waveform {
    /// Sine centred on mid-scale
    Sine,
    /// 50 % duty square
    Square,
    /// Symmetric triangle
    Triangle,
    /// Rising ramp
    Sawtooth,
}

/// Render one period of `waveform` as `samples` output codes.
///
/// Returns an empty buffer for `samples == 0`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // clamped to 0..=255 before the cast
#[allow(clippy::cast_precision_loss)] // sample counts are small
#[allow(clippy::arithmetic_side_effects)] // float math; index math guarded by samples > 0
pub fn render(waveform: Waveform, samples: usize) -> Vec<u8> {
    if samples == 0 {
        return Vec::new();
    }
    let n = samples as f32;
    (0..samples)
        .map(|i| {
            let phase = i as f32 / n;
            let level = match waveform {
                Waveform::Sine => 0.5 + 0.5 * (TAU * phase).sin(),
                Waveform::Square => {
                    if phase < 0.5 {
                        1.0
                    } else {
                        0.0
                    }
                }
                Waveform::Triangle => 1.0 - (2.0 * phase - 1.0).abs(),
                Waveform::Sawtooth => phase,
            };
            (level * 255.0).round().clamp(0.0, 255.0) as u8
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_lengths() {
        assert!(render(Waveform::Sine, 0).is_empty());
        assert_eq!(render(Waveform::Square, 16).len(), 16);
    }

    #[test]
    fn test_square_is_two_levels() {
        assert_eq!(render(Waveform::Square, 4), [255, 255, 0, 0]);
    }

    #[test]
    fn test_sine_starts_mid_scale_and_peaks_at_quarter() {
        let sine = render(Waveform::Sine, 8);
        assert_eq!(sine.first(), Some(&128));
        assert_eq!(sine.get(2), Some(&255));
        assert_eq!(sine.get(6), Some(&0));
    }

    #[test]
    fn test_triangle_and_sawtooth_shapes() {
        assert_eq!(render(Waveform::Triangle, 4), [0, 128, 255, 128]);
        assert_eq!(render(Waveform::Sawtooth, 4), [0, 64, 128, 191]);
    }
}
