//! Playback policy.
//!
//! The policy only decides what happens when the current buffer runs out.
//! Emitting bytes is policy-agnostic and lives in [`crate::engine`].

use core::str::FromStr;

use crate::error::{DacError, Reason};
use crate::queue::PlaybackQueue;

/// What to do with a buffer once every byte has been emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PlaybackMode {
    /// Remove each buffer as it finishes; stop when the queue is empty.
    Once,
    /// Keep buffers queued and wrap from the tail back to the head.
    #[default]
    Loop,
}

impl PlaybackMode {
    /// Numeric code for [`PlaybackMode::Loop`].
    pub const LOOP_CODE: u8 = 0;
    /// Numeric code for [`PlaybackMode::Once`].
    pub const ONCE_CODE: u8 = 1;

    /// Pick the entry to continue with after entry `finished` was exhausted.
    ///
    /// `Loop` moves to the successor, wrapping to the head after the tail.
    /// `Once` drops everything from the head up to and including `finished`
    /// and continues with whatever is now at the head. Returns `None` when
    /// nothing is left to play.
    pub fn next_entry<B, const N: usize>(
        self,
        queue: &mut PlaybackQueue<B, N>,
        finished: usize,
    ) -> Option<usize> {
        match self {
            PlaybackMode::Loop => {
                let successor = finished.checked_add(1).filter(|&i| i < queue.len());
                match successor {
                    Some(next) => Some(next),
                    None if queue.is_empty() => None,
                    None => Some(0),
                }
            }
            PlaybackMode::Once => {
                for _ in 0..=finished {
                    if queue.pop_head().is_none() {
                        break;
                    }
                }
                if queue.is_empty() {
                    None
                } else {
                    Some(0)
                }
            }
        }
    }

    /// Stable numeric code.
    pub const fn code(self) -> u8 {
        match self {
            PlaybackMode::Loop => Self::LOOP_CODE,
            PlaybackMode::Once => Self::ONCE_CODE,
        }
    }
}

impl TryFrom<u8> for PlaybackMode {
    type Error = DacError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            Self::LOOP_CODE => Ok(PlaybackMode::Loop),
            Self::ONCE_CODE => Ok(PlaybackMode::Once),
            _ => Err(DacError::InvalidArgument(Reason::UnknownMode)),
        }
    }
}

impl FromStr for PlaybackMode {
    type Err = DacError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("once") {
            Ok(PlaybackMode::Once)
        } else if s.eq_ignore_ascii_case("loop") {
            Ok(PlaybackMode::Loop)
        } else {
            Err(DacError::InvalidArgument(Reason::UnknownMode))
        }
    }
}

impl core::fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            PlaybackMode::Once => write!(f, "once"),
            PlaybackMode::Loop => write!(f, "loop"),
        }
    }
}
