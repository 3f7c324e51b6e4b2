//! Stream advancement engine.
//!
//! `StreamEngine` is a pure, `no_std`, allocation-free cursor over a
//! [`PlaybackQueue`]. Each call to [`StreamEngine::advance`] yields the next
//! byte to put on the output, moving to the next buffer (per the
//! [`PlaybackMode`]) when the current one is exhausted.
//!
//! It has no I/O and no locking. The owning device calls it under its lock
//! from both the tick handler and the manual `step` path, which keeps the
//! state machine testable on the host.

use crate::policy::PlaybackMode;
use crate::queue::PlaybackQueue;

/// Read position: entry index (0 = head) and byte offset within it.
///
/// `offset` never exceeds the entry's length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Cursor {
    /// Index of the entry being played
    pub entry: usize,
    /// Next byte to emit from that entry
    pub offset: usize,
}

/// Queue plus cursor plus policy.
pub struct StreamEngine<B, const N: usize> {
    queue: PlaybackQueue<B, N>,
    cursor: Option<Cursor>,
    mode: PlaybackMode,
}

impl<B, const N: usize> StreamEngine<B, N>
where
    B: AsRef<[u8]>,
{
    /// Create an idle engine with an empty queue.
    pub const fn new(mode: PlaybackMode) -> Self {
        Self {
            queue: PlaybackQueue::new(),
            cursor: None,
            mode,
        }
    }

    /// Append a buffer. Returns the new queue depth.
    ///
    /// # Errors
    ///
    /// Hands `buffer` back if the queue is full.
    pub fn push(&mut self, buffer: B) -> Result<usize, B> {
        self.queue.push(buffer)?;
        Ok(self.queue.len())
    }

    /// Produce the next byte, or `None` when there is nothing to play.
    ///
    /// Returning `None` also resets the cursor to idle.
    pub fn advance(&mut self) -> Option<u8> {
        let mut cursor = match self.cursor {
            Some(cursor) => cursor,
            None if self.queue.is_empty() => return None,
            None => Cursor {
                entry: 0,
                offset: 0,
            },
        };

        // Every transition either lands on a non-empty buffer or removes one,
        // so len + 1 rounds always settle.
        for _ in 0..=self.queue.len() {
            let byte = self
                .queue
                .get(cursor.entry)
                .and_then(|buffer| buffer.as_ref().get(cursor.offset).copied());

            if let Some(byte) = byte {
                cursor.offset = cursor.offset.saturating_add(1);
                self.cursor = Some(cursor);
                return Some(byte);
            }

            match self.mode.next_entry(&mut self.queue, cursor.entry) {
                Some(entry) => cursor = Cursor { entry, offset: 0 },
                None => break,
            }
        }

        self.cursor = None;
        None
    }

    /// Drop every buffer and return to idle.
    pub fn clear(&mut self) {
        self.cursor = None;
        self.queue.clear();
    }

    /// Current policy.
    pub fn mode(&self) -> PlaybackMode {
        self.mode
    }

    /// Change policy. Takes effect at the next end-of-buffer.
    pub fn set_mode(&mut self, mode: PlaybackMode) {
        self.mode = mode;
    }

    /// Current read position; `None` while idle.
    pub fn cursor(&self) -> Option<Cursor> {
        self.cursor
    }

    /// Number of queued buffers.
    pub fn depth(&self) -> usize {
        self.queue.len()
    }
}
