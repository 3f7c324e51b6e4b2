//! Fixed-capacity FIFO of byte buffers awaiting playback.
//!
//! `PlaybackQueue<B, N>` holds up to `N` buffers in insertion order, which is
//! also playback order. It is not synchronised; the owning device serialises
//! access through its lock.
//!
//! # Constraints
//!
//! - `no_std`, backed by `heapless::Deque`, so the storage lives inline in
//!   the device (and therefore in a `static` on the target).
//! - Buffers are moved in and never copied or mutated. A buffer leaves the
//!   queue exactly once: through [`PlaybackQueue::pop_head`] or
//!   [`PlaybackQueue::clear`].

use heapless::Deque;

/// FIFO of owned byte buffers.
pub struct PlaybackQueue<B, const N: usize> {
    entries: Deque<B, N>,
}

impl<B, const N: usize> PlaybackQueue<B, N> {
    /// Create an empty queue.
    pub const fn new() -> Self {
        Self {
            entries: Deque::new(),
        }
    }

    /// Append `buffer` at the tail.
    ///
    /// # Errors
    ///
    /// Hands `buffer` back if the queue already holds `N` entries.
    pub fn push(&mut self, buffer: B) -> Result<(), B> {
        self.entries.push_back(buffer)
    }

    /// Remove and return the head entry.
    pub fn pop_head(&mut self) -> Option<B> {
        self.entries.pop_front()
    }

    /// Borrow the entry at `index` (0 = head).
    pub fn get(&self, index: usize) -> Option<&B> {
        let (front, back) = self.entries.as_slices();
        match index.checked_sub(front.len()) {
            None => front.get(index),
            Some(rest) => back.get(rest),
        }
    }

    /// Number of queued buffers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// `true` if nothing is queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every queued buffer.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl<B, const N: usize> Default for PlaybackQueue<B, N> {
    fn default() -> Self {
        Self::new()
    }
}
