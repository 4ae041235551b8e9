//! Ordered playback queue.
//!
//! Synthesis results arrive in completion order. The queue buffers them by
//! sentence index and releases them strictly in index order: index *i* is
//! held back until every index below it has been released or skipped. A
//! failed sentence marks its index skipped so later sentences are not stalled
//! behind it.
//!
//! The queue is a plain data structure. It is owned by the turn's single
//! coordination loop in [`session`](crate::session), which both pushes
//! arrivals and pulls releases, so it needs no locking.

use std::collections::BTreeMap;

use crate::error::SynthesisFailure;
use crate::synthesis::{AudioUnit, SynthesisResult};

/// What the consumer should do next.
#[derive(Debug)]
pub enum Release {
    /// The next sentence in order is ready to play.
    Ready(AudioUnit),

    /// The next sentence permanently failed; move past it.
    Skipped(SynthesisFailure),

    /// The next sentence has not arrived yet; wait for another push.
    Pending,

    /// Every index has been released or skipped.
    Drained,
}

#[derive(Debug)]
enum Slot {
    Ready(AudioUnit),
    Skipped(SynthesisFailure),
}

/// Reorders synthesis results into sentence order for one turn.
#[derive(Debug)]
pub struct PlaybackQueue {
    total: usize,
    next: usize,
    slots: BTreeMap<usize, Slot>,
}

impl PlaybackQueue {
    /// A queue expecting indices `0..total`.
    #[must_use]
    pub const fn new(total: usize) -> Self {
        Self {
            total,
            next: 0,
            slots: BTreeMap::new(),
        }
    }

    /// Accept a result in whatever order it finished.
    ///
    /// Results for indices already released, outside the turn, or already
    /// buffered are ignored.
    pub fn push(&mut self, result: SynthesisResult) {
        let (index, slot) = match result {
            Ok(unit) => (unit.index, Slot::Ready(unit)),
            Err(failure) => (failure.index, Slot::Skipped(failure)),
        };

        if index < self.next || index >= self.total || self.slots.contains_key(&index) {
            tracing::warn!(
                index,
                next = self.next,
                total = self.total,
                "Ignoring unexpected synthesis result"
            );
            return;
        }

        tracing::debug!(
            index,
            next = self.next,
            buffered = self.slots.len(),
            "Playback queue: result buffered"
        );
        self.slots.insert(index, slot);
    }

    /// Release the next item in index order, if it is available.
    pub fn next_ready(&mut self) -> Release {
        if self.next >= self.total {
            return Release::Drained;
        }

        match self.slots.remove(&self.next) {
            Some(Slot::Ready(unit)) => {
                self.next += 1;
                Release::Ready(unit)
            }
            Some(Slot::Skipped(failure)) => {
                self.next += 1;
                Release::Skipped(failure)
            }
            None => Release::Pending,
        }
    }

    /// Give up on every index that has not arrived yet.
    ///
    /// Used when the producer side has gone away; afterwards the queue drains
    /// through whatever is already buffered.
    pub fn abandon_missing(&mut self) {
        for index in self.next..self.total {
            self.slots.entry(index).or_insert_with(|| {
                Slot::Skipped(SynthesisFailure {
                    index,
                    text: String::new(),
                    error: crate::error::VoiceError::Cancelled,
                })
            });
        }
    }

    /// Whether every index has been released or skipped.
    #[must_use]
    pub const fn is_drained(&self) -> bool {
        self.next >= self.total
    }

    /// Number of sentences this turn expects.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.total
    }

    /// Index the consumer is waiting for.
    #[must_use]
    pub const fn next_index(&self) -> usize {
        self.next
    }

    /// Results buffered ahead of the consumer.
    #[must_use]
    pub fn buffered(&self) -> usize {
        self.slots.len()
    }
}
