//! Deferred style snapshots.
//!
//! One pending slot per block. Scheduling while a slot is armed leaves the
//! original deadline in place, so an edit burst fires once, at the first
//! edit's deadline; edits after that open a new slot.

use std::time::Duration;

use crate::model::BlockId;

#[derive(Debug, Clone)]
pub struct Debouncer {
    delay: Duration,
    now: Duration,
    pending: Vec<(BlockId, Duration)>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            now: Duration::ZERO,
            pending: Vec::new(),
        }
    }

    /// Arm the slot for `block`. Returns false if it was already armed.
    pub fn schedule(&mut self, block: &BlockId) -> bool {
        if self.is_pending(block) {
            return false;
        }
        self.pending.push((block.clone(), self.now + self.delay));
        true
    }

    pub fn is_pending(&self, block: &BlockId) -> bool {
        self.pending.iter().any(|(id, _)| id == block)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Disarm every slot without firing it.
    pub fn clear(&mut self) {
        self.pending.clear();
    }

    /// Move the clock forward and return the slots that came due, in the
    /// order they were armed.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<BlockId> {
        self.now += elapsed;
        let now = self.now;
        let (due, waiting): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pending).into_iter().partition(|(_, at)| *at <= now);
        self.pending = waiting;
        due.into_iter().map(|(id, _)| id).collect()
    }
}
