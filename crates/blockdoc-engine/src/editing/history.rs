//! # History Manager
//!
//! Bounded undo/redo over full-document markup snapshots.
//!
//! ```text
//!  save_state(s)   undo ─▶ [.., s]   ─pop─▶ returned
//!                          redo ◀─push─ current
//! ```
//!
//! Pushing a new undo entry clears redo. When a stack is full the oldest
//! entry is evicted.

use std::collections::VecDeque;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryDirection {
    Undo,
    Redo,
}

#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<String>,
    redo: VecDeque<String>,
    capacity: usize,
}

impl History {
    pub fn new(capacity: usize) -> Self {
        Self {
            undo: VecDeque::new(),
            redo: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    /// Push a snapshot. Returns false when it equals the top of the undo stack.
    pub fn save_state(&mut self, snapshot: String) -> bool {
        if self.undo.back() == Some(&snapshot) {
            return false;
        }
        push_bounded(&mut self.undo, snapshot, self.capacity);
        self.redo.clear();
        true
    }

    /// Pop the state to restore. An entry equal to `current` is a leftover
    /// of the state being left and is skipped.
    pub fn undo(&mut self, current: &str) -> Option<String> {
        let mut entry = self.undo.pop_back()?;
        if entry == current {
            match self.undo.pop_back() {
                Some(next) => entry = next,
                None => {
                    self.undo.push_back(entry);
                    return None;
                }
            }
        }
        push_bounded(&mut self.redo, current.to_string(), self.capacity);
        Some(entry)
    }

    pub fn redo(&mut self, current: &str) -> Option<String> {
        let entry = self.redo.pop_back()?;
        push_bounded(&mut self.undo, current.to_string(), self.capacity);
        Some(entry)
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    #[cfg(test)]
    pub(crate) fn undo_entries(&self) -> Vec<&str> {
        self.undo.iter().map(String::as_str).collect()
    }
}

fn push_bounded(stack: &mut VecDeque<String>, entry: String, capacity: usize) {
    if stack.len() == capacity {
        stack.pop_front();
    }
    stack.push_back(entry);
}
