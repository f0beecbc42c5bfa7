//! Snapshot-based undo/redo.
//!
//! Each checkpoint stores a full copy of the graph together with the floor
//! being viewed and the selection. Undo and redo move an index through the
//! stored entries; a checkpoint taken after an undo discards the redo branch.

use crate::constants::MAX_UNDO_HISTORY;
use crate::types::*;

/// One recorded editor state.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub graph: Graph,
    pub current_floor: FloorIndex,
    pub selection: Selection,
}

/// Linear undo/redo history.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<HistoryEntry>,
    /// Position of the entry matching the live state
    index: usize,
    max: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(MAX_UNDO_HISTORY)
    }
}

impl History {
    /// An empty history keeping at most `max` entries (at least one).
    pub fn new(max: usize) -> Self {
        Self {
            entries: Vec::new(),
            index: 0,
            max: max.max(1),
        }
    }

    /// Records `entry` as the newest state.
    ///
    /// Entries after the current index are discarded first. When the history
    /// is full the oldest entry is dropped.
    pub fn checkpoint(&mut self, entry: HistoryEntry) {
        if !self.entries.is_empty() && self.index + 1 < self.entries.len() {
            let dropped = self.entries.len() - self.index - 1;
            self.entries.truncate(self.index + 1);
            log::debug!("history: discarded {} redo entries", dropped);
        }

        self.entries.push(entry);
        if self.entries.len() > self.max {
            self.entries.remove(0);
        }
        self.index = self.entries.len() - 1;
    }

    /// Steps back one entry and returns the state to restore, or `None` at the oldest entry.
    pub fn undo(&mut self) -> Option<HistoryEntry> {
        if self.index == 0 || self.entries.is_empty() {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index).cloned()
    }

    /// Steps forward one entry and returns the state to restore, or `None` at the newest entry.
    pub fn redo(&mut self) -> Option<HistoryEntry> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index).cloned()
    }

    /// Clears the history and seeds it with `entry` as the only state.
    pub fn reset_to(&mut self, entry: HistoryEntry) {
        self.entries.clear();
        self.entries.push(entry);
        self.index = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entry matching the live state.
    pub fn current(&self) -> Option<&HistoryEntry> {
        self.entries.get(self.index)
    }
}
