//! Linear undo/redo history of snapshots.

use std::collections::VecDeque;

/// Ordered snapshots plus a cursor at the active one.
///
/// # Invariants
/// - `cursor < len` whenever the history is non-empty.
/// - Recording truncates every snapshot after the cursor, so there is never
///   more than one timeline.
/// - With a limit, recording past capacity evicts the oldest snapshot and the
///   cursor shifts down with it.
#[derive(Debug, Clone)]
pub struct History<T> {
    snapshots: VecDeque<T>,
    cursor: usize,
    limit: Option<usize>,
}

impl<T> Default for History<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> History<T> {
    /// Unbounded, empty history.
    pub fn new() -> Self {
        Self {
            snapshots: VecDeque::new(),
            cursor: 0,
            limit: None,
        }
    }

    /// Empty history keeping at most `limit` snapshots (at least one).
    pub fn with_limit(limit: usize) -> Self {
        Self {
            limit: Some(limit.max(1)),
            ..Self::new()
        }
    }

    pub fn limit(&self) -> Option<usize> {
        self.limit
    }

    /// Drop any redoable snapshots, append `snapshot`, and make it active.
    pub fn record(&mut self, snapshot: T) {
        if !self.snapshots.is_empty() {
            self.snapshots.truncate(self.cursor + 1);
        }
        self.snapshots.push_back(snapshot);

        if let Some(limit) = self.limit {
            while self.snapshots.len() > limit {
                self.snapshots.pop_front();
            }
        }
        self.cursor = self.snapshots.len() - 1;
    }

    /// Step back one snapshot. `None` at the oldest snapshot or when empty.
    pub fn undo(&mut self) -> Option<&T> {
        if !self.can_undo() {
            return None;
        }
        self.cursor -= 1;
        self.snapshots.get(self.cursor)
    }

    /// Step forward one snapshot. `None` at the newest snapshot or when empty.
    pub fn redo(&mut self) -> Option<&T> {
        if !self.can_redo() {
            return None;
        }
        self.cursor += 1;
        self.snapshots.get(self.cursor)
    }

    pub fn can_undo(&self) -> bool {
        !self.snapshots.is_empty() && self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor + 1 < self.snapshots.len()
    }

    /// The active snapshot.
    pub fn current(&self) -> Option<&T> {
        self.snapshots.get(self.cursor)
    }

    /// Cursor position, `None` while empty.
    pub fn index(&self) -> Option<usize> {
        (!self.snapshots.is_empty()).then_some(self.cursor)
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.snapshots.get(index)
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn clear(&mut self) {
        self.snapshots.clear();
        self.cursor = 0;
    }
}
