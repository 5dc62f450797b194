//! Locally edited, not-yet-persisted values keyed by id.

use std::collections::BTreeMap;

use crate::model::Model;

/// Pending edits, iterated in id order.
///
/// Every staged value carries a revision that grows with each `stage`, so a
/// caller holding an earlier copy can tell whether the edit was replaced.
#[derive(Debug, Clone)]
pub struct PendingChanges<M> {
    edits: BTreeMap<String, (u64, M)>,
    next_revision: u64,
}

impl<M> Default for PendingChanges<M> {
    fn default() -> Self {
        Self {
            edits: BTreeMap::new(),
            next_revision: 0,
        }
    }
}

impl<M: Model> PendingChanges<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `model` as the edit for its id, replacing any earlier edit.
    /// Returns the replaced edit.
    pub fn stage(&mut self, model: M) -> Option<M> {
        self.next_revision += 1;
        self.edits
            .insert(model.id().to_string(), (self.next_revision, model))
            .map(|(_, previous)| previous)
    }

    pub fn discard(&mut self, id: &str) -> Option<M> {
        self.edits.remove(id).map(|(_, model)| model)
    }

    /// Discard the edit for `id` only if it is still at `revision`.
    pub fn discard_revision(&mut self, id: &str, revision: u64) -> bool {
        match self.edits.get(id) {
            Some((current, _)) if *current == revision => {
                self.edits.remove(id);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: &str) -> Option<&M> {
        self.edits.get(id).map(|(_, model)| model)
    }

    pub fn revision(&self, id: &str) -> Option<u64> {
        self.edits.get(id).map(|(revision, _)| *revision)
    }

    /// Copies of every edit with its revision, in id order.
    pub fn staged(&self) -> Vec<(u64, M)> {
        self.edits.values().cloned().collect()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.edits.contains_key(id)
    }

    pub fn values(&self) -> impl Iterator<Item = &M> {
        self.edits.values().map(|(_, model)| model)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.edits.keys().map(String::as_str)
    }

    /// Keep only edits for ids in `collection`.
    pub fn retain_present(&mut self, collection: &[M]) {
        self.edits
            .retain(|id, _| collection.iter().any(|model| model.id() == id));
    }

    pub fn clear(&mut self) {
        self.edits.clear();
    }

    pub fn len(&self) -> usize {
        self.edits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }
}
