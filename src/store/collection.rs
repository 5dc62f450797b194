//! CollectionStore - an in-memory list of models mirrored into undo/redo
//! history, with pending-edit tracking.
//!
//! # Invariants
//! - After every action the active history snapshot equals the collection.
//! - Snapshots are recorded only after a successful mutation or a fetch;
//!   `undo`/`redo` only move the cursor.
//! - Every pending edit belongs to an id present in the collection.
//! - The state lock is never held across a repository call, so actions can
//!   be in flight concurrently; the last to resolve wins.

use std::sync::{Mutex, MutexGuard, PoisonError};

use log::{debug, error, warn};
use tokio::sync::watch;

use super::{History, PendingChanges, StoreError};
use crate::config::{FetchFailurePolicy, StoreConfig};
use crate::model::{matches_query, Model};
use crate::repository::{ClientError, Repository};

/// Everything the view layer reads, copied out at one instant.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreView<M> {
    pub collection: Vec<M>,
    pub is_loading: bool,
    pub can_undo: bool,
    pub can_redo: bool,
    pub has_changes: bool,
    pub history_index: Option<usize>,
    pub history_len: usize,
}

impl<M> Default for StoreView<M> {
    fn default() -> Self {
        Self {
            collection: Vec::new(),
            is_loading: false,
            can_undo: false,
            can_redo: false,
            has_changes: false,
            history_index: None,
            history_len: 0,
        }
    }
}

struct State<M> {
    collection: Vec<M>,
    history: History<Vec<M>>,
    pending: PendingChanges<M>,
    loading: usize,
}

impl<M: Model> State<M> {
    fn view(&self) -> StoreView<M> {
        StoreView {
            collection: self.collection.clone(),
            is_loading: self.loading > 0,
            can_undo: self.history.can_undo(),
            can_redo: self.history.can_redo(),
            has_changes: !self.pending.is_empty(),
            history_index: self.history.index(),
            history_len: self.history.len(),
        }
    }

    /// Snapshot the collection into history and drop stale pending edits.
    fn record(&mut self) {
        self.history.record(self.collection.clone());
        self.pending.retain_present(&self.collection);
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.collection.iter().position(|model| model.id() == id)
    }

    /// Replace the element with the same id, or append it.
    fn upsert(&mut self, model: M) {
        match self.position(model.id()) {
            Some(index) => self.collection[index] = model,
            None => self.collection.push(model),
        }
    }
}

/// Managed collection of `M` backed by repository `R`.
///
/// Construct one per session and share it by reference or `Arc`; every
/// action takes `&self`.
pub struct CollectionStore<M, R> {
    repo: R,
    config: StoreConfig,
    state: Mutex<State<M>>,
    changes: watch::Sender<StoreView<M>>,
}

/// Keeps `is_loading` raised until dropped, on every exit path.
struct LoadingGuard<'a, M: Model, R> {
    store: &'a CollectionStore<M, R>,
}

impl<M: Model, R> Drop for LoadingGuard<'_, M, R> {
    fn drop(&mut self) {
        let mut state = self.store.lock();
        state.loading = state.loading.saturating_sub(1);
        self.store.publish(&state);
    }
}

impl<M: Model, R> CollectionStore<M, R> {
    fn lock(&self) -> MutexGuard<'_, State<M>> {
        // State is only mutated in short non-panicking sections.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, state: &State<M>) {
        self.changes.send_replace(state.view());
    }

    fn begin_loading(&self) -> LoadingGuard<'_, M, R> {
        let mut state = self.lock();
        state.loading += 1;
        self.publish(&state);
        LoadingGuard { store: self }
    }

    /// Run `mutation` on the state; on success record a snapshot and publish.
    /// A failing mutation must leave the state untouched.
    fn apply<F>(&self, mutation: F) -> Result<(), StoreError>
    where
        F: FnOnce(&mut State<M>) -> Result<(), StoreError>,
    {
        let mut state = self.lock();
        mutation(&mut state)?;
        state.record();
        self.publish(&state);
        Ok(())
    }

    fn replace_and_record(&self, collection: Vec<M>) {
        let mut state = self.lock();
        state.collection = collection;
        state.record();
        self.publish(&state);
    }

    /// Move through history with `step`, copying the new active snapshot into
    /// the collection. Returns whether the cursor moved.
    fn travel<F>(&self, step: F) -> bool
    where
        F: FnOnce(&mut History<Vec<M>>) -> Option<&Vec<M>>,
    {
        let mut guard = self.lock();
        let state = &mut *guard;
        let Some(snapshot) = step(&mut state.history) else {
            return false;
        };
        state.collection = snapshot.clone();
        state.pending.retain_present(&state.collection);
        debug!(
            "{} history moved to {:?}",
            M::COLLECTION,
            state.history.index()
        );
        self.publish(state);
        true
    }
}

impl<M: Model, R: Repository<M>> CollectionStore<M, R> {
    pub fn new(repo: R) -> Self {
        Self::with_config(repo, StoreConfig::default())
    }

    pub fn with_config(repo: R, config: StoreConfig) -> Self {
        let history = match config.effective_history_limit() {
            Some(limit) => History::with_limit(limit),
            None => History::new(),
        };
        let state = State {
            collection: Vec::new(),
            history,
            pending: PendingChanges::new(),
            loading: 0,
        };
        let (changes, _) = watch::channel(state.view());
        Self {
            repo,
            config,
            state: Mutex::new(state),
            changes,
        }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Replace the collection with the server's list and record a snapshot.
    ///
    /// On failure the error is logged and the state settles per
    /// `FetchFailurePolicy` before the error is returned; callers that only
    /// render state may ignore it.
    pub async fn fetch_all(&self) -> Result<(), ClientError> {
        let _loading = self.begin_loading();

        match self.repo.list().await {
            Ok(items) => {
                debug!("fetched {} {}", items.len(), M::COLLECTION);
                self.replace_and_record(items);
                Ok(())
            }
            Err(err) => {
                warn!("failed to fetch {}: {}", M::COLLECTION, err);
                match self.config.fetch_failure {
                    FetchFailurePolicy::RecordEmpty => self.replace_and_record(Vec::new()),
                    FetchFailurePolicy::KeepHistory => {}
                }
                Err(err)
            }
        }
    }

    /// Create `model` remotely and append the server's version of it.
    pub async fn create(&self, model: &M) -> Result<M, StoreError> {
        let created = self.repo.create(model).await.map_err(|err| {
            error!("failed to create {}: {}", M::COLLECTION, err);
            err
        })?;

        self.apply(|state| {
            state.upsert(created.clone());
            Ok(())
        })?;
        debug!("created {} {}", M::COLLECTION, created.id());
        Ok(created)
    }

    /// Send the full value of `model` and replace the element with its id.
    ///
    /// If the server accepts the update but the id is no longer in the local
    /// collection, nothing changes locally and `StoreError::Consistency` is
    /// returned.
    pub async fn update(&self, model: &M) -> Result<M, StoreError> {
        let id = model.id().to_string();
        let updated = self.repo.update(&id, model).await.map_err(|err| {
            error!("failed to update {} {}: {}", M::COLLECTION, id, err);
            err
        })?;

        self.apply(|state| {
            let index = state
                .position(&id)
                .ok_or_else(|| StoreError::consistency(M::COLLECTION, id.as_str()))?;
            state.collection[index] = updated.clone();
            state.pending.discard(&id);
            Ok(())
        })
        .map_err(|err| {
            warn!("{}", err);
            err
        })?;
        debug!("updated {} {}", M::COLLECTION, id);
        Ok(updated)
    }

    /// Delete `id` remotely and remove it from the collection.
    pub async fn delete(&self, id: &str) -> Result<(), StoreError> {
        self.repo.delete(id).await.map_err(|err| {
            error!("failed to delete {} {}: {}", M::COLLECTION, id, err);
            err
        })?;

        self.apply(|state| {
            let index = state
                .position(id)
                .ok_or_else(|| StoreError::consistency(M::COLLECTION, id))?;
            state.collection.remove(index);
            Ok(())
        })
        .map_err(|err| {
            warn!("{}", err);
            err
        })?;
        debug!("deleted {} {}", M::COLLECTION, id);
        Ok(())
    }

    /// Record a local, unsaved edit. The collection itself is not changed.
    pub fn stage_edit(&self, model: M) -> Result<(), StoreError> {
        let mut state = self.lock();
        if state.position(model.id()).is_none() {
            return Err(StoreError::consistency(M::COLLECTION, model.id()));
        }
        state.pending.stage(model);
        self.publish(&state);
        Ok(())
    }

    /// Forget the pending edit for `id`, returning it.
    pub fn discard_edit(&self, id: &str) -> Option<M> {
        let mut state = self.lock();
        let discarded = state.pending.discard(id);
        if discarded.is_some() {
            self.publish(&state);
        }
        discarded
    }

    pub fn pending(&self, id: &str) -> Option<M> {
        self.lock().pending.get(id).cloned()
    }

    /// All pending edits, in id order.
    pub fn pending_changes(&self) -> Vec<M> {
        self.lock().pending.values().cloned().collect()
    }

    /// Persist every pending edit through `update`, in id order.
    ///
    /// Saved edits are applied to the collection and recorded as a single
    /// snapshot. The first failure stops the batch: that edit and the ones
    /// after it stay pending and the error is returned. An edit staged while
    /// the batch is in flight stays pending, even for an id that was saved.
    /// Returns the number of edits saved.
    pub async fn save_all_changes(&self) -> Result<usize, StoreError> {
        let _loading = self.begin_loading();
        let edits = self.lock().pending.staged();

        let mut saved = Vec::with_capacity(edits.len());
        let mut failure = None;
        for (revision, edit) in &edits {
            match self.repo.update(edit.id(), edit).await {
                Ok(updated) => saved.push((*revision, updated)),
                Err(err) => {
                    error!("failed to save {} {}: {}", M::COLLECTION, edit.id(), err);
                    failure = Some(err);
                    break;
                }
            }
        }

        let count = saved.len();
        {
            let mut state = self.lock();
            let mut applied = false;
            for (revision, updated) in saved {
                let id = updated.id().to_string();
                state.pending.discard_revision(&id, revision);
                match state.position(&id) {
                    Some(index) => {
                        state.collection[index] = updated;
                        applied = true;
                    }
                    None => warn!("{}", StoreError::consistency(M::COLLECTION, id)),
                }
            }
            if applied {
                state.record();
            }
            self.publish(&state);
        }

        match failure {
            Some(err) => Err(err.into()),
            None => {
                debug!("saved {} pending {}", count, M::COLLECTION);
                Ok(count)
            }
        }
    }

    /// Drop every pending edit and reload from the server. Fetch failures
    /// are logged by `fetch_all` and otherwise ignored.
    pub async fn cancel_all_changes(&self) {
        {
            let mut state = self.lock();
            state.pending.clear();
            self.publish(&state);
        }
        if self.fetch_all().await.is_err() {
            debug!("reload after cancel failed for {}", M::COLLECTION);
        }
    }

    /// Step back to the previous snapshot. No-op at the oldest one.
    pub fn undo(&self) -> bool {
        self.travel(History::undo)
    }

    /// Step forward to the next snapshot. No-op at the newest one.
    pub fn redo(&self) -> bool {
        self.travel(History::redo)
    }

    /// Elements whose display name contains `query`, ignoring case. An empty
    /// query returns the whole collection.
    pub fn filtered(&self, query: &str) -> Vec<M> {
        let state = self.lock();
        state
            .collection
            .iter()
            .filter(|model| matches_query(*model, query))
            .cloned()
            .collect()
    }

    pub fn collection(&self) -> Vec<M> {
        self.lock().collection.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.lock().loading > 0
    }

    pub fn can_undo(&self) -> bool {
        self.lock().history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.lock().history.can_redo()
    }

    pub fn has_changes(&self) -> bool {
        !self.lock().pending.is_empty()
    }

    pub fn history_index(&self) -> Option<usize> {
        self.lock().history.index()
    }

    pub fn history_len(&self) -> usize {
        self.lock().history.len()
    }

    /// Snapshot at `index` in history.
    pub fn history_entry(&self, index: usize) -> Option<Vec<M>> {
        self.lock().history.get(index).cloned()
    }

    pub fn view(&self) -> StoreView<M> {
        self.lock().view()
    }

    /// Receiver that sees a fresh `StoreView` after every state change.
    pub fn subscribe(&self) -> watch::Receiver<StoreView<M>> {
        self.changes.subscribe()
    }
}
