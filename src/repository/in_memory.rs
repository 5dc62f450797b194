//! InMemoryRepository - Vec-backed repository for testing, demos and mock data.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use super::{ClientError, Repository};
use crate::model::Model;

/// In-memory repository that behaves like the remote collection: it keeps
/// insertion order, assigns sequential ids, and reports 404/409/422 the way
/// a server would.
///
/// Clone-friendly via Arc; clones share storage.
pub struct InMemoryRepository<M> {
    storage: Arc<RwLock<Vec<M>>>,
    seq: Arc<AtomicU64>,
}

impl<M> Clone for InMemoryRepository<M> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            seq: Arc::clone(&self.seq),
        }
    }
}

impl<M: Model> Default for InMemoryRepository<M> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M: Model> InMemoryRepository<M> {
    /// Create a new empty repository.
    pub fn new() -> Self {
        Self::with_items(Vec::new())
    }

    /// Create a repository seeded with `items`. Generated ids continue after
    /// the largest numeric id in the seed.
    pub fn with_items(items: Vec<M>) -> Self {
        let next = items
            .iter()
            .filter_map(|item| item.id().parse::<u64>().ok())
            .max()
            .map(|max| max + 1)
            .unwrap_or(1);
        Self {
            storage: Arc::new(RwLock::new(items)),
            seq: Arc::new(AtomicU64::new(next)),
        }
    }

    /// Copy of the stored items, in order.
    pub fn items(&self) -> Result<Vec<M>, ClientError> {
        let storage = self.storage.read().map_err(|_| poisoned("read"))?;
        Ok(storage.clone())
    }

    pub fn len(&self) -> usize {
        self.storage.read().map(|s| s.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn next_id(&self, storage: &[M]) -> String {
        loop {
            let candidate = self.seq.fetch_add(1, Ordering::Relaxed).to_string();
            if !storage.iter().any(|item| item.id() == candidate) {
                return candidate;
            }
        }
    }
}

#[async_trait]
impl<M: Model> Repository<M> for InMemoryRepository<M> {
    async fn list(&self) -> Result<Vec<M>, ClientError> {
        self.items()
    }

    async fn get_by_id(&self, id: &str) -> Result<M, ClientError> {
        let storage = self.storage.read().map_err(|_| poisoned("read"))?;
        storage
            .iter()
            .find(|item| item.id() == id)
            .cloned()
            .ok_or_else(|| ClientError::not_found(M::COLLECTION, id))
    }

    async fn create(&self, model: &M) -> Result<M, ClientError> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;

        let created = if model.id().is_empty() {
            let id = self.next_id(&storage);
            model.clone().with_id(id)
        } else if storage.iter().any(|item| item.id() == model.id()) {
            return Err(ClientError::server(
                409,
                format!("{} {} already exists", M::COLLECTION, model.id()),
            ));
        } else {
            model.clone()
        };

        storage.push(created.clone());
        Ok(created)
    }

    async fn update<P>(&self, id: &str, changes: &P) -> Result<M, ClientError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let patch = serde_json::to_value(changes).map_err(|e| ClientError::Encode(e.to_string()))?;
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;

        let slot = storage
            .iter_mut()
            .find(|item| item.id() == id)
            .ok_or_else(|| ClientError::not_found(M::COLLECTION, id))?;

        let mut merged = serde_json::to_value(&*slot)
            .map_err(|e| ClientError::server(500, format!("stored value unreadable: {e}")))?;
        merge_top_level(&mut merged, patch);

        let updated: M = serde_json::from_value::<M>(merged)
            .map_err(|e| ClientError::server(422, format!("invalid {}: {e}", M::COLLECTION)))?
            .with_id(id.to_string());

        *slot = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        let mut storage = self.storage.write().map_err(|_| poisoned("write"))?;
        let before = storage.len();
        storage.retain(|item| item.id() != id);
        if storage.len() == before {
            return Err(ClientError::not_found(M::COLLECTION, id));
        }
        Ok(())
    }
}

/// Object patches overwrite top-level keys; any other patch replaces the value.
fn merge_top_level(target: &mut Value, patch: Value) {
    match (target.as_object_mut(), patch) {
        (Some(fields), Value::Object(changes)) => {
            for (key, value) in changes {
                fields.insert(key, value);
            }
        }
        (_, other) => *target = other,
    }
}

fn poisoned(operation: &str) -> ClientError {
    ClientError::server(500, format!("repository lock poisoned during {operation}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
    struct TestModel {
        id: String,
        value: i32,
    }

    impl Model for TestModel {
        const COLLECTION: &'static str = "test_models";
        fn id(&self) -> &str {
            &self.id
        }
        fn with_id(self, id: String) -> Self {
            Self { id, ..self }
        }
    }

    fn model(id: &str, value: i32) -> TestModel {
        TestModel {
            id: id.into(),
            value,
        }
    }

    #[tokio::test]
    async fn create_and_get() {
        let repo = InMemoryRepository::new();
        let created = repo.create(&model("1", 42)).await.unwrap();
        assert_eq!(created, model("1", 42));

        let loaded = repo.get_by_id("1").await.unwrap();
        assert_eq!(loaded.value, 42);
    }

    #[tokio::test]
    async fn create_assigns_sequential_ids() {
        let repo = InMemoryRepository::with_items(vec![model("4", 0)]);
        let a = repo.create(&model("", 1)).await.unwrap();
        let b = repo.create(&model("", 2)).await.unwrap();
        assert_eq!(a.id, "5");
        assert_eq!(b.id, "6");
    }

    #[tokio::test]
    async fn create_rejects_duplicate_id() {
        let repo = InMemoryRepository::with_items(vec![model("1", 0)]);
        let err = repo.create(&model("1", 9)).await.unwrap_err();
        assert_eq!(err.status(), Some(409));
    }

    #[tokio::test]
    async fn list_keeps_insertion_order() {
        let repo = InMemoryRepository::new();
        for id in ["b", "a", "c"] {
            repo.create(&model(id, 0)).await.unwrap();
        }
        let ids: Vec<_> = repo.list().await.unwrap().into_iter().map(|m| m.id).collect();
        assert_eq!(ids, ["b", "a", "c"]);
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let repo = InMemoryRepository::<TestModel>::new();
        assert!(repo.get_by_id("missing").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn update_merges_partial_changes() {
        let repo = InMemoryRepository::with_items(vec![model("1", 1)]);
        let updated = repo.update("1", &json!({ "value": 7 })).await.unwrap();
        assert_eq!(updated, model("1", 7));
    }

    #[tokio::test]
    async fn update_keeps_stored_id() {
        let repo = InMemoryRepository::with_items(vec![model("1", 1)]);
        let updated = repo.update("1", &model("other", 3)).await.unwrap();
        assert_eq!(updated, model("1", 3));
        assert!(repo.get_by_id("other").await.is_err());
    }

    #[tokio::test]
    async fn update_rejects_invalid_result() {
        let repo = InMemoryRepository::with_items(vec![model("1", 1)]);
        let err = repo.update("1", &json!({ "value": "seven" })).await.unwrap_err();
        assert_eq!(err.status(), Some(422));
        assert_eq!(repo.get_by_id("1").await.unwrap(), model("1", 1));
    }

    #[tokio::test]
    async fn update_missing_is_not_found() {
        let repo = InMemoryRepository::<TestModel>::new();
        let err = repo.update("9", &json!({ "value": 1 })).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn delete_existing_and_missing() {
        let repo = InMemoryRepository::with_items(vec![model("1", 1), model("2", 2)]);
        repo.delete("1").await.unwrap();
        assert_eq!(repo.items().unwrap(), vec![model("2", 2)]);
        assert!(repo.delete("1").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn clone_shares_storage() {
        let repo = InMemoryRepository::new();
        let clone = repo.clone();
        repo.create(&model("1", 42)).await.unwrap();
        assert_eq!(clone.len(), 1);
        assert_eq!(clone.get_by_id("1").await.unwrap().value, 42);
    }
}
