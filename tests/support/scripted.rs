//! A repository double over `InMemoryRepository` that can be told to fail
//! or to hold calls until released.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use managed_store::{async_trait, ClientError, InMemoryRepository, Model, Repository};
use serde::Serialize;
use tokio::sync::oneshot;

pub struct ScriptedRepository<M> {
    inner: InMemoryRepository<M>,
    failure: Mutex<Option<ClientError>>,
    failing_ids: Mutex<HashMap<String, ClientError>>,
    gates: Mutex<VecDeque<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl<M: Model> ScriptedRepository<M> {
    pub fn new(inner: InMemoryRepository<M>) -> Self {
        Self {
            inner,
            failure: Mutex::new(None),
            failing_ids: Mutex::new(HashMap::new()),
            gates: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn with_items(items: Vec<M>) -> Self {
        Self::new(InMemoryRepository::with_items(items))
    }

    pub fn inner(&self) -> &InMemoryRepository<M> {
        &self.inner
    }

    /// Every call fails with `err` until `recover`.
    pub fn fail_with(&self, err: ClientError) {
        *self.failure.lock().unwrap() = Some(err);
    }

    /// Calls targeting `id` fail with `err`.
    pub fn fail_id(&self, id: &str, err: ClientError) {
        self.failing_ids.lock().unwrap().insert(id.to_string(), err);
    }

    pub fn recover(&self) {
        *self.failure.lock().unwrap() = None;
        self.failing_ids.lock().unwrap().clear();
    }

    /// The next call waits until the returned sender fires (or is dropped).
    pub fn gate(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.gates.lock().unwrap().push_back(rx);
        tx
    }

    /// Calls seen so far, as `"op"` or `"op:id"`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    async fn before(&self, op: &str, id: Option<&str>) -> Result<(), ClientError> {
        self.calls.lock().unwrap().push(match id {
            Some(id) => format!("{op}:{id}"),
            None => op.to_string(),
        });

        let gate = self.gates.lock().unwrap().pop_front();
        if let Some(gate) = gate {
            let _ = gate.await;
        }

        if let Some(err) = self.failure.lock().unwrap().clone() {
            return Err(err);
        }
        if let Some(id) = id {
            if let Some(err) = self.failing_ids.lock().unwrap().get(id).cloned() {
                return Err(err);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<M: Model> Repository<M> for ScriptedRepository<M> {
    async fn list(&self) -> Result<Vec<M>, ClientError> {
        self.before("list", None).await?;
        self.inner.list().await
    }

    async fn get_by_id(&self, id: &str) -> Result<M, ClientError> {
        self.before("get", Some(id)).await?;
        self.inner.get_by_id(id).await
    }

    async fn create(&self, model: &M) -> Result<M, ClientError> {
        self.before("create", Some(model.id())).await?;
        self.inner.create(model).await
    }

    async fn update<P>(&self, id: &str, changes: &P) -> Result<M, ClientError>
    where
        P: Serialize + Sync + ?Sized,
    {
        self.before("update", Some(id)).await?;
        self.inner.update(id, changes).await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.before("delete", Some(id)).await?;
        self.inner.delete(id).await
    }
}
