//! Repository clients - CRUD for one model type against a remote collection.
//!
//! Every operation returns `Result<_, ClientError>`; ordinary failures
//! (unreachable endpoint, non-2xx status, malformed body) never panic, so
//! callers branch on the result. Clients hold no business state and never
//! retry.
//!
//! ## Example
//!
//! ```ignore
//! use managed_store::{InMemoryRepository, Repository};
//!
//! let repo = InMemoryRepository::with_items(vec![student]);
//! let all = repo.list().await?;
//! let created = repo.create(&new_student).await?;
//! repo.update(created.id(), &serde_json::json!({ "name": "Renamed" })).await?;
//! repo.delete(created.id()).await?;
//! ```

mod error;
mod in_memory;
mod rest;

use async_trait::async_trait;
use serde::Serialize;

use crate::model::Model;

pub use error::ClientError;
pub use in_memory::InMemoryRepository;
pub use rest::RestRepository;

/// CRUD capability for a single model type.
#[async_trait]
pub trait Repository<M: Model>: Send + Sync {
    /// Fetch the whole collection, in server order.
    async fn list(&self) -> Result<Vec<M>, ClientError>;

    /// Fetch one model by id.
    async fn get_by_id(&self, id: &str) -> Result<M, ClientError>;

    /// Create a model. The returned value is the server's version of it,
    /// which may carry a server-assigned id.
    async fn create(&self, model: &M) -> Result<M, ClientError>;

    /// Apply `changes` (a full model or any partial JSON-serializable value)
    /// to the model with `id`, returning the updated model.
    async fn update<P>(&self, id: &str, changes: &P) -> Result<M, ClientError>
    where
        P: Serialize + Sync + ?Sized;

    /// Delete a model by id.
    async fn delete(&self, id: &str) -> Result<(), ClientError>;
}
