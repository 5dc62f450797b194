//! Models - the entity types a store manages.
//!
//! A model is an opaque record with a stable string id. The store never
//! looks inside it beyond `id()` and, for filtering, `display_name()`.
//!
//! ## Example
//!
//! ```ignore
//! use managed_store::Model;
//!
//! #[derive(Serialize, Deserialize, Clone)]
//! struct Student {
//!     pub id: String,
//!     pub name: String,
//! }
//!
//! impl Model for Student {
//!     const COLLECTION: &'static str = "users";
//!     fn id(&self) -> &str { &self.id }
//!     fn with_id(self, id: String) -> Self { Self { id, ..self } }
//!     fn display_name(&self) -> Option<&str> { Some(&self.name) }
//! }
//! ```

use serde::{de::DeserializeOwned, Serialize};

/// Trait for types that can be managed by a repository and a store.
pub trait Model: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The remote collection name for this model type (e.g., "users", "marks").
    /// Maps to the first path segment of the REST endpoint family.
    const COLLECTION: &'static str;

    /// Returns the unique identifier for this model instance.
    fn id(&self) -> &str;

    /// Returns this value carrying a different id. Used by backends that
    /// assign ids on create.
    fn with_id(self, id: String) -> Self;

    /// Human-readable name matched by `CollectionStore::filtered`.
    fn display_name(&self) -> Option<&str> {
        None
    }
}

/// Case-insensitive substring match of `query` against a model's display name.
///
/// An empty query matches everything, including models without a name.
pub fn matches_query<M: Model>(model: &M, query: &str) -> bool {
    if query.is_empty() {
        return true;
    }
    let needle = query.to_lowercase();
    model
        .display_name()
        .map(|name| name.to_lowercase().contains(&needle))
        .unwrap_or(false)
}
