//! Managed collection store - an in-memory list with linear undo/redo
//! history and pending edits, kept in step with a repository.
//!
//! ## Example
//!
//! ```ignore
//! use managed_store::{CollectionStore, InMemoryRepository};
//!
//! let store = CollectionStore::new(InMemoryRepository::with_items(seed));
//! store.fetch_all().await?;
//! store.create(&student).await?;
//! store.undo();   // back to the fetched list
//! store.redo();   // student is back
//!
//! let mut changes = store.subscribe();
//! changes.changed().await?;
//! render(&*changes.borrow());
//! ```

mod collection;
mod error;
mod history;
mod pending;

pub use collection::{CollectionStore, StoreView};
pub use error::StoreError;
pub use history::History;
pub use pending::PendingChanges;
