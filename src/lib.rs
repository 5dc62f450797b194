//! managed_store - client-side CRUD collections with undo/redo.
//!
//! A [`Repository`] performs CRUD calls for one [`Model`] type, either over
//! a [`Transport`] ([`RestRepository`]) or in memory
//! ([`InMemoryRepository`]). A [`CollectionStore`] wraps a repository,
//! keeps the collection in memory, records every successful mutation into a
//! linear [`History`], and tracks pending local edits.

pub mod config;
mod model;
mod repository;
mod store;
mod transport;

pub use config::{ClientConfig, ConfigError, FetchFailurePolicy, StoreConfig};
pub use model::{matches_query, Model};
pub use repository::{ClientError, InMemoryRepository, Repository, RestRepository};
pub use store::{CollectionStore, History, PendingChanges, StoreError, StoreView};
pub use transport::{Method, Request, Response, Transport, TransportError};

#[cfg(feature = "http")]
pub use transport::HttpTransport;

// Re-exported so implementors of `Transport` and `Repository` need not
// depend on async-trait directly.
pub use async_trait::async_trait;
