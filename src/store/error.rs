use thiserror::Error;

use crate::repository::ClientError;

/// Error type for store actions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The repository call failed; the store was not mutated.
    #[error(transparent)]
    Client(#[from] ClientError),
    /// The target id is not in the local collection. For `update` and
    /// `delete` the server has already accepted the call.
    #[error("{collection} {id} is not in the local collection")]
    Consistency {
        collection: &'static str,
        id: String,
    },
}

impl StoreError {
    pub fn consistency(collection: &'static str, id: impl Into<String>) -> Self {
        StoreError::Consistency {
            collection,
            id: id.into(),
        }
    }

    pub fn client(&self) -> Option<&ClientError> {
        match self {
            StoreError::Client(err) => Some(err),
            StoreError::Consistency { .. } => None,
        }
    }
}
