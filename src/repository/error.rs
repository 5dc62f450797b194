use thiserror::Error;

use crate::transport::TransportError;

/// Every ordinary failure a repository client can report.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The request never completed (unreachable, timed out).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// The server answered with a non-2xx status.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },
    /// A 2xx body that does not match the expected envelope or payload.
    #[error("malformed response: {0}")]
    Decode(String),
    /// The request body could not be serialized.
    #[error("request encoding failed: {0}")]
    Encode(String),
}

impl ClientError {
    pub fn server(status: u16, message: impl Into<String>) -> Self {
        ClientError::Server {
            status,
            message: message.into(),
        }
    }

    pub fn not_found(collection: &str, id: &str) -> Self {
        Self::server(404, format!("{collection} {id} not found"))
    }

    /// HTTP-style status, if the server produced one.
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }
}
