//! RestRepository - a repository client that speaks the REST endpoint family
//! through any injected `Transport`.

use std::marker::PhantomData;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{ClientError, Repository};
use crate::model::Model;
use crate::transport::{Method, Request, Response, Transport};

/// Success body: `{ "data": <payload> }`.
#[derive(Deserialize)]
struct Envelope<T> {
    data: T,
}

/// Failure body: `{ "message": "..." }`.
#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Repository for `M` over transport `T`.
///
/// Requests go to `/{collection}` and `/{collection}/{id}`, where the
/// collection defaults to `M::COLLECTION`.
pub struct RestRepository<M, T> {
    transport: T,
    collection: String,
    _marker: PhantomData<fn() -> M>,
}

impl<M: Model, T: Transport> RestRepository<M, T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            collection: M::COLLECTION.to_string(),
            _marker: PhantomData,
        }
    }

    /// Use a different collection path segment than `M::COLLECTION`.
    pub fn with_collection(mut self, collection: impl Into<String>) -> Self {
        self.collection = collection.into().trim_matches('/').to_string();
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    fn collection_path(&self) -> String {
        format!("/{}", self.collection)
    }

    fn item_path(&self, id: &str) -> String {
        format!("/{}/{}", self.collection, encode_segment(id))
    }

    async fn call(&self, request: Request) -> Result<Response, ClientError> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(server_error(&response))
        }
    }

    async fn call_data<D: DeserializeOwned>(&self, request: Request) -> Result<D, ClientError> {
        let response = self.call(request).await?;
        decode_envelope(&response)
    }
}

#[async_trait]
impl<M: Model, T: Transport> Repository<M> for RestRepository<M, T> {
    async fn list(&self) -> Result<Vec<M>, ClientError> {
        self.call_data(Request::new(Method::Get, self.collection_path()))
            .await
    }

    async fn get_by_id(&self, id: &str) -> Result<M, ClientError> {
        self.call_data(Request::new(Method::Get, self.item_path(id)))
            .await
    }

    async fn create(&self, model: &M) -> Result<M, ClientError> {
        let body = encode_body(model)?;
        self.call_data(Request::new(Method::Post, self.collection_path()).with_body(body))
            .await
    }

    async fn update<P>(&self, id: &str, changes: &P) -> Result<M, ClientError>
    where
        P: Serialize + Sync + ?Sized,
    {
        let body = encode_body(changes)?;
        self.call_data(Request::new(Method::Put, self.item_path(id)).with_body(body))
            .await
    }

    async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.call(Request::new(Method::Delete, self.item_path(id)))
            .await?;
        Ok(())
    }
}

fn encode_body<P: Serialize + ?Sized>(value: &P) -> Result<Value, ClientError> {
    serde_json::to_value(value).map_err(|e| ClientError::Encode(e.to_string()))
}

fn decode_envelope<D: DeserializeOwned>(response: &Response) -> Result<D, ClientError> {
    serde_json::from_slice::<Envelope<D>>(&response.body)
        .map(|envelope| envelope.data)
        .map_err(|e| ClientError::Decode(e.to_string()))
}

/// Structured error from a non-2xx response: the JSON `message` if present,
/// else the raw body text, else a generic status line.
fn server_error(response: &Response) -> ClientError {
    let message = match serde_json::from_slice::<ErrorBody>(&response.body) {
        Ok(body) => body.message,
        Err(_) => {
            let text = String::from_utf8_lossy(&response.body).trim().to_string();
            if text.is_empty() {
                format!("request failed with status {}", response.status)
            } else {
                text
            }
        }
    };
    ClientError::server(response.status, message)
}

/// Percent-encode a path segment (RFC 3986 unreserved characters pass through).
fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{:02X}", byte)),
        }
    }
    out
}
