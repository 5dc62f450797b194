//! HTTP transport: sends requests with reqwest.
//!
//! Requires the `http` feature.
//!
//! ## Example
//!
//! ```ignore
//! use managed_store::{ClientConfig, HttpTransport, RestRepository};
//!
//! let transport = HttpTransport::new(ClientConfig::new("http://localhost:5000/api"))?;
//! let users = RestRepository::<Student, _>::new(transport);
//! ```

use async_trait::async_trait;
use log::debug;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::{Method, Request, Response, Transport, TransportError};
use crate::config::ClientConfig;

/// reqwest-backed `Transport`. Cloning shares the connection pool.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a client with the configured timeout and default headers.
    pub fn new(config: ClientConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Io(format!("invalid header name {name}: {e}")))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Io(format!("invalid header value: {e}")))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(map_reqwest_error)?;

        Ok(Self::with_client(client, config.base_url))
    }

    /// Wrap an existing reqwest client.
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: Request) -> Result<Response, TransportError> {
        let url = self.url(&request.path);
        debug!("{} {}", request.method, url);

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Put => self.client.put(&url),
            Method::Delete => self.client.delete(&url),
        };
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        Ok(Response::new(status, body.to_vec()))
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Io(err.to_string())
    }
}
