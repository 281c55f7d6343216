//! Remote gateway
//!
//! Turns a logical operation (method + resource path + optional JSON body)
//! into a call against the notebook service. Failures come back as a
//! classified [`RemoteError`]; success bodies come back as raw JSON and are
//! decoded by the typed helpers here.

pub mod http;

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorKind, RemoteError, RemoteResult};

pub use http::HttpGateway;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request/response seam between the cache and the network.
///
/// `body: None` means the request carries no content at all, not an empty
/// object. An empty success body is reported as `Value::Null`. Session
/// credentials are the implementation's concern.
pub trait Gateway: Send + Sync {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = RemoteResult<Value>> + Send;
}

impl<G: Gateway> Gateway for Arc<G> {
    fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> impl Future<Output = RemoteResult<Value>> + Send {
        (**self).request(method, path, body)
    }
}

pub fn encode<B: Serialize + ?Sized>(body: &B) -> RemoteResult<Value> {
    serde_json::to_value(body).map_err(|e| {
        RemoteError::local(
            ErrorKind::InternalError,
            format!("failed to encode request body: {e}"),
        )
    })
}

pub fn decode<T: DeserializeOwned>(value: Value) -> RemoteResult<T> {
    serde_json::from_value(value).map_err(|e| {
        RemoteError::local(ErrorKind::Unknown, format!("unexpected response shape: {e}"))
    })
}

pub async fn get<G, T>(gateway: &G, path: &str) -> RemoteResult<T>
where
    G: Gateway,
    T: DeserializeOwned,
{
    decode(gateway.request(Method::Get, path, None).await?)
}

pub async fn send<G, B, T>(gateway: &G, method: Method, path: &str, body: &B) -> RemoteResult<T>
where
    G: Gateway,
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let body = encode(body)?;
    decode(gateway.request(method, path, Some(body)).await?)
}

/// Fire a request whose response body is irrelevant.
pub async fn execute<G: Gateway>(
    gateway: &G,
    method: Method,
    path: &str,
    body: Option<Value>,
) -> RemoteResult<()> {
    gateway.request(method, path, body).await.map(|_| ())
}
