pub mod client;
pub mod middleware;

pub use client::ApiClient;
pub use middleware::{
    BearerAuth, ContentNegotiation, ErrorClassify, RequestLayer, ResponseLayer, SessionTeardown,
};
pub use reqwest::Method;

use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::Result;

/// What the caller expects back from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseKind {
    Json,
    Binary,
}

/// One outbound call: built per request, holds no state.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<serde_json::Value>,
    pub response_kind: ResponseKind,
}

impl RequestDescriptor {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
            response_kind: ResponseKind::Json,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::POST, path).with_body(body)
    }

    pub fn put<B: Serialize>(path: impl Into<String>, body: &B) -> Result<Self> {
        Self::new(Method::PUT, path).with_body(body)
    }

    pub fn with_body<B: Serialize>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn with_query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }

    /// Expect an opaque byte payload instead of JSON.
    pub fn binary(mut self) -> Self {
        self.response_kind = ResponseKind::Binary;
        self
    }
}

/// A request as it moves through the request pipeline.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub descriptor: RequestDescriptor,
    pub headers: HeaderMap,
    /// Session version seen when credentials were attached.
    pub session_version: u64,
}

impl OutgoingRequest {
    pub fn new(descriptor: RequestDescriptor) -> Self {
        Self {
            descriptor,
            headers: HeaderMap::new(),
            session_version: 0,
        }
    }
}

/// A fully buffered response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Header value if it is visible ASCII.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    /// Header value decoded as UTF-8, replacing invalid sequences. Servers
    /// put raw entity names into headers such as `content-disposition`.
    pub fn header_lossy(&self, name: &str) -> Option<String> {
        self.headers
            .get(name)
            .map(|v| String::from_utf8_lossy(v.as_bytes()).into_owned())
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.body
    }
}
