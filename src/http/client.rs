use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::error::Result;
use crate::navigation::Navigator;
use crate::session::SessionStore;

use super::middleware::{
    BearerAuth, ContentNegotiation, ErrorClassify, RequestLayer, ResponseLayer, SessionTeardown,
};
use super::{ApiResponse, OutgoingRequest, RequestDescriptor};

/// Authenticated client for the test management API.
///
/// Requests pass through the request layers in order (bearer auth, then
/// content negotiation), are sent, and the buffered response passes through
/// the response layers in order (session teardown, then error
/// classification).
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    session: Arc<SessionStore>,
    request_layers: Vec<Arc<dyn RequestLayer>>,
    response_layers: Vec<Arc<dyn ResponseLayer>>,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        let request_layers: Vec<Arc<dyn RequestLayer>> = vec![
            Arc::new(BearerAuth::new(session.clone())),
            Arc::new(ContentNegotiation),
        ];
        let response_layers: Vec<Arc<dyn ResponseLayer>> = vec![
            Arc::new(SessionTeardown::new(session.clone(), navigator)),
            Arc::new(ErrorClassify),
        ];

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            session,
            request_layers,
            response_layers,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    /// Append a stage after the built-in request layers.
    pub fn push_request_layer(&mut self, layer: Arc<dyn RequestLayer>) {
        self.request_layers.push(layer);
    }

    /// Insert a stage ahead of error classification, so it still sees
    /// failed responses.
    pub fn push_response_layer(&mut self, layer: Arc<dyn ResponseLayer>) {
        let at = self.response_layers.len().saturating_sub(1);
        self.response_layers.insert(at, layer);
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request through the pipeline.
    pub async fn request(&self, descriptor: RequestDescriptor) -> Result<ApiResponse> {
        let mut outgoing = OutgoingRequest::new(descriptor);
        for layer in &self.request_layers {
            outgoing = layer.on_request(outgoing)?;
        }

        let url = self.url(&outgoing.descriptor.path);
        tracing::debug!(method = %outgoing.descriptor.method, %url, "sending request");

        let mut builder = self
            .http
            .request(outgoing.descriptor.method.clone(), &url)
            .headers(outgoing.headers.clone());
        if !outgoing.descriptor.query.is_empty() {
            builder = builder.query(&outgoing.descriptor.query);
        }
        if let Some(body) = &outgoing.descriptor.body {
            builder = builder.body(serde_json::to_vec(body)?);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response.bytes().await?.to_vec();
        tracing::debug!(%status, bytes = body.len(), "response received");

        let mut response = ApiResponse {
            status,
            headers,
            body,
        };
        for layer in &self.response_layers {
            response = layer.on_response(&outgoing, response)?;
        }
        Ok(response)
    }

    /// Send a request and decode the JSON body.
    pub async fn fetch_json<T: DeserializeOwned>(&self, descriptor: RequestDescriptor) -> Result<T> {
        self.request(descriptor).await?.json()
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.fetch_json(RequestDescriptor::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.fetch_json(RequestDescriptor::post(path, body)?).await
    }

    pub async fn put_json<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize,
        T: DeserializeOwned,
    {
        self.fetch_json(RequestDescriptor::put(path, body)?).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("request_layers", &self.request_layers.len())
            .field("response_layers", &self.response_layers.len())
            .finish()
    }
}
