use std::sync::Arc;

use reqwest::header::{HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;

use crate::error::{Result, TmsError};
use crate::navigation::{Navigator, Route};
use crate::session::SessionStore;

use super::{ApiResponse, OutgoingRequest, ResponseKind};

/// A `Request -> Request` stage run before the request is sent.
pub trait RequestLayer: Send + Sync {
    fn on_request(&self, request: OutgoingRequest) -> Result<OutgoingRequest>;
}

/// A `Response -> Response` stage run after the response is buffered.
pub trait ResponseLayer: Send + Sync {
    fn on_response(&self, request: &OutgoingRequest, response: ApiResponse)
        -> Result<ApiResponse>;
}

/// Attaches the session token as a bearer credential, if one is held.
pub struct BearerAuth {
    session: Arc<SessionStore>,
}

impl BearerAuth {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self { session }
    }
}

impl RequestLayer for BearerAuth {
    fn on_request(&self, mut request: OutgoingRequest) -> Result<OutgoingRequest> {
        let (token, version) = self.session.credentials();
        request.session_version = version;
        match token {
            Some(token) => {
                let value = HeaderValue::from_str(&format!("Bearer {token}")).map_err(|e| {
                    TmsError::InvalidRequest {
                        reason: format!("token is not a valid header value: {e}"),
                    }
                })?;
                request.headers.insert(AUTHORIZATION, value);
            }
            None => {
                request.headers.remove(AUTHORIZATION);
            }
        }
        Ok(request)
    }
}

/// Sets `Accept` from the expected response kind.
pub struct ContentNegotiation;

impl RequestLayer for ContentNegotiation {
    fn on_request(&self, mut request: OutgoingRequest) -> Result<OutgoingRequest> {
        let accept = match request.descriptor.response_kind {
            ResponseKind::Json => "application/json",
            ResponseKind::Binary => "*/*",
        };
        request
            .headers
            .insert(ACCEPT, HeaderValue::from_static(accept));
        if request.descriptor.body.is_some() {
            request
                .headers
                .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        }
        Ok(request)
    }
}

/// On 401, clears the session the request was sent under and sends the
/// active view to the login screen. The response passes on unchanged.
pub struct SessionTeardown {
    session: Arc<SessionStore>,
    navigator: Arc<dyn Navigator>,
}

impl SessionTeardown {
    pub fn new(session: Arc<SessionStore>, navigator: Arc<dyn Navigator>) -> Self {
        Self { session, navigator }
    }
}

impl ResponseLayer for SessionTeardown {
    fn on_response(
        &self,
        request: &OutgoingRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse> {
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        match self.session.invalidate_if_current(request.session_version) {
            Ok(true) => {
                tracing::warn!(
                    path = %request.descriptor.path,
                    "received 401, session cleared"
                );
                self.navigator.navigate(Route::Login);
            }
            Ok(false) => {
                tracing::debug!(
                    path = %request.descriptor.path,
                    "received 401 for a superseded session"
                );
            }
            Err(e) => {
                tracing::warn!("session cleared after 401 but token removal failed: {e}");
                self.navigator.navigate(Route::Login);
            }
        }
        Ok(response)
    }
}

/// Turns non-success statuses into typed errors, leaving status and body
/// intact.
pub struct ErrorClassify;

impl ResponseLayer for ErrorClassify {
    fn on_response(
        &self,
        _request: &OutgoingRequest,
        response: ApiResponse,
    ) -> Result<ApiResponse> {
        let status = response.status;
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text();
        Err(match status {
            StatusCode::UNAUTHORIZED => TmsError::Unauthorized { body },
            s if s.is_client_error() => TmsError::Validation {
                status: s.as_u16(),
                body,
            },
            s => TmsError::Api {
                status: s.as_u16(),
                body,
            },
        })
    }
}
