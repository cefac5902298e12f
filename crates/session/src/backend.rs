//! Analytics backend abstraction and the `reqwest` implementation.

use std::time::Duration;

use async_trait::async_trait;
use proto::wire::{CALLBACK_PATH, GENERAL_QUERY_PATH, LOGIN_PATH, STATUS_PATH};
use proto::{BackendError, CallbackRequest, CallbackResponse, ErrorBody, LoginResponse, StatusResponse};
use serde::de::DeserializeOwned;
use tracing::debug;

/// The four calls this client makes against the backend.
#[async_trait]
pub trait Backend: Send + Sync {
    /// `GET /auth/status`.
    async fn auth_status(&self) -> Result<StatusResponse, BackendError>;

    /// `POST /auth/callback` with `{code, state}`.
    async fn auth_callback(&self, body: &CallbackRequest) -> Result<CallbackResponse, BackendError>;

    /// `GET /auth/login`.
    async fn auth_login(&self) -> Result<LoginResponse, BackendError>;

    /// `POST /agents/general-query?query=...`, returning the raw body text.
    async fn general_query(&self, query: &str) -> Result<String, BackendError>;
}

/// HTTP backend. Keeps a cookie jar so the session cookie set by the
/// callback exchange is sent on every later call.
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    /// Creates a backend client rooted at `base_url` (trailing slash ignored).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .cookie_store(true)
            .build()
            .map_err(|e| BackendError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Sends a request and returns the body of a 2xx response.
    async fn send(&self, request: reqwest::RequestBuilder, path: &str) -> Result<String, BackendError> {
        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        debug!(path = %path, status = %status.as_u16(), "Backend response");

        let body = response.text().await.map_err(transport_error)?;
        if !status.is_success() {
            return Err(BackendError::Status {
                status: status.as_u16(),
                detail: ErrorBody::detail_from(&body),
            });
        }
        Ok(body)
    }
}

fn transport_error(err: reqwest::Error) -> BackendError {
    if err.is_timeout() {
        BackendError::Transport(format!("Request timed out: {err}"))
    } else {
        BackendError::Transport(format!("Network error: {err}"))
    }
}

fn decode<T: DeserializeOwned>(body: &str) -> Result<T, BackendError> {
    serde_json::from_str(body).map_err(|e| BackendError::Decode(e.to_string()))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn auth_status(&self) -> Result<StatusResponse, BackendError> {
        debug!("API Request: GET {STATUS_PATH}");
        let body = self
            .send(self.client.get(self.url(STATUS_PATH)), STATUS_PATH)
            .await?;
        decode(&body)
    }

    async fn auth_callback(&self, body: &CallbackRequest) -> Result<CallbackResponse, BackendError> {
        debug!("API Request: POST {CALLBACK_PATH}");
        let body = self
            .send(self.client.post(self.url(CALLBACK_PATH)).json(body), CALLBACK_PATH)
            .await?;
        if body.trim().is_empty() {
            return Ok(CallbackResponse::default());
        }
        decode(&body)
    }

    async fn auth_login(&self) -> Result<LoginResponse, BackendError> {
        debug!("API Request: GET {LOGIN_PATH}");
        let body = self
            .send(self.client.get(self.url(LOGIN_PATH)), LOGIN_PATH)
            .await?;
        decode(&body)
    }

    async fn general_query(&self, query: &str) -> Result<String, BackendError> {
        debug!(query_len = %query.len(), "API Request: POST {GENERAL_QUERY_PATH}");
        let request = self
            .client
            .post(self.url(GENERAL_QUERY_PATH))
            .query(&[("query", query)]);
        self.send(request, GENERAL_QUERY_PATH).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend =
            HttpBackend::new("http://localhost:8000/", Duration::from_secs(5)).expect("client");
        assert_eq!(backend.base_url(), "http://localhost:8000");
        assert_eq!(
            backend.url(STATUS_PATH),
            "http://localhost:8000/auth/status"
        );
    }

    #[test]
    fn decode_reports_shape_mismatch() {
        let err = decode::<StatusResponse>(r#"{"channel_info":null}"#).expect_err("missing field");
        assert!(matches!(err, BackendError::Decode(_)));
    }
}
