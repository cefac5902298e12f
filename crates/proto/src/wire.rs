//! Request/response bodies of the analytics backend HTTP contract.

use serde::{Deserialize, Serialize};

use crate::auth::ChannelInfo;

/// `GET`: session status probe (credentials travel in the cookie).
pub const STATUS_PATH: &str = "/auth/status";
/// `POST`: authorization code exchange.
pub const CALLBACK_PATH: &str = "/auth/callback";
/// `GET`: authorization URL for starting the provider login.
pub const LOGIN_PATH: &str = "/auth/login";
/// `POST` with the `query` query parameter and no body.
pub const GENERAL_QUERY_PATH: &str = "/agents/general-query";

/// Body of `GET /auth/status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub authenticated: bool,
    #[serde(default)]
    pub channel_info: Option<ChannelInfo>,
}

/// Body sent to `POST /auth/callback`. `state` is sent as `null` when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRequest {
    pub code: String,
    pub state: Option<String>,
}

/// Body of a successful `POST /auth/callback`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackResponse {
    #[serde(default)]
    pub channel_info: Option<ChannelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Body of `GET /auth/login`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoginResponse {
    pub authorization_url: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
}

/// Error body of any non-2xx response. FastAPI sends `detail` as a string,
/// or as a list of objects for validation failures.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Parses an error body, returning the detail as display text.
    pub fn detail_from(body: &str) -> Option<String> {
        let parsed: ErrorBody = serde_json::from_str(body).ok()?;
        match parsed.detail? {
            serde_json::Value::Null => None,
            serde_json::Value::String(text) => Some(text),
            other => Some(other.to_string()),
        }
    }
}
