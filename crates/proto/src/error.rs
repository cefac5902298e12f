use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A field has an invalid value and reason.
    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    /// Filesystem read error.
    #[error("IO error reading config: {0}")]
    Io(#[from] std::io::Error),

    /// TOML parse error.
    #[error("TOML parse error: {0}")]
    Toml(String),
}

/// Failures of a single call against the analytics backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Network unreachable, connection refused, timeout.
    #[error("{0}")]
    Transport(String),

    /// Non-2xx response, with the backend `detail` field when one was sent.
    #[error("Request failed with status code {status}")]
    Status { status: u16, detail: Option<String> },

    /// 2xx response whose body did not match the expected shape.
    #[error("Invalid response from backend: {0}")]
    Decode(String),
}

impl BackendError {
    /// Message shown to the user: the backend detail verbatim when present,
    /// otherwise the transport/status description.
    pub fn user_message(&self) -> String {
        match self {
            Self::Status {
                detail: Some(detail),
                ..
            } => detail.clone(),
            other => other.to_string(),
        }
    }
}

/// OAuth handshake errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// The redirect carried no authorization code; nothing was sent.
    #[error("No authorization code received")]
    NoCode,

    /// The provider redirected back with an OAuth `error` parameter.
    #[error("Provider returned OAuth error '{error}': {description}")]
    Provider { error: String, description: String },

    /// The redirect URL could not be parsed at all.
    #[error("Malformed redirect URL: {0}")]
    MalformedRedirect(String),

    /// The backend rejected or failed the call.
    #[error("{0}")]
    Backend(#[from] BackendError),
}

impl AuthError {
    /// Human-readable message for the callback view.
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Backend(err) => err.user_message(),
            other => other.to_string(),
        };
        if message.trim().is_empty() {
            "Authentication failed".to_string()
        } else {
            message
        }
    }
}

/// Conversation model rejections
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConversationError {
    /// Query text is empty after trimming.
    #[error("Query is empty")]
    EmptyContent,

    /// Another exchange is still awaiting its response.
    #[error("An exchange is already pending")]
    ExchangePending,
}

/// Chat exchange errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChatError {
    /// The session is not authenticated; nothing was sent.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// The conversation refused to start an exchange.
    #[error("{0}")]
    Conversation(#[from] ConversationError),
}

/// Session store transition errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SessionError {
    /// Attempted to move an authenticated session back to a lesser state.
    #[error("Refusing to regress an authenticated session to {0}")]
    Regression(&'static str),
}
