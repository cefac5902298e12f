//! Sends user queries to the analytics agent, one exchange at a time.

use std::sync::Arc;

use proto::{BackendError, ChatError};
use tracing::{debug, warn};

use crate::backend::Backend;
use crate::conversation::{Conversation, ExchangeHandle, ExchangeStatus};
use crate::store::SessionStore;

/// Assistant text used when the agent answers with an empty body.
pub const EMPTY_RESPONSE_FALLBACK: &str =
    "I received your query but couldn't generate a response.";

/// Prefix of the synthetic assistant turn appended on failure.
pub const ERROR_PREFIX: &str = "Sorry, I encountered an error: ";

pub struct ChatClient {
    backend: Arc<dyn Backend>,
    session: Arc<SessionStore>,
}

impl ChatClient {
    pub fn new(backend: Arc<dyn Backend>, session: Arc<SessionStore>) -> Self {
        Self { backend, session }
    }

    /// Checks the guards and appends the user turn. Nothing is sent when
    /// this fails. The returned task owns everything the network call needs.
    pub fn begin(&self, conversation: &mut Conversation, text: &str) -> Result<QueryTask, ChatError> {
        if !self.session.snapshot().is_authenticated() {
            return Err(ChatError::NotAuthenticated);
        }
        let handle = conversation.begin_exchange(text)?;
        Ok(QueryTask {
            backend: Arc::clone(&self.backend),
            handle,
            query: text.trim().to_string(),
        })
    }

    /// Runs one full exchange against a conversation the caller owns.
    /// Backend failures end as a failed exchange, not as an `Err`.
    pub async fn submit_query(
        &self,
        conversation: &mut Conversation,
        text: &str,
    ) -> Result<ExchangeStatus, ChatError> {
        let task = self.begin(conversation, text)?;
        let completion = task.run().await;
        let status = if completion.result.is_ok() {
            ExchangeStatus::Succeeded
        } else {
            ExchangeStatus::Failed
        };
        completion.apply(conversation);
        Ok(status)
    }
}

/// The single network call of an exchange; `'static` so it can be spawned.
pub struct QueryTask {
    backend: Arc<dyn Backend>,
    handle: ExchangeHandle,
    query: String,
}

impl QueryTask {
    pub fn handle(&self) -> ExchangeHandle {
        self.handle
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Sends the query once; no retry.
    pub async fn run(self) -> ExchangeCompletion {
        debug!(handle = ?self.handle, "Sending query to agent");
        let result = self.backend.general_query(&self.query).await;
        if let Err(e) = &result {
            warn!(handle = ?self.handle, error = %e, "Agent query failed");
        }
        ExchangeCompletion {
            handle: self.handle,
            result,
        }
    }
}

/// Outcome of a [`QueryTask`], applied back on the owning conversation.
#[derive(Debug)]
pub struct ExchangeCompletion {
    pub handle: ExchangeHandle,
    pub result: Result<String, BackendError>,
}

impl ExchangeCompletion {
    /// Appends the assistant or error turn. `None` when the exchange is no
    /// longer pending on `conversation`.
    pub fn apply(self, conversation: &mut Conversation) -> Option<ExchangeStatus> {
        match self.result {
            Ok(body) => conversation.resolve_exchange(self.handle, response_text(&body)),
            Err(e) => conversation.fail_exchange(self.handle, error_text(&e)),
        }
    }
}

/// Assistant text for a 2xx body: JSON strings are unwrapped, other JSON is
/// shown as JSON, anything else verbatim.
pub fn response_text(body: &str) -> String {
    if body.trim().is_empty() {
        return EMPTY_RESPONSE_FALLBACK.to_string();
    }
    let text = match serde_json::from_str::<serde_json::Value>(body) {
        Ok(serde_json::Value::String(text)) => text,
        Ok(serde_json::Value::Null) => String::new(),
        Ok(other) => other.to_string(),
        Err(_) => body.to_string(),
    };
    if text.trim().is_empty() {
        EMPTY_RESPONSE_FALLBACK.to_string()
    } else {
        text
    }
}

/// Assistant text for a failed exchange.
pub fn error_text(err: &BackendError) -> String {
    format!("{ERROR_PREFIX}{}", err.user_message())
}
