//! Append-only conversation log with a single in-flight exchange.

use proto::{ConversationError, ConversationTurn};
use tracing::debug;

/// Assistant turn every conversation starts with.
pub const DEFAULT_WELCOME: &str =
    "Hi! I'm your YouTube Assistant. Ask me anything about your YouTube channel data!";

/// Suggestions offered while only the welcome turn exists.
pub const EXAMPLE_QUERIES: [&str; 3] = [
    "How many views does my latest video have?",
    "What are my top 5 videos?",
    "Show me my channel statistics",
];

/// Identifies one exchange. Completions carrying a stale handle are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ExchangeHandle(u64);

/// How a finished exchange ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeStatus {
    /// Terminated with the agent response appended.
    Succeeded,
    /// Terminated with a synthetic error turn appended.
    Failed,
}

/// The exchange currently awaiting a response.
#[derive(Debug, Clone)]
pub struct PendingExchange {
    handle: ExchangeHandle,
    user_turn: ConversationTurn,
}

impl PendingExchange {
    pub fn handle(&self) -> ExchangeHandle {
        self.handle
    }

    pub fn user_turn(&self) -> &ConversationTurn {
        &self.user_turn
    }
}

/// Ordered turns of one session; insertion order is chronological order.
#[derive(Debug, Clone)]
pub struct Conversation {
    turns: Vec<ConversationTurn>,
    pending: Option<PendingExchange>,
    next_handle: u64,
}

impl Conversation {
    /// Conversation seeded with [`DEFAULT_WELCOME`].
    pub fn new() -> Self {
        Self::with_welcome(DEFAULT_WELCOME)
    }

    /// Conversation seeded with a custom welcome turn.
    pub fn with_welcome(welcome: impl Into<String>) -> Self {
        Self {
            turns: vec![ConversationTurn::assistant(welcome)],
            pending: None,
            next_handle: 0,
        }
    }

    pub fn append(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Appends the trimmed user turn and marks the exchange pending.
    pub fn begin_exchange(&mut self, content: &str) -> Result<ExchangeHandle, ConversationError> {
        if self.pending.is_some() {
            return Err(ConversationError::ExchangePending);
        }
        let content = content.trim();
        if content.is_empty() {
            return Err(ConversationError::EmptyContent);
        }

        let handle = ExchangeHandle(self.next_handle);
        self.next_handle += 1;
        let user_turn = ConversationTurn::user(content);
        self.append(user_turn.clone());
        self.pending = Some(PendingExchange {
            handle,
            user_turn,
        });
        debug!(handle = ?handle, turns = %self.turns.len(), "Exchange started");
        Ok(handle)
    }

    /// Appends the agent response and clears the pending exchange.
    /// Returns `None` (and appends nothing) if `handle` is not pending.
    pub fn resolve_exchange(
        &mut self,
        handle: ExchangeHandle,
        content: impl Into<String>,
    ) -> Option<ExchangeStatus> {
        self.terminate(handle, content.into(), ExchangeStatus::Succeeded)
    }

    /// Appends an error turn and clears the pending exchange.
    /// Returns `None` (and appends nothing) if `handle` is not pending.
    pub fn fail_exchange(
        &mut self,
        handle: ExchangeHandle,
        content: impl Into<String>,
    ) -> Option<ExchangeStatus> {
        self.terminate(handle, content.into(), ExchangeStatus::Failed)
    }

    fn terminate(
        &mut self,
        handle: ExchangeHandle,
        content: String,
        status: ExchangeStatus,
    ) -> Option<ExchangeStatus> {
        match &self.pending {
            Some(pending) if pending.handle == handle => {}
            _ => {
                debug!(handle = ?handle, "Ignoring completion for an exchange that is not pending");
                return None;
            }
        }
        self.pending = None;
        self.append(ConversationTurn::assistant(content));
        debug!(handle = ?handle, status = ?status, turns = %self.turns.len(), "Exchange finished");
        Some(status)
    }

    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    pub fn pending(&self) -> Option<&PendingExchange> {
        self.pending.as_ref()
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// `true` while only the welcome turn exists.
    pub fn is_fresh(&self) -> bool {
        self.turns.len() == 1
    }
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}
