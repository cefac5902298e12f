//! Session core: authentication state machine, conversation log, and the
//! backend clients that drive them.
//!
//! All state is owned by one logical task. Network calls either run inline
//! (`AuthClient`, `ChatClient::submit_query`) or as spawned `'static` tasks
//! whose completions are applied back on the owner (`QueryTask`).

pub mod auth_client;
pub mod backend;
pub mod chat_client;
pub mod conversation;
pub mod markers;
pub mod oauth;
pub mod store;
pub mod timer;
pub mod view;

#[cfg(test)]
mod test_support;

/// Status probe and code exchange.
pub use auth_client::AuthClient;
/// Backend seam and its HTTP implementation.
pub use backend::{Backend, HttpBackend};
/// Chat exchange driver.
pub use chat_client::{ChatClient, ExchangeCompletion, QueryTask};
/// Conversation log.
pub use conversation::{
    Conversation, DEFAULT_WELCOME, EXAMPLE_QUERIES, ExchangeHandle, ExchangeStatus,
    PendingExchange,
};
/// Advisory on-disk markers.
pub use markers::{MarkerStore, SessionMarkers};
/// Redirect parsing.
pub use oauth::OAuthExchangeRequest;
/// Session state owner.
pub use store::SessionStore;
/// Post-exchange redirect timer.
pub use timer::RedirectTimer;
/// Screen derivation.
pub use view::{CallbackView, Screen, ViewController};
