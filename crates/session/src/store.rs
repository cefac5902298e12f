//! Session store: the single owner of [`AuthState`].

use proto::{AuthState, ChannelInfo, SessionError};
use tokio::sync::watch;
use tracing::{debug, warn};

/// Holds the authentication state of one logical session and notifies
/// subscribers on every change. No I/O happens here.
#[derive(Debug)]
pub struct SessionStore {
    tx: watch::Sender<AuthState>,
}

impl SessionStore {
    /// Creates a store in the `Unknown` state.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AuthState::Unknown);
        Self { tx }
    }

    /// Keeps the store at `Unknown`. Only valid before any probe settled.
    pub fn set_unknown(&self) -> Result<(), SessionError> {
        self.transition(AuthState::Unknown)
    }

    /// Marks the session authenticated. Last write wins.
    pub fn set_authenticated(&self, channel: Option<ChannelInfo>) {
        // Authenticated is reachable from every state.
        let _ = self.transition(AuthState::Authenticated(channel));
    }

    /// Marks the session unauthenticated. Rejected once authenticated.
    pub fn set_unauthenticated(&self) -> Result<(), SessionError> {
        self.transition(AuthState::Unauthenticated)
    }

    /// Synchronous read of the current state.
    pub fn snapshot(&self) -> AuthState {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every subsequent state change.
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.tx.subscribe()
    }

    fn transition(&self, next: AuthState) -> Result<(), SessionError> {
        let mut rejected = None;
        self.tx.send_if_modified(|current| {
            if !current.can_transition_to(&next) {
                rejected = Some(current.label());
                return false;
            }
            if *current == next {
                return false;
            }
            debug!(from = %current.label(), to = %next.label(), "Session state changed");
            *current = next.clone();
            true
        });

        match rejected {
            Some(from) => {
                warn!(from = %from, to = %next.label(), "Rejected session state regression");
                Err(SessionError::Regression(next.label()))
            }
            None => Ok(()),
        }
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel(name: &str) -> ChannelInfo {
        ChannelInfo::new(name, None)
    }

    #[test]
    fn starts_unknown() {
        let store = SessionStore::new();
        assert_eq!(store.snapshot(), AuthState::Unknown);
        assert!(store.set_unknown().is_ok());
    }

    #[test]
    fn unknown_to_unauthenticated_to_authenticated() {
        let store = SessionStore::new();
        store.set_unauthenticated().expect("allowed from unknown");
        assert_eq!(store.snapshot(), AuthState::Unauthenticated);

        store.set_authenticated(Some(channel("A")));
        assert_eq!(store.snapshot(), AuthState::Authenticated(Some(channel("A"))));
    }

    #[test]
    fn set_authenticated_is_last_write_wins() {
        let store = SessionStore::new();
        store.set_authenticated(Some(channel("A")));
        store.set_authenticated(Some(channel("B")));
        store.set_authenticated(Some(channel("B")));
        assert_eq!(store.snapshot().channel(), Some(&channel("B")));
    }

    #[test]
    fn authenticated_never_regresses() {
        let store = SessionStore::new();
        store.set_authenticated(None);

        let err = store.set_unauthenticated().expect_err("regression must be rejected");
        assert_eq!(err, SessionError::Regression("unauthenticated"));
        assert!(store.set_unknown().is_err());
        assert_eq!(store.snapshot(), AuthState::Authenticated(None));
    }

    #[test]
    fn unauthenticated_cannot_return_to_unknown() {
        let store = SessionStore::new();
        store.set_unauthenticated().expect("allowed");
        assert!(store.set_unknown().is_err());
        assert!(store.set_unauthenticated().is_ok());
    }

    #[tokio::test]
    async fn subscribers_are_notified_of_changes() {
        let store = SessionStore::new();
        let mut rx = store.subscribe();

        store.set_authenticated(Some(channel("A")));
        rx.changed().await.expect("sender alive");
        assert!(rx.borrow_and_update().is_authenticated());

        // Rejected and no-op transitions do not notify.
        let _ = store.set_unauthenticated();
        store.set_authenticated(Some(channel("A")));
        assert!(!rx.has_changed().expect("sender alive"));
    }
}
