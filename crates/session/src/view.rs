//! Screen derivation for the front end.

use proto::AuthState;

/// The three mutually exclusive top-level screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    /// First status probe still in flight.
    Checking,
    /// Not authenticated; offer the provider login.
    LoginPrompt,
    /// Authenticated; show the conversation.
    ConversationView,
}

impl Screen {
    /// Pure and total mapping from session state to screen. Once `checking`
    /// is cleared a stray `Unknown` maps to the login prompt (fail-closed).
    pub fn derive(state: &AuthState, checking: bool) -> Self {
        if checking {
            return Self::Checking;
        }
        match state {
            AuthState::Authenticated(_) => Self::ConversationView,
            AuthState::Unauthenticated | AuthState::Unknown => Self::LoginPrompt,
        }
    }
}

/// Progress of the OAuth redirect handling, shown over the main screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackView {
    /// Exchange in flight.
    Processing,
    /// Exchange succeeded; the redirect timer is counting down.
    Succeeded,
    /// Exchange or redirect parsing failed.
    Failed(String),
}

/// View-side state: the one-way "checking" flag and the callback overlay.
#[derive(Debug)]
pub struct ViewController {
    checking: bool,
    checking_exits: u32,
    callback: Option<CallbackView>,
}

impl ViewController {
    pub fn new() -> Self {
        Self {
            checking: true,
            checking_exits: 0,
            callback: None,
        }
    }

    /// Records that the first probe settled. Later calls do nothing.
    pub fn probe_settled(&mut self) {
        if self.checking {
            self.checking = false;
            self.checking_exits += 1;
        }
    }

    pub fn is_checking(&self) -> bool {
        self.checking
    }

    /// How many times `Checking` was left; never more than one.
    pub fn checking_exits(&self) -> u32 {
        self.checking_exits
    }

    pub fn screen(&self, state: &AuthState) -> Screen {
        Screen::derive(state, self.checking)
    }

    pub fn callback(&self) -> Option<&CallbackView> {
        self.callback.as_ref()
    }

    pub fn begin_callback(&mut self) {
        self.callback = Some(CallbackView::Processing);
    }

    pub fn callback_succeeded(&mut self) {
        self.callback = Some(CallbackView::Succeeded);
    }

    pub fn callback_failed(&mut self, message: impl Into<String>) {
        self.callback = Some(CallbackView::Failed(message.into()));
    }

    /// Returns to the home screen (redirect fired or user dismissed).
    pub fn dismiss_callback(&mut self) {
        self.callback = None;
    }
}

impl Default for ViewController {
    fn default() -> Self {
        Self::new()
    }
}
