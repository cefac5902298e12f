//! Action and command types for the TUI.
//!
//! All state mutations flow through [`Action`], and side effects are
//! expressed as [`Command`] values returned from `TuiApp::update()`.

use proto::{AuthState, ChannelInfo};
use session::ExchangeCompletion;

// ─── Action ──────────────────────────────────────────────────────────────────

/// Every possible state mutation in the TUI.
#[derive(Debug)]
pub enum Action {
    // ── Input ────────────────────────────────────────────────
    InsertChar(char),
    DeleteChar,
    MoveCursorLeft,
    MoveCursorRight,
    /// Submit the current input as a query.
    SubmitInput,
    /// Fill the input with the next example query.
    FillExample,

    // ── Navigation ───────────────────────────────────────────
    ScrollUp(u16),
    ScrollDown(u16),

    // ── Session ──────────────────────────────────────────────
    /// The session store published a new state.
    AuthChanged(AuthState),
    /// The first status probe finished.
    ProbeSettled,

    // ── Login handshake ──────────────────────────────────────
    StartLogin,
    /// Authorization URL received from the backend.
    LoginUrlReady(String),
    /// Fetching the URL or receiving the redirect failed.
    LoginFailed(String),
    /// The browser hit the local redirect receiver.
    RedirectReceived(String),
    CallbackSucceeded(Option<ChannelInfo>),
    CallbackFailed(String),
    /// The post-exchange delay elapsed.
    RedirectFired,
    DismissCallback,

    // ── Chat ─────────────────────────────────────────────────
    ApplyCompletion(ExchangeCompletion),
    /// A query was refused before anything was sent; the text goes back
    /// into the input box.
    QueryRejected { query: String, reason: String },

    // ── System ───────────────────────────────────────────────
    Tick,
    Quit,
}

// ─── Command ─────────────────────────────────────────────────────────────────

/// Side effects returned by `TuiApp::update()`. The event loop is
/// responsible for executing these asynchronously.
#[derive(Debug, PartialEq, Eq)]
pub enum Command {
    None,
    /// Start an exchange for this query.
    SpawnQuery(String),
    /// Ask the backend for the provider authorization URL.
    FetchLoginUrl,
    /// Open the URL and wait for the redirect.
    OpenBrowser(String),
    /// Exchange the code carried by this redirect target.
    ExchangeRedirect(String),
    /// Start the countdown back to the home screen.
    ScheduleRedirect,
}
