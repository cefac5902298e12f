//! TUI application state, rendering, and input handling.

use proto::{AuthState, Role};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use session::{CallbackView, Conversation, EXAMPLE_QUERIES, Screen, ViewController};

use super::action::{Action, Command};
use super::theme::THEME;

/// Spinner animation frames (Braille pattern).
const SPINNER: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];

/// Where the browser login currently stands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginPhase {
    Idle,
    /// Waiting for `GET /auth/login`.
    FetchingUrl,
    /// Browser opened; waiting for the provider redirect.
    AwaitingBrowser { url: String },
    /// Redirect received; code exchange in flight.
    Exchanging,
}

// ─── TuiApp ──────────────────────────────────────────────────

/// Full state for the TUI session.
pub struct TuiApp {
    /// Latest published session state.
    pub auth: AuthState,
    pub view: ViewController,
    pub conversation: Conversation,
    /// Current text typed in the input box (not yet submitted).
    pub input: String,
    /// Cursor position within `input` (byte offset).
    pub cursor_pos: usize,
    /// Vertical scroll offset for the history panel.
    pub history_scroll: u16,
    pub login: LoginPhase,
    /// One-line message shown until the next action replaces it.
    pub notice: Option<String>,
    /// Next example query Tab will insert.
    pub example_cursor: usize,
    /// Spinner animation tick counter.
    pub spinner_tick: u8,
    /// Whether the user requested exit.
    pub should_quit: bool,
}

impl TuiApp {
    pub fn new(welcome: Option<&str>) -> Self {
        let conversation = match welcome {
            Some(text) if !text.trim().is_empty() => Conversation::with_welcome(text),
            _ => Conversation::new(),
        };
        Self {
            auth: AuthState::Unknown,
            view: ViewController::new(),
            conversation,
            input: String::new(),
            cursor_pos: 0,
            history_scroll: 0,
            login: LoginPhase::Idle,
            notice: None,
            example_cursor: 0,
            spinner_tick: 0,
            should_quit: false,
        }
    }

    pub fn screen(&self) -> Screen {
        self.view.screen(&self.auth)
    }

    /// `true` while anything the spinner should reflect is in flight.
    pub fn is_busy(&self) -> bool {
        self.view.is_checking()
            || self.conversation.is_pending()
            || self.login != LoginPhase::Idle
            || self.view.callback() == Some(&CallbackView::Processing)
    }

    /// Take the current input and reset it.
    pub fn take_input(&mut self) -> String {
        self.cursor_pos = 0;
        std::mem::take(&mut self.input)
    }

    /// Ensure scroll is at the bottom (render clamps it).
    pub fn scroll_to_bottom(&mut self) {
        self.history_scroll = u16::MAX;
    }

    // ── Update ───────────────────────────────────────────────

    /// Applies one action and returns the side effect to run.
    pub fn update(&mut self, action: Action) -> Command {
        match action {
            Action::InsertChar(c) => {
                self.input.insert(self.cursor_pos, c);
                self.cursor_pos += c.len_utf8();
            }
            Action::DeleteChar => {
                if self.cursor_pos > 0 {
                    let prev = self.input[..self.cursor_pos]
                        .char_indices()
                        .last()
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                    self.input.drain(prev..self.cursor_pos);
                    self.cursor_pos = prev;
                }
            }
            Action::MoveCursorLeft => {
                if self.cursor_pos > 0 {
                    self.cursor_pos = self.input[..self.cursor_pos]
                        .char_indices()
                        .last()
                        .map(|(i, _)| i)
                        .unwrap_or(0);
                }
            }
            Action::MoveCursorRight => {
                if self.cursor_pos < self.input.len() {
                    self.cursor_pos = self.input[self.cursor_pos..]
                        .char_indices()
                        .nth(1)
                        .map(|(i, _)| self.cursor_pos + i)
                        .unwrap_or(self.input.len());
                }
            }
            Action::SubmitInput => {
                if self.conversation.is_pending() || self.input.trim().is_empty() {
                    return Command::None;
                }
                self.notice = None;
                let query = self.take_input();
                self.scroll_to_bottom();
                return Command::SpawnQuery(query);
            }
            Action::FillExample => {
                if self.input.is_empty() && self.conversation.is_fresh() {
                    let example = EXAMPLE_QUERIES[self.example_cursor % EXAMPLE_QUERIES.len()];
                    self.input = example.to_string();
                    self.cursor_pos = self.input.len();
                    self.example_cursor += 1;
                }
            }
            Action::ScrollUp(n) => {
                self.history_scroll = self.history_scroll.saturating_sub(n);
            }
            Action::ScrollDown(n) => {
                self.history_scroll = self.history_scroll.saturating_add(n);
            }
            Action::AuthChanged(state) => {
                self.auth = state;
            }
            Action::ProbeSettled => {
                self.view.probe_settled();
            }
            Action::StartLogin => {
                if self.login != LoginPhase::Idle {
                    return Command::None;
                }
                self.notice = None;
                self.login = LoginPhase::FetchingUrl;
                return Command::FetchLoginUrl;
            }
            Action::LoginUrlReady(url) => {
                self.login = LoginPhase::AwaitingBrowser { url: url.clone() };
                return Command::OpenBrowser(url);
            }
            Action::LoginFailed(message) => {
                self.login = LoginPhase::Idle;
                self.notice = Some(format!("Login failed: {message}"));
            }
            Action::RedirectReceived(target) => {
                self.login = LoginPhase::Exchanging;
                self.view.begin_callback();
                return Command::ExchangeRedirect(target);
            }
            Action::CallbackSucceeded(_) => {
                self.login = LoginPhase::Idle;
                self.view.callback_succeeded();
                return Command::ScheduleRedirect;
            }
            Action::CallbackFailed(message) => {
                self.login = LoginPhase::Idle;
                self.view.callback_failed(message);
            }
            Action::RedirectFired | Action::DismissCallback => {
                self.view.dismiss_callback();
                self.scroll_to_bottom();
            }
            Action::ApplyCompletion(completion) => {
                completion.apply(&mut self.conversation);
                self.scroll_to_bottom();
            }
            Action::QueryRejected { query, reason } => {
                if self.input.is_empty() {
                    self.cursor_pos = query.len();
                    self.input = query;
                }
                self.notice = Some(reason);
            }
            Action::Tick => {
                self.spinner_tick = self.spinner_tick.wrapping_add(1);
            }
            Action::Quit => {
                self.should_quit = true;
            }
        }
        Command::None
    }

    // ── Input handling ───────────────────────────────────────

    /// Maps a keyboard event to an action for the current screen.
    pub fn key_action(&self, key: crossterm::event::KeyEvent) -> Option<Action> {
        use crossterm::event::{KeyCode, KeyModifiers};

        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Some(Action::Quit);
        }

        if let Some(callback) = self.view.callback() {
            return match (callback, key.code) {
                (CallbackView::Failed(_), KeyCode::Enter | KeyCode::Esc) => {
                    Some(Action::DismissCallback)
                }
                (_, KeyCode::Esc) => Some(Action::Quit),
                _ => None,
            };
        }

        match self.screen() {
            Screen::Checking => match key.code {
                KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            Screen::LoginPrompt => match key.code {
                KeyCode::Enter => Some(Action::StartLogin),
                KeyCode::Esc => Some(Action::Quit),
                _ => None,
            },
            Screen::ConversationView => match key.code {
                KeyCode::Esc => Some(Action::Quit),
                KeyCode::Enter => Some(Action::SubmitInput),
                KeyCode::Tab => Some(Action::FillExample),
                KeyCode::Char(c) => Some(Action::InsertChar(c)),
                KeyCode::Backspace => Some(Action::DeleteChar),
                KeyCode::Left => Some(Action::MoveCursorLeft),
                KeyCode::Right => Some(Action::MoveCursorRight),
                KeyCode::Up => Some(Action::ScrollUp(1)),
                KeyCode::Down => Some(Action::ScrollDown(1)),
                KeyCode::PageUp => Some(Action::ScrollUp(10)),
                KeyCode::PageDown => Some(Action::ScrollDown(10)),
                _ => None,
            },
        }
    }

    /// Handle a keyboard event.
    pub fn handle_key(&mut self, key: crossterm::event::KeyEvent) -> Command {
        match self.key_action(key) {
            Some(action) => self.update(action),
            None => Command::None,
        }
    }

    // ── Rendering ────────────────────────────────────────────

    fn spinner(&self) -> char {
        SPINNER[(self.spinner_tick as usize) % SPINNER.len()]
    }

    /// Render the entire TUI into the given frame.
    pub fn render(&self, frame: &mut Frame<'_>) {
        let area = frame.area();
        let screen = self.screen();

        if screen == Screen::ConversationView {
            // Layout: title(1) | history(fill) | status(1) | input(3)
            let chunks = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
                Constraint::Length(3),
            ])
            .split(area);
            self.render_title(frame, chunks[0]);
            self.render_history(frame, chunks[1]);
            self.render_status(frame, chunks[2]);
            self.render_input(frame, chunks[3]);
        } else {
            let chunks = Layout::vertical([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
            self.render_title(frame, chunks[0]);
            match screen {
                Screen::Checking => self.render_checking(frame, chunks[1]),
                _ => self.render_login(frame, chunks[1]),
            }
            self.render_status(frame, chunks[2]);
        }

        if let Some(callback) = self.view.callback() {
            self.render_callback(frame, area, callback);
        }
    }

    fn render_title(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut spans = vec![Span::styled(
            " tubenor ",
            Style::default()
                .fg(THEME.logo)
                .add_modifier(Modifier::BOLD),
        )];
        match &self.auth {
            AuthState::Authenticated(channel) => {
                let name = channel
                    .as_ref()
                    .map(|c| c.display_name().to_string())
                    .unwrap_or_else(|| "Connected".to_string());
                spans.push(Span::styled(
                    format!(" ● {name} "),
                    Style::default().fg(THEME.status_channel),
                ));
            }
            other => spans.push(Span::styled(
                format!(" {} ", other.label()),
                Style::default().fg(THEME.fg_muted),
            )),
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_checking(&self, frame: &mut Frame<'_>, area: Rect) {
        let body = Paragraph::new(Line::from(Span::styled(
            format!("{} Checking authentication…", self.spinner()),
            Style::default().fg(THEME.status_spinner),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(body, centered(area, area.width, 1));
    }

    fn render_login(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines = vec![
            Line::from(Span::styled(
                "YouTube Analytics Assistant",
                Style::default()
                    .fg(THEME.logo)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(Span::styled(
                "Connect your YouTube channel to ask questions about its analytics.",
                Style::default().fg(THEME.fg_dim),
            )),
            Line::from(""),
        ];
        match &self.login {
            LoginPhase::Idle => lines.push(Line::from(vec![
                Span::styled("Press ", Style::default().fg(THEME.fg_dim)),
                Span::styled(
                    "Enter",
                    Style::default().fg(THEME.fg).add_modifier(Modifier::BOLD),
                ),
                Span::styled(" to sign in with Google", Style::default().fg(THEME.fg_dim)),
            ])),
            LoginPhase::FetchingUrl => lines.push(Line::from(Span::styled(
                format!("{} Requesting authorization URL…", self.spinner()),
                Style::default().fg(THEME.status_spinner),
            ))),
            LoginPhase::AwaitingBrowser { url } => {
                lines.push(Line::from(Span::styled(
                    format!("{} Complete sign-in in your browser.", self.spinner()),
                    Style::default().fg(THEME.status_spinner),
                )));
                lines.push(Line::from(Span::styled(
                    "If it did not open, visit:",
                    Style::default().fg(THEME.fg_dim),
                )));
                lines.push(Line::from(Span::styled(
                    url.clone(),
                    Style::default().fg(THEME.info),
                )));
            }
            LoginPhase::Exchanging => lines.push(Line::from(Span::styled(
                format!("{} Completing sign-in…", self.spinner()),
                Style::default().fg(THEME.status_spinner),
            ))),
        }
        if let Some(notice) = &self.notice {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                notice.clone(),
                Style::default().fg(THEME.error),
            )));
        }

        let height = lines.len() as u16 + 2;
        let body = Paragraph::new(Text::from(lines))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(THEME.border)),
            );
        frame.render_widget(body, centered(area, area.width.min(76), height));
    }

    fn render_history(&self, frame: &mut Frame<'_>, area: Rect) {
        let mut lines: Vec<Line<'_>> = Vec::new();

        for turn in self.conversation.turns() {
            let (label, color) = match turn.role() {
                Role::User => ("You", THEME.user_label),
                Role::Assistant => ("Assistant", THEME.assistant_label),
            };
            lines.push(Line::from(""));
            lines.push(Line::from(vec![
                Span::styled(
                    format!("{label} "),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                ),
                Span::styled(turn.time_label(), Style::default().fg(THEME.turn_time)),
            ]));
            for line in turn.content().lines() {
                lines.push(Line::from(Span::raw(format!("  {line}"))));
            }
        }

        if self.conversation.is_pending() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!("{} Analyzing your channel…", self.spinner()),
                Style::default().fg(THEME.status_spinner),
            )));
        }

        if self.conversation.is_fresh() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                "Try asking:",
                Style::default().fg(THEME.fg_dim),
            )));
            for example in EXAMPLE_QUERIES {
                lines.push(Line::from(Span::styled(
                    format!("  • {example}"),
                    Style::default().fg(THEME.example),
                )));
            }
        }

        // Scroll bounds count wrapped rows inside the border, not logical lines.
        let history = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false });
        let inner_width = area.width.saturating_sub(2);
        let content_height = u16::try_from(history.line_count(inner_width)).unwrap_or(u16::MAX);
        let visible_height = area.height.saturating_sub(2);
        let max_scroll = content_height.saturating_sub(visible_height);
        let scroll = self.history_scroll.min(max_scroll);

        let history = history
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(THEME.border)),
            )
            .scroll((scroll, 0));

        frame.render_widget(history, area);
    }

    fn render_status(&self, frame: &mut Frame<'_>, area: Rect) {
        let status = match (self.screen(), &self.notice) {
            (Screen::ConversationView, Some(notice)) => {
                Line::from(Span::styled(format!(" {notice}"), Style::default().fg(THEME.error)))
            }
            (Screen::ConversationView, None) if self.conversation.is_pending() => Line::from(
                Span::styled(
                    format!(" {} Waiting for the agent…", self.spinner()),
                    Style::default().fg(THEME.status_spinner),
                ),
            ),
            (Screen::ConversationView, None) => Line::from(Span::styled(
                " Enter:send  Tab:example  ↑↓:scroll  Esc:quit",
                Style::default().fg(THEME.status_hint),
            )),
            (Screen::LoginPrompt, _) => Line::from(Span::styled(
                " Enter:sign in  Esc:quit",
                Style::default().fg(THEME.status_hint),
            )),
            (Screen::Checking, _) => Line::from(Span::styled(
                " Esc:quit",
                Style::default().fg(THEME.status_hint),
            )),
        };
        frame.render_widget(Paragraph::new(status), area);
    }

    fn render_input(&self, frame: &mut Frame<'_>, area: Rect) {
        let accepting = !self.conversation.is_pending();
        let border_color = if accepting {
            THEME.border_active
        } else {
            THEME.border
        };

        let (display_text, input_style) = if self.input.is_empty() {
            (
                "Ask about your YouTube channel...",
                Style::default().fg(THEME.fg_muted),
            )
        } else {
            (self.input.as_str(), Style::default().fg(THEME.fg))
        };

        let input = Paragraph::new(Span::styled(display_text, input_style)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(border_color))
                .title(" Query "),
        );
        frame.render_widget(input, area);

        if self.view.callback().is_none() {
            let cursor_col = self.input[..self.cursor_pos].chars().count() as u16;
            frame.set_cursor_position((area.x + 1 + cursor_col, area.y + 1));
        }
    }

    fn render_callback(&self, frame: &mut Frame<'_>, area: Rect, callback: &CallbackView) {
        let (title, color, lines) = match callback {
            CallbackView::Processing => (
                " Signing in ",
                THEME.status_spinner,
                vec![Line::from(format!(
                    "{} Processing authentication...",
                    self.spinner()
                ))],
            ),
            CallbackView::Succeeded => {
                let who = self
                    .auth
                    .channel()
                    .map(|c| format!("Connected as {}.", c.display_name()))
                    .unwrap_or_else(|| "Authentication successful!".to_string());
                (
                    " Signed in ",
                    THEME.success,
                    vec![
                        Line::from(who),
                        Line::from(Span::styled(
                            "Returning to the assistant...",
                            Style::default().fg(THEME.fg_dim),
                        )),
                    ],
                )
            }
            CallbackView::Failed(message) => (
                " Authentication failed ",
                THEME.error,
                vec![
                    Line::from(message.clone()),
                    Line::from(""),
                    Line::from(Span::styled(
                        "Press Enter to return",
                        Style::default().fg(THEME.fg_dim),
                    )),
                ],
            ),
        };

        let popup = centered(area, area.width.min(60), lines.len() as u16 + 2);
        frame.render_widget(Clear, popup);
        frame.render_widget(
            Paragraph::new(Text::from(lines))
                .alignment(Alignment::Center)
                .wrap(Wrap { trim: true })
                .block(
                    Block::default()
                        .borders(Borders::ALL)
                        .border_style(Style::default().fg(color))
                        .title(title),
                ),
            popup,
        );
    }
}

/// A `width` x `height` rect centered in `area`, clamped to it.
fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
