//! Async event loop for the TUI. Interleaves crossterm input, session
//! updates, backend tasks, and timers.

use std::sync::Arc;

use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use futures_util::StreamExt;
use proto::{AuthError, AuthState, BackendError, ChannelInfo, LoginResponse};
use ratatui::{Terminal, backend::CrosstermBackend};
use session::{AuthClient, ChatClient, ExchangeCompletion, ExchangeHandle, RedirectTimer};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::action::{Action, Command};
use super::app::TuiApp;
use crate::auth::{open_browser, receive_redirect};
use crate::config::Config;

/// RAII guard that restores the terminal on drop (even on panic).
struct TerminalGuard;

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(std::io::stdout(), LeaveAlternateScreen);
    }
}

/// In-flight background work owned by the loop.
#[derive(Default)]
struct Tasks {
    probe: Option<JoinHandle<AuthState>>,
    login: Option<JoinHandle<Result<LoginResponse, AuthError>>>,
    redirect: Option<JoinHandle<anyhow::Result<String>>>,
    exchange: Option<JoinHandle<Result<Option<ChannelInfo>, AuthError>>>,
    query: Option<(ExchangeHandle, JoinHandle<ExchangeCompletion>)>,
    redirect_timer: Option<RedirectTimer>,
}

impl Tasks {
    fn abort_all(&mut self) {
        for handle in [
            self.probe.take().map(|h| h.abort_handle()),
            self.login.take().map(|h| h.abort_handle()),
            self.redirect.take().map(|h| h.abort_handle()),
            self.exchange.take().map(|h| h.abort_handle()),
            self.query.take().map(|(_, h)| h.abort_handle()),
        ]
        .into_iter()
        .flatten()
        {
            handle.abort();
        }
        self.redirect_timer = None;
    }
}

/// Run the full-screen TUI until the user quits.
pub async fn run_tui(auth: Arc<AuthClient>, chat: ChatClient, config: Config) -> anyhow::Result<()> {
    // Terminal setup
    enable_raw_mode()?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let _guard = TerminalGuard; // Drop restores terminal

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    debug!(base_url = %config.backend.base_url, "TUI started");

    let mut app = TuiApp::new(config.chat.welcome_message.as_deref());
    let mut session_rx = auth.session().subscribe();
    let mut crossterm_stream = EventStream::new();
    let mut tasks = Tasks::default();

    // The first probe decides which screen leaves `Checking`.
    let probe_client = Arc::clone(&auth);
    tasks.probe = Some(tokio::spawn(async move { probe_client.probe_status().await }));

    // Spinner tick interval (100ms)
    let mut spinner_interval = tokio::time::interval(std::time::Duration::from_millis(100));
    spinner_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        terminal.draw(|frame| app.render(frame))?;

        let Tasks {
            probe,
            login,
            redirect,
            exchange,
            query,
            redirect_timer,
        } = &mut tasks;

        let action = tokio::select! {
            maybe_event = crossterm_stream.next() => {
                match maybe_event {
                    Some(Ok(Event::Key(key))) if key.kind == KeyEventKind::Press => {
                        app.key_action(key)
                    }
                    Some(Ok(_)) => None,
                    Some(Err(e)) => {
                        warn!(error = %e, "Terminal event stream failed");
                        Some(Action::Quit)
                    }
                    None => Some(Action::Quit),
                }
            }

            changed = session_rx.changed() => {
                match changed {
                    Ok(()) => Some(Action::AuthChanged(session_rx.borrow_and_update().clone())),
                    Err(_) => None,
                }
            }

            result = async {
                match probe.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            } => {
                *probe = None;
                let state = result.unwrap_or_else(|join_err| {
                    warn!(error = %join_err, "Status probe task failed");
                    auth.session().snapshot()
                });
                debug!(state = %state.label(), "Initial status probe settled");
                app.update(Action::AuthChanged(state));
                Some(Action::ProbeSettled)
            }

            result = async {
                match login.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            } => {
                *login = None;
                Some(match result {
                    Ok(Ok(login)) => Action::LoginUrlReady(login.authorization_url),
                    Ok(Err(e)) => Action::LoginFailed(e.user_message()),
                    Err(join_err) => Action::LoginFailed(format!("Login task failed: {join_err}")),
                })
            }

            result = async {
                match redirect.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            } => {
                *redirect = None;
                Some(match result {
                    Ok(Ok(target)) => Action::RedirectReceived(target),
                    Ok(Err(e)) => Action::LoginFailed(e.to_string()),
                    Err(join_err) => Action::LoginFailed(format!("Redirect receiver failed: {join_err}")),
                })
            }

            result = async {
                match exchange.as_mut() {
                    Some(handle) => handle.await,
                    None => std::future::pending().await,
                }
            } => {
                *exchange = None;
                Some(match result {
                    Ok(Ok(channel)) => Action::CallbackSucceeded(channel),
                    Ok(Err(e)) => Action::CallbackFailed(e.user_message()),
                    Err(join_err) => Action::CallbackFailed(format!("Exchange task failed: {join_err}")),
                })
            }

            result = async {
                match query.as_mut() {
                    Some((_, handle)) => handle.await,
                    None => std::future::pending().await,
                }
            } => {
                let handle = query.take().map(|(h, _)| h);
                match (result, handle) {
                    (Ok(completion), _) => Some(Action::ApplyCompletion(completion)),
                    (Err(join_err), Some(handle)) => {
                        warn!(error = %join_err, "Query task failed");
                        Some(Action::ApplyCompletion(ExchangeCompletion {
                            handle,
                            result: Err(BackendError::Transport(format!("Query task failed: {join_err}"))),
                        }))
                    }
                    (Err(_), None) => None,
                }
            }

            fired = async {
                match redirect_timer.as_mut() {
                    Some(timer) => timer.fired().await,
                    None => std::future::pending().await,
                }
            } => {
                *redirect_timer = None;
                fired.then_some(Action::RedirectFired)
            }

            _ = spinner_interval.tick(), if app.is_busy() => Some(Action::Tick),
        };

        if let Some(action) = action {
            let command = app.update(action);
            run_command(command, &mut app, &mut tasks, &auth, &chat, &config);
        }

        if app.should_quit {
            break;
        }
    }

    tasks.abort_all();
    // TerminalGuard::drop handles cleanup
    Ok(())
}

/// Starts the side effect requested by `TuiApp::update()`.
fn run_command(
    command: Command,
    app: &mut TuiApp,
    tasks: &mut Tasks,
    auth: &Arc<AuthClient>,
    chat: &ChatClient,
    config: &Config,
) {
    match command {
        Command::None => {}
        Command::SpawnQuery(query) => match chat.begin(&mut app.conversation, &query) {
            Ok(task) => {
                debug!(query_len = %query.len(), "Query task spawned");
                let handle = task.handle();
                tasks.query = Some((handle, tokio::spawn(task.run())));
                app.scroll_to_bottom();
            }
            Err(e) => {
                debug!(error = %e, "Query refused");
                app.update(Action::QueryRejected {
                    query,
                    reason: e.to_string(),
                });
            }
        },
        Command::FetchLoginUrl => {
            let client = Arc::clone(auth);
            tasks.login = Some(tokio::spawn(async move { client.login_url().await }));
        }
        Command::OpenBrowser(url) => {
            open_browser(&url);
            let port = config.oauth.callback_port;
            let path = config.oauth.callback_path.clone();
            let timeout = config.oauth.timeout();
            tasks.redirect = Some(tokio::spawn(async move {
                receive_redirect(port, &path, timeout).await
            }));
        }
        Command::ExchangeRedirect(target) => {
            let client = Arc::clone(auth);
            tasks.exchange = Some(tokio::spawn(async move {
                client.complete_redirect(&target).await
            }));
        }
        Command::ScheduleRedirect => {
            tasks.redirect_timer = Some(RedirectTimer::schedule(config.oauth.redirect_delay()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_guard_drop_path_is_safe() {
        let guard = TerminalGuard;
        drop(guard);
    }

    #[tokio::test]
    async fn abort_all_clears_every_slot() {
        let mut tasks = Tasks {
            probe: Some(tokio::spawn(std::future::pending())),
            redirect_timer: Some(RedirectTimer::schedule(std::time::Duration::from_secs(60))),
            ..Tasks::default()
        };
        tasks.abort_all();
        assert!(tasks.probe.is_none());
        assert!(tasks.redirect_timer.is_none());
    }
}
