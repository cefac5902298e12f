//! CLI entrypoint and subcommand orchestration.

mod auth;
mod config;
#[cfg(test)]
mod test_support;
mod tui;

use clap::{Parser, Subcommand};
use proto::{AuthState, ChannelInfo};
use session::ExchangeStatus;

#[cfg(not(test))]
use std::sync::Arc;

#[cfg(not(test))]
use config::Config;
#[cfg(not(test))]
use session::{
    AuthClient, Backend, ChatClient, Conversation, HttpBackend, MarkerStore, SessionStore,
};
#[cfg(not(test))]
use tracing::{info, warn};
#[cfg(not(test))]
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Top-level command-line arguments for the tubenor client.
#[derive(Parser)]
#[command(name = "tubenor")]
#[command(about = "YouTube analytics assistant", version = "0.1.0")]
struct Cli {
    /// Path to config file
    #[arg(short, long)]
    config: Option<std::path::PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Enable debug logging to ~/.tubenor/logs
    #[arg(long, default_value_t = false)]
    debug: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// CLI subcommands available in the application.
#[derive(Subcommand)]
enum Commands {
    /// Start the full-screen TUI (default when no subcommand is given)
    Tui,

    /// Probe the backend session and print the result
    Status,

    /// Send one query to the analytics agent and print the answer
    Ask {
        /// Question about your channel
        #[arg(short = 'q', long)]
        query: String,
    },

    /// Sign in with Google through the browser
    Login,

    /// Complete sign-in from a redirect URL copied out of the browser
    Callback {
        /// Full redirect URL (or its query string) containing `code`
        #[arg(value_name = "REDIRECT_URL")]
        url: String,
    },
}

#[cfg(not(test))]
#[tokio::main]
/// Program entrypoint.
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Commands::Tui);
    let is_tui = matches!(command, Commands::Tui);

    // Console output is suppressed in TUI mode so it cannot corrupt the display.
    // `--debug` adds a daily-rotated file log under ~/.tubenor/logs.
    let console_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    // WorkerGuard must outlive main() so buffered file writes are flushed on exit.
    let _file_guard: Option<tracing_appender::non_blocking::WorkerGuard>;

    let debug_writer = if cli.debug {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let log_dir = std::path::PathBuf::from(home).join(".tubenor").join("logs");
        std::fs::create_dir_all(&log_dir).ok();
        let appender = tracing_appender::rolling::daily(&log_dir, "debug.log");
        let (writer, guard) = tracing_appender::non_blocking(appender);
        _file_guard = Some(guard);
        Some(writer)
    } else {
        _file_guard = None;
        None
    };

    match (is_tui, debug_writer) {
        (true, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::sink)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (true, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::sink)
                .with_target(false)
                .init();
        }
        (false, Some(writer)) => {
            let console = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_filter(console_filter);
            let file = fmt::layer()
                .with_writer(writer)
                .with_target(true)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug,hyper_util=info,rustls=info,reqwest=info"));
            tracing_subscriber::registry()
                .with(console)
                .with(file)
                .init();
        }
        (false, None) => {
            fmt()
                .with_env_filter(console_filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .init();
        }
    }

    if cli.debug {
        let cmd_label = match &command {
            Commands::Tui => "tui",
            Commands::Status => "status",
            Commands::Ask { .. } => "ask",
            Commands::Login => "login",
            Commands::Callback { .. } => "callback",
        };
        info!(
            version = env!("CARGO_PKG_VERSION"),
            command = cmd_label,
            log_level = %cli.log_level,
            "========== tubenor session start =========="
        );
    }

    let config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e @ proto::ConfigError::InvalidValue { .. }) => return Err(e.into()),
        Err(e) => {
            warn!("Failed to load config ({e}), using defaults");
            Config::default()
        }
    };
    let clients = Clients::build(&config)?;

    match command {
        Commands::Tui => tui::run_tui(clients.auth, clients.chat, config).await,
        Commands::Status => cmd_status(&clients).await,
        Commands::Ask { query } => cmd_ask(&clients, &config, &query).await,
        Commands::Login => cmd_login(&clients, &config).await,
        Commands::Callback { url } => cmd_callback(&clients, &url).await,
    }
}

/// Backend clients sharing one HTTP connection pool, cookie jar, and session store.
#[cfg(not(test))]
struct Clients {
    auth: Arc<AuthClient>,
    chat: ChatClient,
}

#[cfg(not(test))]
impl Clients {
    fn build(config: &Config) -> anyhow::Result<Self> {
        let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(
            &config.backend.base_url,
            config.backend.timeout(),
        )?);
        let session = Arc::new(SessionStore::new());
        let auth = Arc::new(AuthClient::new(
            Arc::clone(&backend),
            Arc::clone(&session),
            MarkerStore::default_location(),
        ));
        let chat = ChatClient::new(backend, session);
        Ok(Self { auth, chat })
    }
}

#[cfg(not(test))]
/// Prints the settled session state.
async fn cmd_status(clients: &Clients) -> anyhow::Result<()> {
    let state = clients.auth.probe_status().await;
    println!("{}", format_status(&state));
    Ok(())
}

#[cfg(not(test))]
/// Runs one exchange and prints the agent's answer (or fails with the error turn).
async fn cmd_ask(clients: &Clients, config: &Config, query: &str) -> anyhow::Result<()> {
    let state = clients.auth.probe_status().await;
    if !state.is_authenticated() {
        anyhow::bail!("Not signed in. Run `tubenor login` first.");
    }

    let mut conversation = match config.chat.welcome_message.as_deref() {
        Some(welcome) if !welcome.trim().is_empty() => Conversation::with_welcome(welcome),
        _ => Conversation::new(),
    };
    let status = clients.chat.submit_query(&mut conversation, query).await?;
    let answer = conversation
        .last()
        .map(|turn| turn.content().to_string())
        .unwrap_or_default();

    println!("{}", ask_outcome(status, answer)?);
    Ok(())
}

/// Text to print for a finished exchange. A failed exchange becomes the
/// error `main` returns, after the file log guard has flushed.
fn ask_outcome(status: ExchangeStatus, answer: String) -> anyhow::Result<String> {
    match status {
        ExchangeStatus::Succeeded => Ok(answer),
        ExchangeStatus::Failed => Err(anyhow::anyhow!(answer)),
    }
}

#[cfg(not(test))]
/// Browser login: fetch the URL, open it, wait for the redirect, exchange.
async fn cmd_login(clients: &Clients, config: &Config) -> anyhow::Result<()> {
    let login = clients
        .auth
        .login_url()
        .await
        .map_err(|e| anyhow::anyhow!("Could not start sign-in: {}", e.user_message()))?;

    if let Some(instructions) = login.instructions.as_deref() {
        println!("{instructions}");
    }
    println!("Opening browser for Google sign-in...");
    println!("If it does not open, visit:\n  {}", login.authorization_url);
    println!("Waiting for redirect on {} ...", config.redirect_uri());
    auth::open_browser(&login.authorization_url);

    let target = auth::receive_redirect(
        config.oauth.callback_port,
        &config.oauth.callback_path,
        config.oauth.timeout(),
    )
    .await?;

    println!("Processing authentication...");
    let channel = clients
        .auth
        .complete_redirect(&target)
        .await
        .map_err(|e| anyhow::anyhow!("Authentication failed: {}", e.user_message()))?;
    println!("{}", format_signed_in(channel.as_ref()));
    Ok(())
}

#[cfg(not(test))]
/// Exchanges the code from a redirect URL pasted on the command line.
async fn cmd_callback(clients: &Clients, url: &str) -> anyhow::Result<()> {
    let channel = clients
        .auth
        .complete_redirect(url)
        .await
        .map_err(|e| anyhow::anyhow!("Authentication failed: {}", e.user_message()))?;
    println!("{}", format_signed_in(channel.as_ref()));
    Ok(())
}

/// One-line summary of a settled session state.
fn format_status(state: &AuthState) -> String {
    match state {
        AuthState::Authenticated(Some(channel)) => {
            let mut line = format!("Signed in as {}", channel.display_name());
            if let Some(thumbnail) = channel.thumbnail_url.as_deref() {
                line.push_str(&format!(" ({thumbnail})"));
            }
            line
        }
        AuthState::Authenticated(None) => "Signed in".to_string(),
        AuthState::Unauthenticated => {
            "Not signed in. Run `tubenor login` to connect your channel.".to_string()
        }
        AuthState::Unknown => "Session state unknown".to_string(),
    }
}

/// Confirmation printed after a successful code exchange.
fn format_signed_in(channel: Option<&ChannelInfo>) -> String {
    match channel {
        Some(channel) if !channel.name.trim().is_empty() => {
            format!("Authentication successful! Connected as {}.", channel.name)
        }
        _ => "Authentication successful!".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_defaults_to_tui_without_subcommand() {
        let cli = Cli::try_parse_from(["tubenor"]).expect("parse");
        assert!(cli.command.is_none());
        assert_eq!(cli.log_level, "info");
        assert!(!cli.debug);
    }

    #[test]
    fn cli_parses_ask_and_callback() {
        let cli = Cli::try_parse_from(["tubenor", "ask", "-q", "How many views?"]).expect("parse");
        assert!(matches!(cli.command, Some(Commands::Ask { ref query }) if query == "How many views?"));

        let cli = Cli::try_parse_from([
            "tubenor",
            "callback",
            "http://localhost:3000/oauth/callback?code=abc",
        ])
        .expect("parse");
        assert!(matches!(cli.command, Some(Commands::Callback { ref url }) if url.ends_with("code=abc")));
    }

    #[test]
    fn cli_ask_requires_query() {
        assert!(Cli::try_parse_from(["tubenor", "ask"]).is_err());
    }

    #[test]
    fn format_status_covers_every_state() {
        let channel = ChannelInfo::new("Tubenor Labs", Some("https://img.example/t.png".to_string()));
        assert_eq!(
            format_status(&AuthState::Authenticated(Some(channel))),
            "Signed in as Tubenor Labs (https://img.example/t.png)"
        );
        assert_eq!(format_status(&AuthState::Authenticated(None)), "Signed in");
        assert!(format_status(&AuthState::Unauthenticated).starts_with("Not signed in"));
        assert_eq!(format_status(&AuthState::Unknown), "Session state unknown");
    }

    #[test]
    fn failed_ask_becomes_error_instead_of_exit() {
        assert_eq!(
            ask_outcome(ExchangeStatus::Succeeded, "42 views".to_string()).expect("answer"),
            "42 views"
        );
        let err = ask_outcome(
            ExchangeStatus::Failed,
            "Sorry, I encountered an error: quota exceeded".to_string(),
        )
        .expect_err("failed exchange");
        assert_eq!(err.to_string(), "Sorry, I encountered an error: quota exceeded");
    }

    #[test]
    fn format_signed_in_falls_back_without_channel() {
        assert_eq!(format_signed_in(None), "Authentication successful!");
        let blank = ChannelInfo::new("  ", None);
        assert_eq!(format_signed_in(Some(&blank)), "Authentication successful!");
        let named = ChannelInfo::new("Tubenor Labs", None);
        assert_eq!(
            format_signed_in(Some(&named)),
            "Authentication successful! Connected as Tubenor Labs."
        );
    }
}
