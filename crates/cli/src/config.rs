use proto::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

/// Top-level client configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Analytics backend connection.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local OAuth redirect receiver.
    #[serde(default)]
    pub oauth: OAuthConfig,

    /// Conversation presentation.
    #[serde(default)]
    pub chat: ChatConfig,
}

/// Backend connection config.
///
/// Configure via `[backend]` in `config.toml` or `TUBENOR_BACKEND_URL`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL every backend path is resolved against.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout.
    #[serde(default = "default_backend_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

fn default_backend_timeout_secs() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_backend_timeout_secs(),
        }
    }
}

impl BackendConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// OAuth redirect receiver config.
///
/// The provider redirects the browser to
/// `http://localhost:{callback_port}{callback_path}`, which must match the
/// redirect URI registered with the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    #[serde(default = "default_callback_port")]
    pub callback_port: u16,
    #[serde(default = "default_callback_path")]
    pub callback_path: String,
    /// How long to wait for the browser redirect.
    #[serde(default = "default_oauth_timeout_secs")]
    pub timeout_secs: u64,
    /// Delay between a successful exchange and returning home.
    #[serde(default = "default_redirect_delay_ms")]
    pub redirect_delay_ms: u64,
}

fn default_callback_port() -> u16 {
    3000
}

fn default_callback_path() -> String {
    "/oauth/callback".to_string()
}

fn default_oauth_timeout_secs() -> u64 {
    120
}

fn default_redirect_delay_ms() -> u64 {
    2000
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            callback_port: default_callback_port(),
            callback_path: default_callback_path(),
            timeout_secs: default_oauth_timeout_secs(),
            redirect_delay_ms: default_redirect_delay_ms(),
        }
    }
}

impl OAuthConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn redirect_delay(&self) -> Duration {
        Duration::from_millis(self.redirect_delay_ms)
    }
}

/// Conversation config.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ChatConfig {
    /// Replaces the built-in welcome turn when set.
    #[serde(default)]
    pub welcome_message: Option<String>,
}

impl Config {
    /// Loads configuration from an explicit path, `./config.toml`, or
    /// `~/.tubenor/config.toml`, then applies environment overrides.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = path.map(|p| p.to_path_buf()).or_else(|| {
            let cwd = std::env::current_dir().ok()?.join("config.toml");
            if cwd.exists() {
                return Some(cwd);
            }
            let home = std::env::var("HOME").ok()?;
            let home_config = PathBuf::from(home).join(".tubenor").join("config.toml");
            if home_config.exists() {
                return Some(home_config);
            }
            None
        });
        debug!(path = ?config_path, "Config file resolved");

        let mut config: Config = if let Some(path) = config_path {
            let content = std::fs::read_to_string(&path).map_err(ConfigError::Io)?;
            toml::from_str(&content).map_err(|e| ConfigError::Toml(e.to_string()))?
        } else {
            Config::default()
        };

        if let Ok(url) = std::env::var("TUBENOR_BACKEND_URL") {
            config.backend.base_url = url;
        }
        if let Ok(port) = std::env::var("TUBENOR_CALLBACK_PORT")
            && let Ok(p) = port.parse::<u16>()
        {
            config.oauth.callback_port = p;
        }
        if let Ok(delay) = std::env::var("TUBENOR_REDIRECT_DELAY_MS")
            && let Ok(ms) = delay.parse::<u64>()
        {
            config.oauth.redirect_delay_ms = ms;
        }

        config.validate()?;
        debug!(
            base_url = %config.backend.base_url,
            callback_port = config.oauth.callback_port,
            "Config loaded"
        );
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let url = self.backend.base_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ConfigError::InvalidValue {
                field: "backend.base_url".to_string(),
                reason: format!("expected an http(s) URL, got '{url}'"),
            });
        }
        if !self.oauth.callback_path.starts_with('/') {
            return Err(ConfigError::InvalidValue {
                field: "oauth.callback_path".to_string(),
                reason: "must start with '/'".to_string(),
            });
        }
        if self.backend.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "backend.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Redirect URI the local receiver answers on.
    pub fn redirect_uri(&self) -> String {
        format!(
            "http://localhost:{}{}",
            self.oauth.callback_port, self.oauth.callback_path
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{remove_env_var, set_env_var, with_locked_env};

    fn write_file(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(path, content).expect("write config");
    }

    fn clear_overrides() {
        remove_env_var("TUBENOR_BACKEND_URL");
        remove_env_var("TUBENOR_CALLBACK_PORT");
        remove_env_var("TUBENOR_REDIRECT_DELAY_MS");
    }

    #[test]
    fn default_config_has_expected_values() {
        let cfg = Config::default();
        assert_eq!(cfg.backend.base_url, "http://localhost:8000");
        assert_eq!(cfg.backend.timeout(), Duration::from_secs(30));
        assert_eq!(cfg.oauth.callback_port, 3000);
        assert_eq!(cfg.oauth.callback_path, "/oauth/callback");
        assert_eq!(cfg.oauth.redirect_delay(), Duration::from_millis(2000));
        assert!(cfg.chat.welcome_message.is_none());
        assert_eq!(cfg.redirect_uri(), "http://localhost:3000/oauth/callback");
    }

    #[test]
    fn load_reads_explicit_file_path() {
        with_locked_env(|| {
            clear_overrides();
            let tmp = tempfile::tempdir().expect("tempdir");
            let config_path = tmp.path().join("config.toml");
            write_file(
                &config_path,
                r#"
[backend]
base_url = "https://api.tubenor.example"
timeout_secs = 10

[oauth]
callback_port = 4100
redirect_delay_ms = 500

[chat]
welcome_message = "Ask me about your channel."
"#,
            );
            let cfg = Config::load(Some(&config_path)).expect("config should parse");
            assert_eq!(cfg.backend.base_url, "https://api.tubenor.example");
            assert_eq!(cfg.backend.timeout_secs, 10);
            assert_eq!(cfg.oauth.callback_port, 4100);
            assert_eq!(cfg.oauth.callback_path, "/oauth/callback");
            assert_eq!(cfg.oauth.redirect_delay_ms, 500);
            assert_eq!(
                cfg.chat.welcome_message.as_deref(),
                Some("Ask me about your channel.")
            );
        });
    }

    #[test]
    fn load_returns_toml_error_for_invalid_content() {
        with_locked_env(|| {
            let tmp = tempfile::tempdir().expect("tempdir");
            let config_path = tmp.path().join("config.toml");
            write_file(&config_path, "[backend\nbase_url = \"broken\"");
            let err = Config::load(Some(&config_path)).expect_err("invalid toml must fail");
            assert!(err.to_string().contains("TOML parse error"));
        });
    }

    #[test]
    fn load_rejects_non_http_base_url() {
        with_locked_env(|| {
            clear_overrides();
            let tmp = tempfile::tempdir().expect("tempdir");
            let config_path = tmp.path().join("config.toml");
            write_file(&config_path, "[backend]\nbase_url = \"localhost:8000\"\n");
            let err = Config::load(Some(&config_path)).expect_err("scheme required");
            assert!(matches!(
                err,
                ConfigError::InvalidValue { ref field, .. } if field == "backend.base_url"
            ));
        });
    }

    #[test]
    fn load_rejects_relative_callback_path() {
        with_locked_env(|| {
            clear_overrides();
            let tmp = tempfile::tempdir().expect("tempdir");
            let config_path = tmp.path().join("config.toml");
            write_file(&config_path, "[oauth]\ncallback_path = \"oauth/callback\"\n");
            let err = Config::load(Some(&config_path)).expect_err("leading slash required");
            assert!(err.to_string().contains("oauth.callback_path"));
        });
    }

    #[test]
    fn load_applies_env_overrides() {
        with_locked_env(|| {
            let tmp = tempfile::tempdir().expect("tempdir");
            let config_path = tmp.path().join("config.toml");
            write_file(&config_path, "[oauth]\ncallback_port = 4100\n");

            set_env_var("TUBENOR_BACKEND_URL", "http://127.0.0.1:9999");
            set_env_var("TUBENOR_CALLBACK_PORT", "4200");
            set_env_var("TUBENOR_REDIRECT_DELAY_MS", "0");

            let cfg = Config::load(Some(&config_path)).expect("config load");
            assert_eq!(cfg.backend.base_url, "http://127.0.0.1:9999");
            assert_eq!(cfg.oauth.callback_port, 4200);
            assert_eq!(cfg.oauth.redirect_delay_ms, 0);

            clear_overrides();
        });
    }

    #[test]
    fn unparsable_numeric_override_is_ignored() {
        with_locked_env(|| {
            let tmp = tempfile::tempdir().expect("tempdir");
            let config_path = tmp.path().join("config.toml");
            write_file(&config_path, "");

            set_env_var("TUBENOR_CALLBACK_PORT", "not-a-port");
            let cfg = Config::load(Some(&config_path)).expect("config load");
            assert_eq!(cfg.oauth.callback_port, 3000);

            clear_overrides();
        });
    }
}
