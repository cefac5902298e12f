//! Advisory session markers persisted across runs.
//!
//! The markers are a cache hint only: a fresh status probe always wins.

use proto::ChannelInfo;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Contents of `~/.tubenor/session.toml`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMarkers {
    /// Set after the last successful code exchange.
    #[serde(default)]
    pub authenticated: bool,
    /// Channel identity returned by that exchange.
    #[serde(default)]
    pub channel_info: Option<ChannelInfo>,
}

impl SessionMarkers {
    /// Default file path: `~/.tubenor/session.toml`.
    pub fn path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".tubenor").join("session.toml")
    }

    /// Load from a specific path, returning `Default` on any error.
    pub fn load_from(path: &Path) -> Self {
        trace!(path = %path.display(), exists = %path.exists(), "Loading session markers");
        std::fs::read_to_string(path)
            .ok()
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    /// Persist to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<(), std::io::Error> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, content)?;
        debug!(path = %path.display(), authenticated = %self.authenticated, "Session markers saved");
        Ok(())
    }
}

/// Where markers live. An ephemeral store keeps nothing on disk.
#[derive(Debug, Clone)]
pub struct MarkerStore {
    path: Option<PathBuf>,
}

impl MarkerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Store backed by [`SessionMarkers::path`].
    pub fn default_location() -> Self {
        Self::new(SessionMarkers::path())
    }

    pub fn ephemeral() -> Self {
        Self { path: None }
    }

    pub fn load(&self) -> SessionMarkers {
        self.path
            .as_deref()
            .map(SessionMarkers::load_from)
            .unwrap_or_default()
    }

    /// Overwrites both markers after a successful exchange.
    pub fn record_exchange(&self, channel: Option<ChannelInfo>) -> Result<(), std::io::Error> {
        let markers = SessionMarkers {
            authenticated: true,
            channel_info: channel,
        };
        match &self.path {
            Some(path) => markers.save_to(path),
            None => Ok(()),
        }
    }

    /// Removes the marker file when it exists.
    pub fn clear(&self) -> Result<(), std::io::Error> {
        match &self.path {
            Some(path) if path.exists() => {
                std::fs::remove_file(path)?;
                debug!(path = %path.display(), "Session markers cleared");
                Ok(())
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_from_missing_file_returns_default() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let markers = SessionMarkers::load_from(&tmp.path().join("missing.toml"));
        assert_eq!(markers, SessionMarkers::default());
    }

    #[test]
    fn load_from_invalid_toml_returns_default() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("session.toml");
        std::fs::write(&path, "not = [valid").expect("write");
        assert_eq!(SessionMarkers::load_from(&path), SessionMarkers::default());
    }

    #[test]
    fn record_exchange_overwrites_both_markers() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = MarkerStore::new(tmp.path().join("nested").join("session.toml"));

        store
            .record_exchange(Some(ChannelInfo::new("First", Some("a.png".to_string()))))
            .expect("record");
        store.record_exchange(None).expect("record");

        let loaded = store.load();
        assert!(loaded.authenticated);
        assert_eq!(loaded.channel_info, None);
    }

    #[test]
    fn record_exchange_keeps_channel_info() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let store = MarkerStore::new(tmp.path().join("session.toml"));
        let channel = ChannelInfo::new("Chan", Some("t.png".to_string()));

        store.record_exchange(Some(channel.clone())).expect("record");
        assert_eq!(store.load().channel_info, Some(channel));
    }

    #[test]
    fn clear_removes_file_and_is_idempotent() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("session.toml");
        let store = MarkerStore::new(&path);

        store.record_exchange(None).expect("record");
        assert!(path.exists());
        store.clear().expect("clear");
        assert!(!path.exists());
        store.clear().expect("second clear");
        assert!(!store.load().authenticated);
    }

    #[test]
    fn ephemeral_store_persists_nothing() {
        let store = MarkerStore::ephemeral();
        store.record_exchange(None).expect("record");
        assert_eq!(store.load(), SessionMarkers::default());
    }

    #[test]
    fn default_path_ends_with_session_toml() {
        let path = SessionMarkers::path();
        assert!(path.ends_with(".tubenor/session.toml"));
    }
}
