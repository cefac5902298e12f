use serde::{Deserialize, Serialize};

/// Identity of the connected channel. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelInfo {
    /// Channel display name (`channel_name` on the wire).
    #[serde(rename = "channel_name", default)]
    pub name: String,
    /// Avatar URL (`thumbnail` on the wire).
    #[serde(rename = "thumbnail", default, skip_serializing_if = "Option::is_none")]
    pub thumbnail_url: Option<String>,
}

impl ChannelInfo {
    pub fn new(name: impl Into<String>, thumbnail_url: Option<String>) -> Self {
        Self {
            name: name.into(),
            thumbnail_url,
        }
    }

    /// Name shown in the header; falls back to "Connected" when blank.
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Connected"
        } else {
            &self.name
        }
    }
}

/// Authentication state of the session
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum AuthState {
    /// No status probe has settled yet.
    #[default]
    Unknown,
    /// The backend confirmed a session, optionally with channel identity.
    Authenticated(Option<ChannelInfo>),
    /// The backend denied a session, or the probe failed (fail-closed).
    Unauthenticated,
}

impl AuthState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }

    /// `true` once the state is no longer `Unknown`.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unknown)
    }

    /// Channel identity, present only when authenticated with channel info.
    pub fn channel(&self) -> Option<&ChannelInfo> {
        match self {
            Self::Authenticated(channel) => channel.as_ref(),
            _ => None,
        }
    }

    /// Short lowercase label used in logs and errors.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Authenticated(_) => "authenticated",
            Self::Unauthenticated => "unauthenticated",
        }
    }

    /// Whether moving from `self` to `next` respects the allowed transitions:
    /// `Unknown → {Authenticated, Unauthenticated}`, `Unauthenticated → Authenticated`,
    /// and `Authenticated → Authenticated` (channel refresh).
    pub fn can_transition_to(&self, next: &AuthState) -> bool {
        match (self, next) {
            (_, Self::Authenticated(_)) => true,
            (Self::Unknown, Self::Unauthenticated) => true,
            (Self::Unauthenticated, Self::Unauthenticated) => true,
            (Self::Unknown, Self::Unknown) => true,
            _ => false,
        }
    }
}

impl std::fmt::Display for AuthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Authenticated(Some(channel)) => {
                write!(f, "authenticated as {}", channel.display_name())
            }
            other => write!(f, "{}", other.label()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn channel() -> ChannelInfo {
        ChannelInfo::new("Tubenor Labs", Some("https://img.example/t.png".to_string()))
    }

    #[test]
    fn channel_info_uses_backend_field_names() {
        let json = serde_json::to_value(channel()).expect("serialize");
        assert_eq!(json["channel_name"], "Tubenor Labs");
        assert_eq!(json["thumbnail"], "https://img.example/t.png");

        let parsed: ChannelInfo =
            serde_json::from_str(r#"{"channel_name":"Solo"}"#).expect("deserialize");
        assert_eq!(parsed.name, "Solo");
        assert_eq!(parsed.thumbnail_url, None);
    }

    #[test]
    fn display_name_falls_back_when_blank() {
        let parsed: ChannelInfo = serde_json::from_str("{}").expect("deserialize");
        assert_eq!(parsed.display_name(), "Connected");
    }

    #[test]
    fn allowed_transitions() {
        let authed = AuthState::Authenticated(Some(channel()));
        assert!(AuthState::Unknown.can_transition_to(&authed));
        assert!(AuthState::Unknown.can_transition_to(&AuthState::Unauthenticated));
        assert!(AuthState::Unauthenticated.can_transition_to(&authed));
        assert!(authed.can_transition_to(&AuthState::Authenticated(None)));
    }

    #[test]
    fn forbidden_transitions() {
        let authed = AuthState::Authenticated(None);
        assert!(!authed.can_transition_to(&AuthState::Unknown));
        assert!(!authed.can_transition_to(&AuthState::Unauthenticated));
        assert!(!AuthState::Unauthenticated.can_transition_to(&AuthState::Unknown));
    }

    #[test]
    fn channel_accessor_and_display() {
        let authed = AuthState::Authenticated(Some(channel()));
        assert_eq!(authed.channel().map(|c| c.name.as_str()), Some("Tubenor Labs"));
        assert_eq!(authed.to_string(), "authenticated as Tubenor Labs");
        assert_eq!(AuthState::Unknown.channel(), None);
        assert!(!AuthState::Unknown.is_terminal());
        assert!(AuthState::Unauthenticated.is_terminal());
    }
}
