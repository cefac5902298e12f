//! Centralized TUI theme built on ratatui's Tailwind CSS palette.

use ratatui::style::Color;
use ratatui::style::palette::tailwind;

/// The application theme. All visual tokens live here.
pub struct Theme {
    // ── Base ──
    pub bg: Color,
    pub fg: Color,
    /// Dimmed foreground for less prominent text.
    pub fg_dim: Color,
    /// Muted foreground for minimal-emphasis elements.
    pub fg_muted: Color,
    pub border: Color,
    /// Border color for the active/focused widget.
    pub border_active: Color,

    // ── Accent / Brand ──
    /// Primary accent/brand color.
    pub accent: Color,
    pub logo: Color,

    // ── Semantic ──
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // ── Chat roles ──
    /// Label color for user turns.
    pub user_label: Color,
    /// Label color for agent turns.
    pub assistant_label: Color,
    /// Timestamp next to a turn label.
    pub turn_time: Color,
    /// Example query text on a fresh conversation.
    pub example: Color,

    // ── Status bar ──
    pub status_spinner: Color,
    pub status_hint: Color,
    /// Channel name shown in the title bar.
    pub status_channel: Color,
}

impl Theme {
    /// The default dark theme using Tailwind palette.
    pub const fn default_dark() -> Self {
        Self {
            // Base
            bg: tailwind::SLATE.c950,
            fg: tailwind::SLATE.c100,
            fg_dim: tailwind::SLATE.c400,
            fg_muted: tailwind::SLATE.c500,
            border: tailwind::SLATE.c700,
            border_active: tailwind::RED.c500,

            // Accent
            accent: tailwind::RED.c500,
            logo: tailwind::RED.c400,

            // Semantic
            success: tailwind::EMERALD.c500,
            warning: tailwind::AMBER.c500,
            error: tailwind::RED.c400,
            info: tailwind::SKY.c500,

            // Chat
            user_label: tailwind::CYAN.c400,
            assistant_label: tailwind::RED.c400,
            turn_time: tailwind::SLATE.c600,
            example: tailwind::SKY.c300,

            // Status bar
            status_spinner: tailwind::AMBER.c400,
            status_hint: tailwind::SLATE.c500,
            status_channel: tailwind::EMERALD.c400,
        }
    }
}

/// Global theme instance.
pub const THEME: Theme = Theme::default_dark();

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_dark_theme_has_distinct_colors() {
        let theme = Theme::default_dark();
        assert_ne!(theme.bg, theme.fg);
        assert_ne!(theme.success, theme.error);
        assert_ne!(theme.user_label, theme.assistant_label);
    }
}
