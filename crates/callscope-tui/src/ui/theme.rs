use ratatui::style::{Color, Modifier, Style};

use callscope_types::LogLevel;

/// Color theme for the application
pub struct Theme;

impl Theme {
    // Base colors
    pub const FG: Color = Color::White;
    pub const FG_DIM: Color = Color::DarkGray;

    // Accent colors
    pub const PRIMARY: Color = Color::Cyan;
    pub const HIGHLIGHT: Color = Color::Yellow;

    // Status colors
    pub const ERROR: Color = Color::Red;

    // Border styles
    pub fn border() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn border_focused() -> Style {
        Style::default().fg(Self::HIGHLIGHT)
    }

    // Text styles
    pub fn title() -> Style {
        Style::default()
            .fg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    pub fn text() -> Style {
        Style::default().fg(Self::FG)
    }

    pub fn text_dim() -> Style {
        Style::default().fg(Self::FG_DIM)
    }

    pub fn text_highlight() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    // Log rows
    pub fn level_tag(level: &LogLevel) -> Style {
        Style::default()
            .fg(level.color())
            .add_modifier(Modifier::BOLD)
    }

    /// Message text: errors and warnings keep their level color
    pub fn level_text(level: &LogLevel) -> Style {
        match level {
            LogLevel::Error => Style::default().fg(Color::Red),
            LogLevel::Warn => Style::default().fg(Color::Yellow),
            _ => Self::text(),
        }
    }

    pub fn row_selected() -> Style {
        Style::default().bg(Color::DarkGray)
    }

    pub fn search_match() -> Style {
        Style::default()
            .fg(Color::Black)
            .bg(Self::HIGHLIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Level toggle in the header, dimmed when the level is hidden
    pub fn level_toggle(level: &LogLevel, visible: bool) -> Style {
        if visible {
            Self::level_tag(level)
        } else {
            Self::text_dim().add_modifier(Modifier::CROSSED_OUT)
        }
    }

    // Status bar
    pub fn status_bar() -> Style {
        Style::default().fg(Self::FG).bg(Color::DarkGray)
    }

    pub fn status_bar_key() -> Style {
        Style::default()
            .fg(Self::HIGHLIGHT)
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD)
    }

    // Error
    pub fn error() -> Style {
        Style::default()
            .fg(Self::ERROR)
            .add_modifier(Modifier::BOLD)
    }
}
