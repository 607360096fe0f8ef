use ratatui::{
    Frame,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
};

use crate::ui::{Layout, Theme};

/// Help overlay showing keybindings
pub struct HelpOverlay;

impl HelpOverlay {
    pub fn render(frame: &mut Frame) {
        let popup_area = Layout::centered_popup(frame.area(), 50, 32);

        // Clear the background
        frame.render_widget(Clear, popup_area);

        let help_text = vec![
            Line::from(Span::styled(
                "Keybindings",
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Self::section("Navigation"),
            Self::key_line("j/↓", "Next line"),
            Self::key_line("k/↑", "Previous line"),
            Self::key_line("Ctrl+d", "Page down"),
            Self::key_line("Ctrl+u", "Page up"),
            Self::key_line("g", "First line"),
            Self::key_line("G", "Last line"),
            Self::key_line("Enter", "Expand/collapse data"),
            Line::from(""),
            Self::section("View"),
            Self::key_line("1", "Toggle debug"),
            Self::key_line("2", "Toggle log"),
            Self::key_line("3", "Toggle warn"),
            Self::key_line("4", "Toggle error"),
            Self::key_line("5", "Toggle other levels"),
            Self::key_line("o", "Toggle asc/desc order"),
            Self::key_line("t", "Toggle timestamps"),
            Self::key_line("s", "Toggle stats bar"),
            Line::from(""),
            Self::section("Actions"),
            Self::key_line("/", "Search data"),
            Self::key_line("n", "Clear search"),
            Self::key_line("i", "Toggle case sensitivity"),
            Self::key_line("R", "Reload file"),
            Self::key_line("?", "Toggle this help"),
            Self::key_line("Esc", "Close popup"),
            Self::key_line("q", "Quit"),
        ];

        let help_widget = Paragraph::new(help_text).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Theme::PRIMARY))
                .title(Span::styled(" Help ", Theme::title())),
        );

        frame.render_widget(help_widget, popup_area);
    }

    fn section(title: &str) -> Line<'_> {
        Line::from(Span::styled(title, Style::default().fg(Color::Yellow)))
    }

    fn key_line<'a>(key: &'a str, desc: &'a str) -> Line<'a> {
        Line::from(vec![
            Span::styled(format!("  {:>8}", key), Style::default().fg(Color::Green)),
            Span::styled(format!("  {}", desc), Theme::text()),
        ])
    }
}
