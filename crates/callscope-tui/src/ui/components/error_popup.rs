use ratatui::{
    Frame,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};

use crate::ui::{Layout, Theme};

/// Modal popup for load failures and other errors
pub struct ErrorPopup;

impl ErrorPopup {
    pub fn render(frame: &mut Frame, message: &str) {
        let popup_area = Layout::centered_popup(frame.area(), 70, 9);
        frame.render_widget(Clear, popup_area);

        let text = vec![
            Line::from(Span::styled(message.to_string(), Theme::text())),
            Line::from(""),
            Line::from(Span::styled("[Esc] Dismiss", Theme::text_dim())),
        ];

        let popup = Paragraph::new(text).wrap(Wrap { trim: false }).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::error())
                .title(Span::styled(" Error ", Theme::error())),
        );

        frame.render_widget(popup, popup_area);
    }
}
