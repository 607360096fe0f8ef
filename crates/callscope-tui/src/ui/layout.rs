use ratatui::layout::{Constraint, Direction, Layout as RatatuiLayout, Rect};

/// Areas of the log viewer screen, top to bottom
pub struct LogViewerAreas {
    pub header: Rect,
    pub stats: Option<Rect>,
    pub filter: Option<Rect>,
    pub logs: Rect,
    pub status: Rect,
}

/// Layout helper for consistent screen layouts
pub struct Layout;

impl Layout {
    /// Split the screen into header, optional stats and filter bars, log
    /// list and status bar
    pub fn log_viewer(area: Rect, show_stats: bool, show_filter: bool) -> LogViewerAreas {
        let mut constraints = vec![Constraint::Length(3)]; // Header always
        if show_stats {
            constraints.push(Constraint::Length(3));
        }
        if show_filter {
            constraints.push(Constraint::Length(3));
        }
        constraints.push(Constraint::Min(1)); // Logs
        constraints.push(Constraint::Length(1)); // Status bar

        let chunks = RatatuiLayout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        let mut idx = 1;
        let mut next_optional = |enabled: bool| {
            enabled.then(|| {
                let rect = chunks[idx];
                idx += 1;
                rect
            })
        };
        let stats = next_optional(show_stats);
        let filter = next_optional(show_filter);

        LogViewerAreas {
            header: chunks[0],
            stats,
            filter,
            logs: chunks[chunks.len() - 2],
            status: chunks[chunks.len() - 1],
        }
    }

    /// A centered popup of at most `width` x `height`, leaving a margin
    pub fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
        let popup_width = width.min(area.width.saturating_sub(4));
        let popup_height = height.min(area.height.saturating_sub(4));

        let x = area.x + (area.width.saturating_sub(popup_width)) / 2;
        let y = area.y + (area.height.saturating_sub(popup_height)) / 2;
        Rect::new(x, y, popup_width, popup_height)
    }
}
