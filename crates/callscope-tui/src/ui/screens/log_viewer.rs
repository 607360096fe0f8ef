use ratatui::{
    Frame,
    layout::{Margin, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Scrollbar, ScrollbarOrientation, ScrollbarState},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::app::AppState;
use crate::ui::components::{StatusBar, log_viewer_hints};
use crate::ui::{Layout, Theme};
use callscope_logs::format::{data_to_pretty, data_to_text};
use callscope_logs::{LogStore, ViewFilter};
use callscope_types::{InternalLogEntry, LogLevel};

const SPINNER: [&str; 4] = ["|", "/", "-", "\\"];

/// Log viewer screen
pub struct LogViewerScreen;

impl LogViewerScreen {
    pub fn render(frame: &mut Frame, state: &mut AppState, store: &LogStore, tick: usize) {
        state.refresh_view(store);

        let show_filter_bar = state.ui_state.search_active
            || state.ui_state.view.has_pattern()
            || state.ui_state.filter_error.is_some();
        let areas = Layout::log_viewer(frame.area(), state.ui_state.stats_visible, show_filter_bar);

        Self::render_header(frame, areas.header, state, store, tick);
        if let Some(area) = areas.stats {
            Self::render_stats_bar(frame, area, store);
        }
        if let Some(area) = areas.filter {
            Self::render_filter_bar(frame, area, state);
        }
        Self::render_logs(frame, areas.logs, state, store);
        Self::render_status_bar(frame, areas.status, state, store);
    }

    fn render_header(frame: &mut Frame, area: Rect, state: &AppState, store: &LogStore, tick: usize) {
        let source = store.source().unwrap_or_else(|| "no file".to_string());
        let levels = state.ui_state.view.levels();

        let mut spans = vec![
            Span::styled("callscope", Theme::title()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(source, Theme::text_highlight()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(format!("{} records", store.len()), Theme::text()),
            Span::styled(" │ ", Theme::text_dim()),
            Span::styled(state.ui_state.view.order().label(), Theme::text()),
            Span::styled(" │", Theme::text_dim()),
        ];

        for level in [
            LogLevel::Debug,
            LogLevel::Log,
            LogLevel::Warn,
            LogLevel::Error,
            LogLevel::default(),
        ] {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(
                level.tag(),
                Theme::level_toggle(&level, levels.allows(&level)),
            ));
        }

        if store.is_loading() {
            spans.push(Span::styled(" │ ", Theme::text_dim()));
            spans.push(Span::styled(
                format!("{} loading", SPINNER[tick % SPINNER.len()]),
                Theme::text_highlight(),
            ));
        }

        let header = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border()),
        );

        frame.render_widget(header, area);
    }

    fn render_stats_bar(frame: &mut Frame, area: Rect, store: &LogStore) {
        let counts = store.level_counts();

        let mut spans = vec![Span::raw(" ")];
        for (level, count) in [
            (LogLevel::Error, counts.error),
            (LogLevel::Warn, counts.warn),
            (LogLevel::Log, counts.log),
            (LogLevel::Debug, counts.debug),
        ] {
            spans.push(Span::styled(format!("{}:", level.tag()), Theme::level_tag(&level)));
            spans.push(Span::styled(format!("{} ", count), Theme::text()));
        }

        // Other levels (only if > 0)
        if counts.external > 0 {
            let other = LogLevel::default();
            spans.push(Span::styled(format!("{}:", other.tag()), Theme::level_tag(&other)));
            spans.push(Span::styled(format!("{} ", counts.external), Theme::text()));
        }

        spans.push(Span::styled("│ ", Theme::text_dim()));
        spans.push(Span::styled("Total:", Theme::text_dim()));
        spans.push(Span::styled(counts.total().to_string(), Theme::text()));

        let stats_widget = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(" Stats ", Theme::title())),
        );

        frame.render_widget(stats_widget, area);
    }

    fn render_filter_bar(frame: &mut Frame, area: Rect, state: &AppState) {
        let ui = &state.ui_state;
        let mut spans = vec![];

        if ui.search_active {
            spans.push(Span::styled(" /", Theme::text_highlight()));
            spans.push(Span::styled(ui.search_input.clone(), Theme::text_highlight()));
            spans.push(Span::styled(
                "█",
                Theme::text_highlight().add_modifier(Modifier::SLOW_BLINK),
            ));
        } else {
            spans.push(Span::styled(" Search: ", Theme::text_dim()));
            spans.push(Span::styled(
                ui.view.pattern().to_string(),
                Theme::text_highlight(),
            ));
        }

        if let Some(err) = &ui.filter_error {
            spans.push(Span::raw(" "));
            spans.push(Span::styled(format!("⚠ {}", err), Theme::error()));
        }

        let case_text = if ui.filter_case_insensitive {
            "  [i] case-insensitive"
        } else {
            "  [I] case-sensitive"
        };
        spans.push(Span::styled(case_text, Theme::text_dim()));

        let hints = if ui.search_active {
            "  [Enter] Apply  [Esc] Cancel"
        } else {
            "  [n] Clear  [/] Edit"
        };
        spans.push(Span::styled(hints, Theme::text_dim()));

        let border_style = if ui.search_active {
            Theme::border_focused()
        } else if ui.filter_error.is_some() {
            Theme::error()
        } else {
            Theme::border()
        };

        let filter_bar = Paragraph::new(Line::from(spans)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Search ", Theme::title())),
        );

        frame.render_widget(filter_bar, area);
    }

    fn render_logs(frame: &mut Frame, area: Rect, state: &mut AppState, store: &LogStore) {
        let inner_height = area.height.saturating_sub(2) as usize;
        // 2 for borders, 2 for scrollbar
        let inner_width = area.width.saturating_sub(4) as usize;
        let total = state.visible_len();
        state.ui_state.page_height = inner_height;

        let lines = store.with_records(|records| {
            let ui = &state.ui_state;
            let indices = &ui.view_cache.indices;
            let record_at = |pos: usize| indices.get(pos).and_then(|&i| records.get(i));
            let row_height = |pos: usize| -> usize {
                match record_at(pos) {
                    Some(record) if ui.expanded.contains(&record.key) => {
                        data_to_pretty(record.entry.data()).lines().count().max(1)
                    }
                    _ => 1,
                }
            };

            let scroll = adjust_scroll(ui.scroll, ui.selected, total, inner_height, row_height);

            let mut lines = Vec::with_capacity(inner_height);
            for pos in scroll..total {
                if lines.len() >= inner_height {
                    break;
                }
                let Some(record) = record_at(pos) else {
                    break;
                };
                let row = format_record_lines(
                    record,
                    &ui.view,
                    ui.show_timestamps,
                    ui.expanded.contains(&record.key),
                    pos == ui.selected,
                    inner_width,
                );
                lines.extend(row);
            }
            lines.truncate(inner_height);
            (scroll, lines)
        });
        let (scroll, mut lines) = lines;
        state.ui_state.scroll = scroll;

        if lines.is_empty() {
            let message = if store.is_loading() {
                "Loading..."
            } else if store.is_empty() {
                "No log entries"
            } else {
                "No entries match the current filters"
            };
            lines.push(Line::from(Span::styled(message, Theme::text_dim())));
        }

        let title = if state.ui_state.view.is_empty() {
            format!(" Logs ({}) ", total)
        } else {
            format!(" Logs ({} of {}) ", total, store.len())
        };

        let logs_widget = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Theme::border())
                .title(Span::styled(title, Theme::title())),
        );

        frame.render_widget(logs_widget, area);

        if total > inner_height {
            let scrollbar = Scrollbar::new(ScrollbarOrientation::VerticalRight)
                .begin_symbol(Some("▲"))
                .end_symbol(Some("▼"));
            let mut scrollbar_state = ScrollbarState::default()
                .content_length(total)
                .position(state.ui_state.selected);

            frame.render_stateful_widget(
                scrollbar,
                area.inner(Margin {
                    vertical: 1,
                    horizontal: 0,
                }),
                &mut scrollbar_state,
            );
        }
    }

    fn render_status_bar(frame: &mut Frame, area: Rect, state: &AppState, store: &LogStore) {
        let counts = store.level_counts();
        let position = if state.visible_len() == 0 {
            0
        } else {
            state.ui_state.selected + 1
        };
        let right = format!(
            "E:{} W:{} | {}/{}",
            counts.error,
            counts.warn,
            position,
            state.visible_len()
        );

        frame.render_widget(StatusBar::new().hints(log_viewer_hints()).right(right), area);
    }
}

/// First row to draw so that `selected` is on screen, given per-row heights
fn adjust_scroll(
    scroll: usize,
    selected: usize,
    total: usize,
    height: usize,
    row_height: impl Fn(usize) -> usize,
) -> usize {
    if total == 0 || height == 0 {
        return 0;
    }
    let selected = selected.min(total - 1);
    let mut scroll = scroll.min(selected);

    let mut used: usize = (scroll..=selected).map(&row_height).sum();
    while used > height && scroll < selected {
        used -= row_height(scroll);
        scroll += 1;
    }
    scroll
}

/// Format a record into one line, or several when its data is expanded
fn format_record_lines(
    record: &InternalLogEntry,
    view: &ViewFilter,
    show_timestamps: bool,
    expanded: bool,
    selected: bool,
    available_width: usize,
) -> Vec<Line<'static>> {
    let entry = &record.entry;
    let level = entry.level();
    let mut prefix = Vec::new();
    let mut prefix_width = 0;

    prefix.push(Span::styled(
        if selected { "▶ " } else { "  " },
        Theme::text_highlight(),
    ));
    prefix_width += 2;

    if show_timestamps {
        let stamp = format!("{} ", entry.timestamp());
        prefix_width += stamp.width();
        prefix.push(Span::styled(stamp, Theme::text_dim()));
    }

    prefix.push(Span::styled(level.tag(), Theme::level_tag(&level)));
    prefix.push(Span::styled(" │ ", Theme::text_dim()));
    prefix_width += 6;

    let text_style = Theme::level_text(&level);
    let message_width = available_width.saturating_sub(prefix_width);

    let mut lines = if expanded {
        let pretty = data_to_pretty(entry.data());
        let mut lines = Vec::new();
        for (i, text) in pretty.lines().enumerate() {
            let mut spans = if i == 0 {
                prefix.clone()
            } else {
                vec![Span::raw(" ".repeat(prefix_width))]
            };
            spans.push(Span::styled(text.to_string(), text_style));
            lines.push(Line::from(spans));
        }
        if lines.is_empty() {
            lines.push(Line::from(prefix));
        }
        lines
    } else {
        let text = truncate_to_width(&data_to_text(entry.data()), message_width);
        let mut spans = prefix;
        spans.extend(highlight(&text, view, text_style));
        vec![Line::from(spans)]
    };

    if selected {
        for line in &mut lines {
            line.style = Theme::row_selected();
        }
    }
    lines
}

/// Split text into spans, marking search matches
fn highlight(text: &str, view: &ViewFilter, base: Style) -> Vec<Span<'static>> {
    let matches = view.find_matches(text);
    if matches.is_empty() {
        return vec![Span::styled(text.to_string(), base)];
    }

    let mut spans = Vec::new();
    let mut last_end = 0;
    for (start, end) in matches {
        if start > last_end {
            spans.push(Span::styled(text[last_end..start].to_string(), base));
        }
        spans.push(Span::styled(text[start..end].to_string(), Theme::search_match()));
        last_end = end;
    }
    if last_end < text.len() {
        spans.push(Span::styled(text[last_end..].to_string(), base));
    }
    spans
}

/// Cut text to a display width, marking the cut with "..."
fn truncate_to_width(text: &str, max_width: usize) -> String {
    // Single line only; expanded rows show the rest
    let text = text.lines().next().unwrap_or("");
    if text.width() <= max_width {
        return text.to_string();
    }

    let budget = max_width.saturating_sub(3);
    let mut out = String::new();
    let mut width = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if width + w > budget {
            break;
        }
        width += w;
        out.push(c);
    }
    out.push_str("...");
    out
}
