use std::time::SystemTime;

use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Paragraph, Widget},
};

use crate::format::{format_clock, format_hms, truncate_name};
use crate::tracker::{SessionClock, SessionTracker};

const NAME_WIDTH: usize = 10;

/// Sidebar with the session total and the banked time of every item
pub struct StatusPanel<'a> {
    pub tracker: &'a SessionTracker,
    pub now: SystemTime,
}

impl StatusPanel<'_> {
    fn record_lines(&self) -> Vec<ListItem<'static>> {
        let records = self.tracker.records();
        if records.is_empty() {
            return vec![ListItem::new(Span::styled(
                "no records yet",
                Style::default().fg(Color::Gray),
            ))];
        }

        records
            .iter()
            .map(|(name, secs)| {
                let label = truncate_name(name, NAME_WIDTH);
                ListItem::new(Line::from(vec![
                    Span::raw(format!("{label:<width$} ", width = NAME_WIDTH + 3)),
                    Span::styled(
                        format_clock(secs),
                        Style::default().add_modifier(Modifier::BOLD),
                    ),
                ]))
            })
            .collect()
    }
}

impl Widget for StatusPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default().borders(Borders::ALL).title("stats");
        let inner = block.inner(area);
        block.render(area, buf);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // session summary
                Constraint::Length(1), // records heading
                Constraint::Min(0),    // per-item list
            ])
            .split(inner);

        let clock_label = match self.tracker.session_clock() {
            SessionClock::WallClock => "total",
            SessionClock::ActiveOnly => "active",
        };
        let summary = match self.tracker.display_session_elapsed(self.now) {
            Some(secs) => format!("{clock_label} {}", format_hms(secs)),
            None => "not started".to_string(),
        };
        Paragraph::new(vec![
            Line::from(Span::styled(summary, Style::default().fg(Color::Cyan))),
            Line::from(Span::styled(
                format!("{} images", self.tracker.items().len()),
                Style::default().add_modifier(Modifier::DIM),
            )),
        ])
        .render(chunks[0], buf);

        Paragraph::new(Span::styled(
            "per image",
            Style::default().add_modifier(Modifier::UNDERLINED),
        ))
        .render(chunks[1], buf);

        List::new(self.record_lines()).render(chunks[2], buf);
    }
}
