use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};

const KEYS: [(&str, &str); 10] = [
    ("← h p", "previous image"),
    ("→ l n", "next image"),
    ("space", "pause / resume timing"),
    ("c", "clear records, keep images"),
    ("x", "clear images"),
    ("u", "load a file or folder"),
    ("e", "export records to csv"),
    ("o", "open image in viewer"),
    ("?", "toggle this help"),
    ("q esc", "quit"),
];

/// Rect of `width` x `height` centered in `area`, clipped to fit
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let [row] = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(height.min(area.height))])
        .flex(Flex::Center)
        .areas(area);
    let [rect] = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(width.min(area.width))])
        .flex(Flex::Center)
        .areas(row);
    rect
}

pub struct HelpOverlay;

impl Widget for HelpOverlay {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(44, KEYS.len() as u16 + 2, area);
        Clear.render(popup, buf);

        let key_style = Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD);
        let lines: Vec<Line> = KEYS
            .iter()
            .map(|(keys, what)| {
                Line::from(vec![
                    Span::styled(format!("{keys:>7}  "), key_style),
                    Span::raw(*what),
                ])
            })
            .collect();

        Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("keys"))
            .render(popup, buf);
    }
}

/// Path input shown while loading a batch
pub struct LoadPrompt<'a> {
    pub input: &'a str,
    pub status: Option<&'a str>,
}

impl Widget for LoadPrompt<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let popup = centered_rect(60, 6, area);
        Clear.render(popup, buf);

        let mut lines = vec![
            Line::from(vec![
                Span::raw("> "),
                Span::styled(self.input, Style::default().add_modifier(Modifier::BOLD)),
                Span::styled("_", Style::default().add_modifier(Modifier::SLOW_BLINK)),
            ]),
            Line::from(Span::styled(
                "(enter) load / (esc) cancel",
                Style::default().add_modifier(Modifier::ITALIC),
            )),
        ];
        if let Some(status) = self.status {
            lines.push(Line::from(Span::styled(
                status,
                Style::default().fg(Color::Red),
            )));
        }

        Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("load images (file or folder)"),
            )
            .render(popup, buf);
    }
}
