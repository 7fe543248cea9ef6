pub mod overlay;
pub mod status_panel;

use std::time::SystemTime;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};

use crate::app::{App, Mode};
use crate::format::format_clock;
use crate::tracker::RunState;
use overlay::{HelpOverlay, LoadPrompt};
use status_panel::StatusPanel;

const HORIZONTAL_MARGIN: u16 = 2;
const VERTICAL_MARGIN: u16 = 1;
const SIDEBAR_WIDTH: u16 = 32;

/// Draw the whole screen. Only reads tracker state, so ticks never change stored durations.
pub fn draw(f: &mut Frame, app: &App, now: SystemTime) {
    let area = f.area();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(30), Constraint::Length(SIDEBAR_WIDTH)])
        .split(area);

    f.render_widget(MainPanel { app, now }, columns[0]);
    f.render_widget(
        StatusPanel {
            tracker: app.tracker(),
            now,
        },
        columns[1],
    );

    match &app.mode {
        Mode::Browse => {}
        Mode::Help => f.render_widget(HelpOverlay, area),
        Mode::Load(input) => f.render_widget(
            LoadPrompt {
                input,
                status: app.status.as_deref(),
            },
            area,
        ),
    }
}

/// Per-item and session counters plus the current image caption
pub struct MainPanel<'a> {
    pub app: &'a App,
    pub now: SystemTime,
}

impl MainPanel<'_> {
    fn item_metric(&self) -> String {
        let tracker = self.app.tracker();
        let Some(item) = tracker.current_item() else {
            return "--:--".to_string();
        };
        let secs = tracker.display_elapsed(item.name(), self.now);
        match tracker.run_state() {
            RunState::Running => format_clock(secs),
            RunState::Paused => format!("⏸ {}", format_clock(secs)),
        }
    }

    fn session_metric(&self) -> String {
        self.app
            .tracker()
            .display_session_elapsed(self.now)
            .map(format_clock)
            .unwrap_or_else(|| format_clock(0))
    }
}

impl Widget for MainPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let dim_style = Style::default().add_modifier(Modifier::DIM);
        let italic_style = Style::default().add_modifier(Modifier::ITALIC);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .vertical_margin(VERTICAL_MARGIN)
            .constraints([
                Constraint::Length(1), // title
                Constraint::Length(3), // metrics
                Constraint::Length(1), // progress caption
                Constraint::Min(1),    // image info
                Constraint::Length(1), // status line
                Constraint::Length(1), // legend
            ])
            .split(area);

        Paragraph::new(Span::styled(
            "sketchtimer",
            bold_style.fg(Color::Cyan),
        ))
        .render(chunks[0], buf);

        let metric_cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(chunks[1]);

        let running = self.app.tracker().is_running();
        let item_style = if running {
            bold_style.fg(Color::Green)
        } else {
            bold_style.fg(Color::Yellow)
        };

        Paragraph::new(Span::styled(self.item_metric(), item_style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("this image"))
            .render(metric_cols[0], buf);

        Paragraph::new(Span::styled(self.session_metric(), bold_style))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title("session"))
            .render(metric_cols[1], buf);

        let tracker = self.app.tracker();
        match tracker.current_item() {
            Some(item) => {
                Paragraph::new(Span::styled(
                    format!(
                        "{} / {} | {}",
                        tracker.current_index() + 1,
                        tracker.items().len(),
                        item.name()
                    ),
                    dim_style,
                ))
                .render(chunks[2], buf);

                let dims = match self.app.current_dimensions() {
                    Some((w, h)) => format!("{w} × {h} px"),
                    None => "size unknown".to_string(),
                };
                Paragraph::new(vec![
                    Line::from(Span::styled(item.path().display().to_string(), italic_style)),
                    Line::from(dims),
                    Line::from(""),
                    Line::from(Span::styled("(o) open in viewer", dim_style)),
                ])
                .wrap(Wrap { trim: true })
                .render(chunks[3], buf);
            }
            None => {
                Paragraph::new(vec![
                    Line::from(Span::styled(
                        "No images loaded. Press (u) to load a file or folder.",
                        Style::default().fg(Color::Blue),
                    )),
                    Line::from(Span::styled(
                        "Tip: a whole folder of references can be loaded at once.",
                        dim_style,
                    )),
                ])
                .wrap(Wrap { trim: true })
                .render(chunks[3], buf);
            }
        }

        if let (Mode::Browse, Some(status)) = (&self.app.mode, self.app.status.as_deref()) {
            Paragraph::new(Span::styled(status, Style::default().fg(Color::Magenta)))
                .render(chunks[4], buf);
        }

        let enabled = |on: bool| if on { italic_style } else { dim_style };
        let legend = Line::from(vec![
            Span::styled("(←) prev", enabled(tracker.can_go_prev())),
            Span::raw(" / "),
            Span::styled("(→) next", enabled(tracker.can_go_next())),
            Span::raw(" / "),
            Span::styled(
                if running { "(space) pause" } else { "(space) resume" },
                italic_style,
            ),
            Span::styled(" / (?) help / (q)uit", italic_style),
        ]);
        Paragraph::new(legend).render(chunks[5], buf);
    }
}
