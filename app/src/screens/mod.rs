//! Screen modules for the TUI.

pub mod claim;
pub mod connect;
pub mod video;

use crate::app::App;
use ratatui::{
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Trait for TUI screens.
pub trait Screen {
    fn render(&self, frame: &mut Frame, area: Rect, app: &App);
}

/// Title bar shared by all screens: `" TITLE │ status"`.
pub(crate) fn title_bar<'a>(title: &'a str, status: &'a str, color: Color) -> Paragraph<'a> {
    Paragraph::new(Line::from(vec![
        Span::styled(
            format!(" {} ", title),
            Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        ),
        Span::styled("│ ", Style::default().fg(Color::DarkGray)),
        Span::styled(status, Style::default().fg(color)),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(Style::default().fg(Color::DarkGray)),
    )
}

/// Footer: app-level error or status if present, otherwise key hints.
pub(crate) fn render_footer(frame: &mut Frame, area: Rect, app: &App, hints: &[(&str, &str)]) {
    let content = if let Some(err) = &app.error_message {
        Line::from(vec![
            Span::styled(" ✗ ", Style::default().fg(Color::Red)),
            Span::styled(err.as_str(), Style::default().fg(Color::Red)),
        ])
    } else if let Some(status) = &app.status_message {
        Line::from(vec![
            Span::styled(" ✓ ", Style::default().fg(Color::Green)),
            Span::styled(status.as_str(), Style::default().fg(Color::Green)),
        ])
    } else {
        let mut spans = Vec::new();
        for (i, (key, label)) in hints.iter().enumerate() {
            if i > 0 {
                spans.push(Span::styled("  ", Style::default()));
            }
            spans.push(Span::styled(format!("[{}] ", key), Style::default().fg(Color::DarkGray)));
            spans.push(Span::styled(*label, Style::default().fg(Color::DarkGray)));
        }
        Line::from(spans)
    };

    frame.render_widget(Paragraph::new(content).alignment(Alignment::Center), area);
}

/// One "label  value" line inside an info card.
pub(crate) fn field<'a>(label: &'a str, value: String, color: Color) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("  {:<9}", label), Style::default().fg(Color::DarkGray)),
        Span::styled(value, Style::default().fg(color)),
    ])
}
