//! Header and footer widgets for the wschat terminal front end.
//!
//! - Header: title, endpoint, connection status and session identity
//! - Footer: the current notice, or keybinding hints when there is none

use crate::app::App;
use crate::ui::theme::status_color;
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use wschat_core::ConnectionStatus;

/// Renders the header bar with title, endpoint, status and identity.
///
/// The border takes the status color so a dropped connection is visible
/// at a glance.
pub fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let (status_text, status_style) = get_status_display(app.status);

    let header_line = Line::from(vec![
        Span::styled(
            "wschat",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(" - {} | ", app.endpoint)),
        Span::styled(status_text, status_style),
        Span::styled(
            format!(" | id: {}", app.identity_display()),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(header_line).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(status_color(app.status))),
    );

    frame.render_widget(header, area);
}

/// Renders the footer line.
pub fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
    let footer_line = match &app.notice {
        Some(notice) => Line::from(Span::styled(
            format!(" {notice}"),
            Style::default().fg(Color::Yellow),
        )),
        None => hints_line(app.status),
    };

    frame.render_widget(Paragraph::new(footer_line), area);
}

fn hints_line(status: ConnectionStatus) -> Line<'static> {
    let key_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let sep_style = Style::default().fg(Color::DarkGray);

    let mut hints = vec![
        Span::styled(" Enter", key_style),
        Span::raw(" send"),
        Span::styled("  |  ", sep_style),
        Span::styled("Up/Down", key_style),
        Span::raw(" scroll"),
    ];

    if status.is_open() {
        hints.push(Span::styled("  |  ", sep_style));
        hints.push(Span::styled("^D", key_style));
        hints.push(Span::raw(" disconnect"));
    }

    hints.push(Span::styled("  |  ", sep_style));
    hints.push(Span::styled("Esc", key_style));
    hints.push(Span::raw(" quit"));

    Line::from(hints)
}

/// Returns the display text and style for the given connection status.
fn get_status_display(status: ConnectionStatus) -> (&'static str, Style) {
    let text = match status {
        ConnectionStatus::Connecting => "Connecting...",
        ConnectionStatus::Open => "Connected",
        ConnectionStatus::Closed => "Disconnected",
    };
    let style = Style::default()
        .fg(status_color(status))
        .add_modifier(Modifier::BOLD);
    (text, style)
}
