//! Input line widget.

use crate::app::App;
use ratatui::{
    layout::{Position, Rect},
    style::{Color, Style},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

/// Renders the input box and places the cursor after the typed text.
///
/// The box is dimmed when the connection is not open; typing is still
/// allowed so nothing is lost while connecting.
pub fn render_input(frame: &mut Frame, area: Rect, app: &App) {
    let border_style = if app.status.is_open() {
        Style::default()
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let inner_width = usize::from(area.width.saturating_sub(2));
    let typed = app.input.chars().count();
    // Show the tail of long input.
    let skip = (typed + 1).saturating_sub(inner_width);
    let shown: String = app.input.chars().skip(skip).collect();

    let input = Paragraph::new(shown.clone()).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(" Message "),
    );
    frame.render_widget(input, area);

    let cursor_x = area
        .x
        .saturating_add(1)
        .saturating_add(u16::try_from(shown.chars().count()).unwrap_or(u16::MAX));
    frame.set_cursor_position(Position::new(cursor_x, area.y.saturating_add(1)));
}
