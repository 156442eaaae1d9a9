//! Scrolling message list.

use crate::app::App;
use crate::ui::theme::{origin_prefix, origin_style};
use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use wschat_core::DisplayRecord;

/// Renders the message log, newest at the bottom.
///
/// `App::scroll_offset` moves the window back through history; at zero the
/// newest record is always on the last visible row.
pub fn render_message_list(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Messages ");

    let visible_rows = usize::from(area.height.saturating_sub(2));
    let lines: Vec<Line> = visible_records(&app.records, app.scroll_offset, visible_rows)
        .iter()
        .map(record_line)
        .collect();

    let content = if lines.is_empty() {
        Paragraph::new(Line::from(Span::styled(
            "No messages yet",
            Style::default().fg(Color::DarkGray),
        )))
    } else {
        Paragraph::new(lines)
    };

    frame.render_widget(content.block(block), area);
}

/// Formats one record as `You: text` or `> text`.
pub fn record_line(record: &DisplayRecord) -> Line<'_> {
    Line::from(vec![
        Span::styled(origin_prefix(record.origin()), origin_style(record.origin())),
        Span::raw(record.text()),
    ])
}

/// Returns the slice of records that fits in `rows`, ending `offset`
/// records before the newest.
fn visible_records(records: &[DisplayRecord], offset: usize, rows: usize) -> &[DisplayRecord] {
    let end = records.len().saturating_sub(offset);
    let start = end.saturating_sub(rows);
    records.get(start..end).unwrap_or_default()
}
