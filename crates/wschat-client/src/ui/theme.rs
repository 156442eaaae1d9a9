//! Shared theme utilities for the wschat terminal front end.
//!
//! Provides consistent styling across all UI components.

use ratatui::style::{Color, Modifier, Style};
use wschat_core::{ConnectionStatus, Origin};

/// Returns the color for a connection status.
///
/// - Yellow: Connecting
/// - Green: Open
/// - Red: Closed
pub fn status_color(status: ConnectionStatus) -> Color {
    match status {
        ConnectionStatus::Connecting => Color::Yellow,
        ConnectionStatus::Open => Color::Green,
        ConnectionStatus::Closed => Color::Red,
    }
}

/// Prefix rendered before a message line.
pub fn origin_prefix(origin: Origin) -> &'static str {
    match origin {
        Origin::Own => "You: ",
        Origin::Other => "> ",
    }
}

/// Style of the prefix for a message line.
pub fn origin_style(origin: Origin) -> Style {
    match origin {
        Origin::Own => Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
        Origin::Other => Style::default().fg(Color::DarkGray),
    }
}
