//! Layout helpers for the wschat terminal front end.

use ratatui::layout::{Constraint, Direction, Layout, Rect};

/// Main application layout areas.
///
/// The screen is divided into four vertical sections:
/// - Header (3 lines): Title, endpoint and connection status
/// - Messages (fills remaining): The message log
/// - Input (3 lines): The line being composed
/// - Footer (1 line): Notice or keybinding hints
#[derive(Debug, Clone, Copy)]
pub struct AppLayout {
    /// Header area for title and status
    pub header: Rect,
    /// Scrolling message list
    pub messages: Rect,
    /// Input box
    pub input: Rect,
    /// Footer area for hints and notices
    pub footer: Rect,
}

impl AppLayout {
    /// Creates a new AppLayout by splitting the given area.
    pub fn new(area: Rect) -> Self {
        let [header, messages, input, footer] = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(3),    // Messages
                Constraint::Length(3), // Input
                Constraint::Length(1), // Footer
            ])
            .areas(area);

        Self {
            header,
            messages,
            input,
            footer,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_layout_creation() {
        let area = Rect::new(0, 0, 80, 24);
        let layout = AppLayout::new(area);

        assert_eq!(layout.header.y, 0);
        assert_eq!(layout.header.height, 3);

        assert_eq!(layout.messages.y, 3);
        assert_eq!(layout.messages.height, 17);

        assert_eq!(layout.input.height, 3);
        assert_eq!(layout.footer.height, 1);
        assert_eq!(layout.footer.y + layout.footer.height, 24);
    }
}
