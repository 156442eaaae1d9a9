//! Keyboard input handling for the wschat terminal front end.
//!
//! All code follows the panic-free policy: no `.unwrap()`, `.expect()`,
//! `panic!()`, `unreachable!()`, `todo!()`, or direct indexing `[i]`.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::App;

// ============================================================================
// Event Types
// ============================================================================

/// Terminal events forwarded to the main loop by the keyboard task.
#[derive(Debug, Clone)]
pub enum Event {
    /// Keyboard input from the user.
    Key(KeyEvent),

    /// Terminal window resize event.
    Resize(u16, u16),
}

// ============================================================================
// Action Types
// ============================================================================

/// Actions that can result from user input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// No action required.
    None,

    /// Quit the application.
    Quit,

    /// Send the given text. The input is cleared by the caller, and only
    /// if the send succeeds.
    Submit(String),

    /// Close the connection but keep the UI running.
    Disconnect,
}

// ============================================================================
// Input Handler
// ============================================================================

/// Handles a keyboard event and updates application state accordingly.
///
/// # Key Bindings
///
/// | Key                | Action                           |
/// |--------------------|----------------------------------|
/// | `Esc`, `Ctrl+C`    | Quit the application             |
/// | `Ctrl+D`           | Disconnect                       |
/// | `Enter`            | Send the input line              |
/// | `Backspace`        | Delete the last character        |
/// | `Up`, `PageUp`     | Scroll back through messages     |
/// | `Down`, `PageDown` | Scroll towards the newest        |
/// | any printable char | Append to the input line         |
#[must_use]
pub fn handle_key_event(key: KeyEvent, app: &mut App) -> Action {
    if key.kind == KeyEventKind::Release {
        return Action::None;
    }

    if key.modifiers.contains(KeyModifiers::CONTROL) {
        return match key.code {
            KeyCode::Char('c') => {
                app.quit();
                Action::Quit
            }
            KeyCode::Char('d') => Action::Disconnect,
            _ => Action::None,
        };
    }

    match key.code {
        KeyCode::Esc => {
            app.quit();
            Action::Quit
        }
        KeyCode::Enter => Action::Submit(app.input.clone()),
        KeyCode::Backspace => {
            app.pop_char();
            Action::None
        }
        KeyCode::Up | KeyCode::PageUp => {
            app.scroll_up();
            Action::None
        }
        KeyCode::Down | KeyCode::PageDown => {
            app.scroll_down();
            Action::None
        }
        KeyCode::Char(c) => {
            app.push_char(c);
            Action::None
        }
        _ => Action::None,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn key_event(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn key_event_with_mod(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            let _ = handle_key_event(key_event(KeyCode::Char(c)), app);
        }
    }

    #[test]
    fn test_escape_quits() {
        let mut app = App::new("ws://test");
        let action = handle_key_event(key_event(KeyCode::Esc), &mut app);
        assert_eq!(action, Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_c_quits() {
        let mut app = App::new("ws://test");
        let action = handle_key_event(
            key_event_with_mod(KeyCode::Char('c'), KeyModifiers::CONTROL),
            &mut app,
        );
        assert_eq!(action, Action::Quit);
        assert!(app.should_quit);
    }

    #[test]
    fn test_ctrl_d_disconnects() {
        let mut app = App::new("ws://test");
        let action = handle_key_event(
            key_event_with_mod(KeyCode::Char('d'), KeyModifiers::CONTROL),
            &mut app,
        );
        assert_eq!(action, Action::Disconnect);
        assert!(!app.should_quit);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_typing_edits_input() {
        let mut app = App::new("ws://test");
        type_text(&mut app, "hey q");
        assert_eq!(app.input, "hey q");
        assert!(!app.should_quit);

        let _ = handle_key_event(key_event(KeyCode::Backspace), &mut app);
        assert_eq!(app.input, "hey ");
    }

    #[test]
    fn test_enter_submits_without_clearing() {
        let mut app = App::new("ws://test");
        type_text(&mut app, "hello");

        let action = handle_key_event(key_event(KeyCode::Enter), &mut app);
        assert_eq!(action, Action::Submit("hello".to_string()));
        assert_eq!(app.input, "hello");
    }

    #[test]
    fn test_shifted_chars_are_typed() {
        let mut app = App::new("ws://test");
        let _ = handle_key_event(
            key_event_with_mod(KeyCode::Char('H'), KeyModifiers::SHIFT),
            &mut app,
        );
        assert_eq!(app.input, "H");
    }

    #[test]
    fn test_release_events_ignored() {
        let mut app = App::new("ws://test");
        let mut key = key_event(KeyCode::Char('x'));
        key.kind = KeyEventKind::Release;
        assert_eq!(handle_key_event(key, &mut app), Action::None);
        assert!(app.input.is_empty());
    }

    #[test]
    fn test_unhandled_key_returns_none() {
        let mut app = App::new("ws://test");
        let action = handle_key_event(key_event(KeyCode::F(1)), &mut app);
        assert_eq!(action, Action::None);
        assert!(!app.should_quit);
    }
}
