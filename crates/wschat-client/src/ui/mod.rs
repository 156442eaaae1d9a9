//! UI rendering module for the wschat terminal front end.
//!
//! # Layout Structure
//!
//! ```text
//! +--------------------------------------------------+
//! |  wschat - endpoint | status | id                 |  <- 3 lines
//! +--------------------------------------------------+
//! |  > hello                                         |
//! |  You: hi there                                   |  <- fills remaining
//! |                                                  |
//! +--------------------------------------------------+
//! |  typed text_                                     |  <- 3 lines
//! +--------------------------------------------------+
//!   notice or keybinding hints                          <- 1 line
//! ```

pub mod input_box;
pub mod layout;
pub mod message_list;
pub mod status_bar;
pub mod theme;

use crate::app::App;
use layout::AppLayout;
use ratatui::Frame;

pub use input_box::render_input;
pub use message_list::render_message_list;
pub use status_bar::{render_footer, render_header};

/// Renders the complete interface.
///
/// # Example
///
/// ```ignore
/// terminal.draw(|frame| {
///     ui::render(frame, &app);
/// })?;
/// ```
pub fn render(frame: &mut Frame, app: &App) {
    let layout = AppLayout::new(frame.area());

    render_header(frame, layout.header, app);
    render_message_list(frame, layout.messages, app);
    render_input(frame, layout.input, app);
    render_footer(frame, layout.footer, app);
}
