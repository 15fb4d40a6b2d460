//! Terminal user interface components.
//!
//! This module draws the transport bar, the scrolling string lanes and the
//! score list. It only reads application state; all timing decisions are
//! made by the playback controller.

mod help;
mod lanes;
mod score_list;
mod transport;

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::Frame;

pub use help::render_help;
pub use lanes::render_lanes;
pub use score_list::render_score_list;
pub use transport::render_transport;

/// Renders the complete UI layout.
///
/// The layout is divided into:
/// - Top: transport bar with state, position, tempo, loop and volume
/// - Left: string lanes with notes scrolling towards the target line
/// - Right: the score with resolved positions
pub fn render(frame: &mut Frame, app: &App) {
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Transport
            Constraint::Min(10),   // Content area
        ])
        .split(frame.area());

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(44),    // Lanes
            Constraint::Length(36), // Score list
        ])
        .split(main_chunks[1]);

    render_transport(frame, main_chunks[0], app);
    render_lanes(frame, content_chunks[0], app);
    render_score_list(frame, content_chunks[1], app);

    if app.show_help {
        render_help(frame, app.help_scroll);
    }
}

/// Helper function to center a rectangle within another rectangle.
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
