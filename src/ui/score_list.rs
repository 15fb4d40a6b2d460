//! Score list rendering.
//!
//! Lists every note with its resolved string, swara and finger. The current
//! note is highlighted and kept in view; unplayable notes are flagged, and
//! tokens that failed to parse are listed underneath.

use crate::app::App;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

/// Most parse errors shown under the list.
const MAX_ERROR_ROWS: usize = 4;

/// Rows reserved for `count` parse errors.
fn error_rows(count: usize) -> u16 {
    count.min(MAX_ERROR_ROWS) as u16
}

/// Renders the score panel on the right side.
pub fn render_score_list(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Score ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let error_height = error_rows(app.parse_errors.len());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(1),               // Notes
            Constraint::Length(error_height), // Parse errors
        ])
        .split(inner);

    let cursor = app.controller.cursor();
    let items: Vec<ListItem> = app
        .controller
        .notes()
        .iter()
        .enumerate()
        .map(|(i, note)| {
            let activity = if cursor.last_activated == Some(i) {
                Span::styled(
                    "*",
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(" ")
            };

            let pitch = Span::styled(
                format!(" {:3} {:<8}", i + 1, note.western.to_string()),
                Style::default().fg(Color::White),
            );

            let position = match note.position {
                Some(pos) => Span::styled(
                    format!("{:<8} {:<5} f{}", pos.string.display_name(), pos.label, pos.finger),
                    Style::default().fg(Color::Cyan),
                ),
                None => Span::styled("unplayable", Style::default().fg(Color::Red)),
            };

            ListItem::new(Line::from(vec![activity, pitch, position]))
        })
        .collect();

    let list = List::new(items).highlight_style(
        Style::default()
            .bg(Color::DarkGray)
            .add_modifier(Modifier::BOLD),
    );

    let mut state = ListState::default();
    if cursor.index < app.controller.notes().len() {
        state.select(Some(cursor.index));
    }
    frame.render_stateful_widget(list, chunks[0], &mut state);

    if error_height > 0 {
        let lines: Vec<Line> = app
            .parse_errors
            .iter()
            .take(error_height as usize)
            .map(|e| {
                Line::from(Span::styled(
                    e.to_string(),
                    Style::default().fg(Color::Red).add_modifier(Modifier::ITALIC),
                ))
            })
            .collect();
        frame.render_widget(Paragraph::new(lines), chunks[1]);
    }
}
