//! String lane rendering.
//!
//! Draws one column per string. Notes scroll down towards the target line
//! and are highlighted while inside the activation window. Positions come
//! from the controller's draw instructions; this module only converts
//! layout pixels to terminal rows.

use crate::app::App;
use crate::config::LaneLayout;
use crate::fingering::StringId;
use crate::playback::DrawKind;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use std::ops::RangeInclusive;

/// Width of one lane in columns.
const LANE_WIDTH: usize = 10;

/// One drawn cell in a lane.
#[derive(Debug, Clone)]
struct Cell {
    text: String,
    style: Style,
}

/// Converts a layout Y coordinate to a terminal row relative to the target
/// row. Negative values lie above the target line.
fn row_offset(y: f64, layout: &LaneLayout, rows_per_beat: u16) -> i32 {
    let beats = (y - layout.target_line_y) / layout.pixels_per_beat;
    (beats * rows_per_beat as f64).round() as i32
}

/// Grid rows covered by a note that starts at `start` and extends `length`
/// rows upwards, clipped to the visible grid. Empty when fully off screen.
fn visible_rows(start: i32, length: i32, grid_rows: usize) -> RangeInclusive<i32> {
    let top = start.saturating_sub(length.saturating_sub(1)).max(0);
    let bottom = start.min(grid_rows as i32 - 1);
    top..=bottom
}

/// Centers `text` in a lane-wide cell.
fn centered(text: &str) -> String {
    format!("{:^width$}", text, width = LANE_WIDTH)
}

/// Renders the string lanes.
pub fn render_lanes(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Fingerboard ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    if inner.height < 3 {
        return;
    }

    // First row holds the lane headers
    let grid_rows = inner.height as usize - 1;
    let target_row = (grid_rows * 3 / 4) as i32;
    let layout = app.controller.scroller().layout();
    let notes = app.controller.notes();

    let mut grid: Vec<[Option<Cell>; 4]> = vec![Default::default(); grid_rows];
    let mut header: [Option<Cell>; 4] = Default::default();

    for instruction in &app.frame.instructions {
        match instruction.kind {
            DrawKind::Lane(string) => {
                let style = if instruction.is_active {
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default().fg(Color::Cyan)
                };
                header[string.index()] = Some(Cell {
                    text: instruction.label.clone(),
                    style,
                });
            }
            DrawKind::Note { index, string } => {
                let Some(position) = notes.get(index).and_then(|n| n.position) else {
                    continue;
                };
                let start =
                    target_row.saturating_add(row_offset(instruction.y, layout, app.rows_per_beat));
                let length = (notes[index].western.duration_beats * app.rows_per_beat as f64)
                    .round()
                    .max(1.0) as i32;

                let style = if instruction.is_active {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Green)
                        .add_modifier(Modifier::BOLD)
                } else if index == app.controller.cursor().index {
                    Style::default().fg(Color::Yellow)
                } else {
                    Style::default().fg(Color::White)
                };

                // Label on the start row, tail above it for the rest of the note
                for row in visible_rows(start, length, grid_rows).rev() {
                    let slot = &mut grid[row as usize][string.index()];
                    if slot.is_some() {
                        continue;
                    }
                    let text = if row == start {
                        format!("{} {}", instruction.label, position.finger)
                    } else {
                        "┃".to_string()
                    };
                    *slot = Some(Cell { text, style });
                }
            }
        }
    }

    let mut lines: Vec<Line> = Vec::with_capacity(inner.height as usize);

    let header_spans: Vec<Span> = StringId::ALL
        .iter()
        .map(|string| match &header[string.index()] {
            Some(cell) => Span::styled(centered(&cell.text), cell.style),
            None => Span::raw(centered("")),
        })
        .collect();
    lines.push(Line::from(header_spans));

    for (row, cells) in grid.iter().enumerate() {
        let is_target = row as i32 == target_row;
        let spans: Vec<Span> = cells
            .iter()
            .map(|cell| match cell {
                Some(cell) => Span::styled(centered(&cell.text), cell.style),
                None if is_target => Span::styled(
                    "─".repeat(LANE_WIDTH),
                    Style::default().fg(Color::Yellow),
                ),
                None => Span::styled(centered("│"), Style::default().fg(Color::DarkGray)),
            })
            .collect();
        lines.push(Line::from(spans));
    }

    frame.render_widget(Paragraph::new(lines), inner);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_offset() {
        let layout = LaneLayout::default();
        assert_eq!(row_offset(layout.target_line_y, &layout, 3), 0);
        // One beat above the line
        let y = layout.target_line_y - layout.pixels_per_beat;
        assert_eq!(row_offset(y, &layout, 3), -3);
        let y = layout.target_line_y + layout.pixels_per_beat / 2.0;
        assert_eq!(row_offset(y, &layout, 4), 2);
    }

    #[test]
    fn test_centered_width() {
        assert_eq!(centered("Ga3 2").chars().count(), LANE_WIDTH);
    }

    #[test]
    fn test_visible_rows_clip_to_grid() {
        assert_eq!(visible_rows(10, 3, 20), 8..=10);
        assert_eq!(visible_rows(1, 5, 20), 0..=1);
        assert_eq!(visible_rows(25, 10, 20), 16..=19);
        assert!(visible_rows(-1, 3, 20).is_empty());
        assert!(visible_rows(40, 3, 20).is_empty());
        assert_eq!(visible_rows(i32::MAX, i32::MAX, 20), 1..=19);
        assert_eq!(visible_rows(i32::MIN, i32::MAX, 20).count(), 0);
    }

    #[test]
    fn test_very_long_note_renders() {
        use crate::audio::{AudioBackend, SilentBackend};
        use crate::config::PlaybackSettings;
        use crate::fingering::map_score;
        use crate::pitch::parse_sequence;
        use crate::playback::PlaybackController;
        use ratatui::backend::TestBackend;
        use ratatui::Terminal;

        let backend: Box<dyn AudioBackend> = Box::new(SilentBackend::default());
        let mut controller =
            PlaybackController::new(backend, PlaybackSettings::default(), LaneLayout::default())
                .unwrap();
        let notes: Vec<_> = parse_sequence("D4:1e9 E4")
            .into_iter()
            .map(Result::unwrap)
            .collect();
        controller.load_score(map_score(&notes));
        let app = App::new(controller, Vec::new());

        let mut terminal = Terminal::new(TestBackend::new(80, 30)).unwrap();
        terminal
            .draw(|frame| {
                let area = frame.area();
                render_lanes(frame, area, &app);
            })
            .unwrap();
        let text: String = terminal
            .backend()
            .buffer()
            .content()
            .iter()
            .map(|cell| cell.symbol())
            .collect();
        assert!(text.contains("Sa 0"));
    }
}
