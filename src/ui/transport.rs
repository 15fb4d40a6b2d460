//! Transport bar rendering.
//!
//! Displays the playback state, the current note, tempo, loop and volume.

use crate::app::App;
use crate::playback::PlaybackState;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

/// Renders the transport bar at the top of the screen.
pub fn render_transport(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Transport ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Gray));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Length(14), // Playback state
            Constraint::Length(14), // Position
            Constraint::Length(12), // Tempo
            Constraint::Length(10), // Loop
            Constraint::Length(12), // Volume
            Constraint::Min(10),    // Status
        ])
        .split(inner);

    let play_status = match app.controller.state() {
        PlaybackState::Playing => Span::styled(
            " [>] PLAY ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Paused => Span::styled(
            " [||] PAUSE ",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
        PlaybackState::Idle => Span::styled(
            " [.] IDLE ",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(play_status)), chunks[0]);

    let label = Style::default().fg(Color::DarkGray);
    let value = Style::default().fg(Color::White);
    let settings = app.controller.settings();

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Note: ", label),
            Span::styled(app.position_string(), value.add_modifier(Modifier::BOLD)),
        ])),
        chunks[1],
    );

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("BPM: ", label),
            Span::styled(format!("{:.0}", settings.tempo_bpm), value),
        ])),
        chunks[2],
    );

    let loop_style = if settings.looping {
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
    } else {
        label
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::styled("LOOP", loop_style))),
        chunks[3],
    );

    frame.render_widget(
        Paragraph::new(Line::from(vec![
            Span::styled("Vol: ", label),
            Span::styled(format!("{:.0}%", settings.volume * 100.0), value),
        ])),
        chunks[4],
    );

    let status_line = match &app.status_message {
        Some((msg, _)) => Line::from(Span::styled(
            msg.as_str(),
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),
        )),
        None => Line::from(Span::styled("? for help", label)),
    };
    frame.render_widget(Paragraph::new(status_line), chunks[5]);
}
