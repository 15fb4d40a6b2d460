//! sthana - Carnatic violin fingering player for the terminal.
//!
//! Reads a melody as note tokens, resolves every note to a string, swara and
//! finger, and plays it back with the notes scrolling down four string lanes.
//!
//! # Usage
//!
//! ```bash
//! sthana D4 E4 F#4 G4 A4:2          # play a melody
//! sthana --file melody.txt --loop   # read tokens from a file
//! sthana --print D4 E4 F#4          # print the fingering table and exit
//! ```
//!
//! Press `?` for help with keyboard shortcuts.

mod app;
mod audio;
mod config;
mod fingering;
mod pitch;
mod playback;
mod ui;

use app::{App, TEMPO_STEP, VOLUME_STEP};
use audio::{AudioBackend, AudioEngine, SilentBackend};
use config::{LaneLayout, PlaybackSettings};
use fingering::{map_score, ResolvedNote};
use pitch::{parse_sequence, PitchError, WesternNote};
use playback::PlaybackController;

use anyhow::{bail, Context, Result};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io::{self, Stdout};
use std::path::PathBuf;
use std::time::Duration;

/// Melody used when no notes are given: D major scale up and down.
const DEFAULT_MELODY: &str = "D4 E4 F#4 G4 A4 B4 C#5 D5:2 C#5 B4 A4 G4 F#4 E4 D4:2";

/// Command-line options for the application.
#[derive(Debug, Default)]
struct CliOptions {
    /// Tempo in beats per minute.
    tempo: Option<f64>,
    /// Start with looping enabled.
    looping: bool,
    /// Initial volume, 0.0 to 1.0.
    volume: Option<f32>,
    /// SoundFont for the violin voice. Sine tones otherwise.
    soundfont: Option<PathBuf>,
    /// Run without audio output.
    mute: bool,
    /// Print the fingering table instead of starting the player.
    print: bool,
    /// Print the resolved score as JSON instead of starting the player.
    json: bool,
    /// File to read note tokens from.
    file: Option<PathBuf>,
    /// Note tokens given on the command line.
    notes: Vec<String>,
}

impl CliOptions {
    /// Parses command-line arguments.
    ///
    /// Supports:
    /// - `--tempo <bpm>` or `-t <bpm>`
    /// - `--loop` or `-l`
    /// - `--volume <0..1>` or `-v <0..1>`
    /// - `--soundfont <path>` or `-sf <path>`
    /// - `--mute` or `-m`
    /// - `--print` or `-p`, `--json` or `-j`
    /// - `--file <path>` or `-f <path>`
    /// - `--help` or `-h`: Print help and exit
    /// - anything else is a note token
    fn parse() -> Result<Self> {
        Self::parse_from(std::env::args().skip(1))
    }

    fn parse_from(args: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut options = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .with_context(|| format!("{} requires a value", flag))
            };
            match arg.as_str() {
                "--tempo" | "-t" => {
                    let raw = value("--tempo")?;
                    options.tempo = Some(
                        raw.parse()
                            .with_context(|| format!("Invalid tempo: {}", raw))?,
                    );
                }
                "--volume" | "-v" => {
                    let raw = value("--volume")?;
                    options.volume = Some(
                        raw.parse()
                            .with_context(|| format!("Invalid volume: {}", raw))?,
                    );
                }
                "--soundfont" | "-sf" => {
                    options.soundfont = Some(PathBuf::from(value("--soundfont")?));
                }
                "--file" | "-f" => options.file = Some(PathBuf::from(value("--file")?)),
                "--loop" | "-l" => options.looping = true,
                "--mute" | "-m" => options.mute = true,
                "--print" | "-p" => options.print = true,
                "--json" | "-j" => options.json = true,
                "--help" | "-h" => {
                    print_help();
                    std::process::exit(0);
                }
                other if other.starts_with("--") => {
                    bail!("Unknown option: {} (use --help for usage information)", other)
                }
                other => options.notes.push(other.to_string()),
            }
        }

        Ok(options)
    }

    /// Playback settings with CLI overrides, clamped to the allowed ranges.
    fn settings(&self) -> PlaybackSettings {
        let defaults = PlaybackSettings::default();
        PlaybackSettings {
            tempo_bpm: PlaybackSettings::clamp_tempo(self.tempo.unwrap_or(defaults.tempo_bpm)),
            looping: self.looping,
            volume: PlaybackSettings::clamp_volume(self.volume.unwrap_or(defaults.volume)),
        }
    }

    /// Collects note text from the file and the positional tokens.
    fn score_text(&self) -> Result<String> {
        let mut text = String::new();
        if let Some(path) = &self.file {
            text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
        }
        if !self.notes.is_empty() {
            text.push(' ');
            text.push_str(&self.notes.join(" "));
        }
        if text.trim().is_empty() {
            text = DEFAULT_MELODY.to_string();
        }
        Ok(text)
    }
}

fn print_help() {
    eprintln!("sthana - Carnatic violin fingering player");
    eprintln!();
    eprintln!("Usage: sthana [OPTIONS] [NOTES...]");
    eprintln!();
    eprintln!("Notes are NAME OCTAVE[:BEATS], e.g. D4 F#4:0.5 Bb3:2");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  -t, --tempo BPM        Tempo in beats per minute (40-200)");
    eprintln!("  -l, --loop             Loop playback");
    eprintln!("  -v, --volume V         Volume from 0.0 to 1.0");
    eprintln!("  -sf, --soundfont PATH  Voice notes with a SoundFont (.sf2)");
    eprintln!("  -m, --mute             Run without audio");
    eprintln!("  -f, --file PATH        Read notes from a file");
    eprintln!("  -p, --print            Print the fingering table and exit");
    eprintln!("  -j, --json             Print the resolved score as JSON and exit");
    eprintln!("  -h, --help             Print this help message");
}

/// Splits parse results into notes and per-token errors.
fn read_score(text: &str) -> (Vec<WesternNote>, Vec<PitchError>) {
    let mut notes = Vec::new();
    let mut errors = Vec::new();
    for result in parse_sequence(text) {
        match result {
            Ok(note) => notes.push(note),
            Err(e) => {
                tracing::warn!("Skipping token: {}", e);
                errors.push(e);
            }
        }
    }
    (notes, errors)
}

/// Prints the resolved score as a plain table.
fn print_table(resolved: &[ResolvedNote]) {
    println!("{:>4}  {:<8} {:>5}  {:<9} {:<6} {}", "#", "Note", "Pitch", "String", "Swara", "Finger");
    for (i, note) in resolved.iter().enumerate() {
        let pitch = note.western.pitch();
        match note.position {
            Some(pos) => println!(
                "{:>4}  {:<8} {:>5}  {:<9} {:<6} {}",
                i + 1,
                note.western.to_string(),
                pitch.value(),
                pos.string.display_name(),
                pos.label,
                pos.finger
            ),
            None => println!(
                "{:>4}  {:<8} {:>5}  unplayable",
                i + 1,
                note.western.to_string(),
                pitch.value()
            ),
        }
    }
}

/// Builds the audio backend requested on the command line.
fn create_backend(cli: &CliOptions) -> Result<Box<dyn AudioBackend>> {
    if cli.mute {
        return Ok(Box::new(SilentBackend::default()));
    }
    match &cli.soundfont {
        Some(path) => {
            let engine = AudioEngine::with_soundfont(path).context("Failed to load SoundFont")?;
            Ok(Box::new(engine))
        }
        None => Ok(Box::new(AudioEngine::new())),
    }
}

/// Main entry point.
fn main() -> Result<()> {
    // Parse CLI options first (before any terminal setup)
    let cli = CliOptions::parse()?;

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let text = cli.score_text()?;
    let (notes, errors) = read_score(&text);
    let resolved = map_score(&notes);

    if cli.json {
        let json = serde_json::to_string_pretty(&resolved).context("Failed to encode score")?;
        println!("{}", json);
        return Ok(());
    }
    if cli.print {
        print_table(&resolved);
        return Ok(());
    }

    let backend = create_backend(&cli)?;
    let mut controller = PlaybackController::new(backend, cli.settings(), LaneLayout::default())
        .context("Invalid playback settings")?;
    controller.load_score(resolved);
    let mut app = App::new(controller, errors);

    let mut terminal = setup_terminal().context("Failed to setup terminal")?;
    let result = run_app(&mut terminal, &mut app);
    restore_terminal(&mut terminal).context("Failed to restore terminal")?;

    result
}

/// Sets up the terminal for TUI rendering.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("Failed to leave alternate screen")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

/// Main application loop: tick, draw, handle input.
fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.update();
        app.clear_expired_status();

        terminal.draw(|frame| ui::render(frame, app))?;

        // Short timeout so playback keeps ticking at roughly 60 Hz
        if event::poll(Duration::from_millis(16))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key.code, key.modifiers);
                }
            }
        }

        if app.should_quit {
            return Ok(());
        }
    }
}

fn handle_key(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    if modifiers.contains(KeyModifiers::CONTROL) && code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    if app.show_help {
        match code {
            KeyCode::Char('?') | KeyCode::Esc => {
                app.show_help = false;
                app.help_scroll = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => {
                app.help_scroll = app.help_scroll.saturating_sub(1);
            }
            KeyCode::Down | KeyCode::Char('j') => {
                app.help_scroll = app.help_scroll.saturating_add(1);
            }
            _ => {}
        }
        return;
    }

    match code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('?') => app.show_help = true,
        KeyCode::Char(' ') => app.toggle_playback(),
        KeyCode::Char('r') => app.restart_playback(),
        KeyCode::Char('.') => app.stop_playback(),
        KeyCode::Char('l') => app.toggle_loop(),
        KeyCode::Char('+') | KeyCode::Char('=') => app.adjust_tempo(TEMPO_STEP),
        KeyCode::Char('-') | KeyCode::Char('_') => app.adjust_tempo(-TEMPO_STEP),
        KeyCode::Up => app.adjust_volume(VOLUME_STEP),
        KeyCode::Down => app.adjust_volume(-VOLUME_STEP),
        KeyCode::Char(']') => app.zoom(1),
        KeyCode::Char('[') => app.zoom(-1),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<CliOptions> {
        CliOptions::parse_from(args.iter().map(|s| s.to_string()))
    }

    #[test]
    fn test_cli_flags_and_notes() {
        let cli = parse(&["-t", "100", "--loop", "D4", "E4:2", "-v", "0.5"]).unwrap();
        assert_eq!(cli.tempo, Some(100.0));
        assert!(cli.looping);
        assert_eq!(cli.volume, Some(0.5));
        assert_eq!(cli.notes, vec!["D4", "E4:2"]);
    }

    #[test]
    fn test_cli_settings_are_clamped() {
        let cli = parse(&["--tempo", "999", "--volume", "3"]).unwrap();
        let settings = cli.settings();
        assert_eq!(settings.tempo_bpm, config::MAX_TEMPO);
        assert_eq!(settings.volume, 1.0);
    }

    #[test]
    fn test_cli_rejects_bad_values() {
        assert!(parse(&["--tempo"]).is_err());
        assert!(parse(&["--tempo", "fast"]).is_err());
        assert!(parse(&["--bogus"]).is_err());
    }

    #[test]
    fn test_default_melody_when_empty() {
        let cli = parse(&[]).unwrap();
        assert_eq!(cli.score_text().unwrap(), DEFAULT_MELODY);
        let (notes, errors) = read_score(DEFAULT_MELODY);
        assert!(errors.is_empty());
        assert!(map_score(&notes).iter().all(ResolvedNote::is_playable));
    }

    #[test]
    fn test_read_score_collects_errors() {
        let (notes, errors) = read_score("D4 H4 E4");
        assert_eq!(notes.len(), 2);
        assert_eq!(errors.len(), 1);
    }
}
