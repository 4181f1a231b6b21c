//! gesture-deck - a terminal music deck driven by hand gestures.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use color_eyre::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use tokio::sync::mpsc;

mod action;
mod app;
mod capture;
mod config;
mod gesture;
mod player;
mod tui;
mod ui;
mod worker;

use action::Action;
use app::App;
use config::{Config, SourceKind};
use worker::WorkerState;

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(name = "gesture-deck")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Seconds before the same gesture is dispatched again (overrides config)
    #[arg(long)]
    cooldown: Option<f64>,

    /// Replay a recorded landmark trace instead of the configured source
    #[arg(short, long, conflicts_with = "synthetic")]
    replay: Option<PathBuf>,

    /// Use the built-in demo hand
    #[arg(long)]
    synthetic: bool,

    /// Print dispatched gestures instead of drawing the terminal UI
    #[arg(long)]
    headless: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Install panic hooks; only the terminal UI has a screen to restore
    if args.headless {
        color_eyre::install()?;
    } else {
        tui::install_hooks()?;
    }

    // Initialize logging
    let log_file = dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("gesture-deck")
        .join("gesture-deck.log");

    if let Some(parent) = log_file.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::fs::File::create(&log_file)?)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with(file_layer)
        .try_init()
        .ok();

    let mut config = match &args.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_default(),
    };

    // Apply command-line overrides
    if let Some(cooldown) = args.cooldown {
        config.gesture.cooldown_secs = cooldown;
    }
    if let Some(path) = args.replay {
        config.source.kind = SourceKind::Replay;
        config.source.path = Some(path);
    }
    if args.synthetic {
        config.source.kind = SourceKind::Synthetic;
    }
    config.validate()?;

    let (action_tx, action_rx) = mpsc::unbounded_channel::<Action>();
    let mut app = App::new(config, action_tx);
    app.init()?;

    let result = if args.headless {
        run_headless(&mut app, action_rx).await
    } else {
        run_tui(&mut app, action_rx)
    };

    // Release the camera before exiting, even on error
    app.shutdown();
    result
}

/// Drive the terminal UI until the user quits.
fn run_tui(app: &mut App, mut action_rx: mpsc::UnboundedReceiver<Action>) -> Result<()> {
    let mut terminal = tui::init()?;
    let tick_rate = Duration::from_millis(50);

    let result = (|| -> Result<()> {
        loop {
            terminal.draw(|frame| ui::render(frame, app))?;

            if event::poll(tick_rate)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        let action = handle_key_event(key.code, key.modifiers);
                        if action != Action::None {
                            app.action_tx.send(action)?;
                        }
                    }
                }
            }

            app.action_tx.send(Action::Tick)?;

            while let Ok(action) = action_rx.try_recv() {
                app.handle_action(action)?;
            }

            if app.should_quit {
                return Ok(());
            }
        }
    })();

    tui::restore()?;
    result
}

/// Print dispatched gestures and console lines until Ctrl-C or the worker stops.
async fn run_headless(
    app: &mut App,
    mut action_rx: mpsc::UnboundedReceiver<Action>,
) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_millis(50));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut out = std::io::stdout();

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                tracing::info!("Interrupted");
                break;
            }
            _ = ticker.tick() => {
                if !headless_tick(app, &mut action_rx, &mut out)? {
                    break;
                }
            }
        }
    }

    if let Some(snapshot) = app.worker_snapshot().await {
        let stats = snapshot.stats;
        tracing::info!(
            "Worker at exit: motion baseline {:?}, last emission {:?}",
            snapshot.motion,
            snapshot.record.last
        );
        writeln!(
            out,
            "frames {} hands {} emitted {} dropped {}",
            stats.frames, stats.hands, stats.emitted, stats.dropped
        )?;
    }

    Ok(())
}

/// Dispatch pending worker events and print what they produced.
///
/// Returns `false` once the worker has stopped and its last events are out.
fn headless_tick(
    app: &mut App,
    action_rx: &mut mpsc::UnboundedReceiver<Action>,
    out: &mut impl Write,
) -> Result<bool> {
    // The worker sends its final event before it reports Stopped
    let stopped = app.worker_state() == WorkerState::Stopped;

    app.handle_action(Action::Tick)?;
    while let Ok(action) = action_rx.try_recv() {
        if let Action::GestureDetected(gesture) = &action {
            writeln!(out, "gesture {}", gesture)?;
        }
        app.handle_action(action)?;
    }

    for message in app.messages.drain(..) {
        let at = message.at.format("%H:%M:%S");
        writeln!(out, "{} {} {}", at, message.tag(), message.text)?;
    }

    Ok(!stopped)
}

/// Map key events to actions.
fn handle_key_event(code: KeyCode, modifiers: KeyModifiers) -> Action {
    match code {
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => Action::Quit,

        // Playlist
        KeyCode::Up | KeyCode::Char('k') => Action::NavigateUp,
        KeyCode::Down | KeyCode::Char('j') => Action::NavigateDown,
        KeyCode::Enter => Action::Select,

        // Playback
        KeyCode::Char(' ') => Action::PlayPause,
        KeyCode::Char('n') => Action::NextTrack,
        KeyCode::Char('p') => Action::PreviousTrack,

        // Volume
        KeyCode::Char('+') | KeyCode::Char('=') => Action::VolumeUp,
        KeyCode::Char('-') => Action::VolumeDown,

        // Console
        KeyCode::Char('x') => Action::ClearMessages,

        _ => Action::None,
    }
}

use tracing_subscriber::prelude::*;
