//! Main UI layout and rendering.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::action::PlayerState;
use crate::app::{App, MessageLevel};
use crate::worker::WorkerState;

/// Render the entire UI.
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    // Main layout: [status] [playlist + console] [now playing]
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(8),
            Constraint::Length(5),
        ])
        .split(area);

    render_status(frame, main_chunks[0], app);

    let content_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(main_chunks[1]);

    render_playlist(frame, content_chunks[0], app);
    render_console(frame, content_chunks[1], app);
    render_now_playing(frame, main_chunks[2], app);
}

fn render_status(frame: &mut Frame, area: Rect, app: &App) {
    let state = app.worker_state();
    let state_color = match state {
        WorkerState::Running => Color::Green,
        WorkerState::Stopping => Color::Yellow,
        WorkerState::Stopped => Color::Red,
    };

    let mut spans = vec![
        Span::raw(" Gesture control: "),
        Span::styled(state.label(), Style::default().fg(state_color)),
        Span::styled(
            format!("  cooldown {:.1}s", app.config.gesture.cooldown_secs),
            Style::default().fg(Color::DarkGray),
        ),
    ];
    if let Some(reason) = &app.camera_error {
        spans.push(Span::styled(
            format!("  camera unavailable: {}", reason),
            Style::default().fg(Color::Red),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" gesture-deck ");
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_playlist(frame: &mut Frame, area: Rect, app: &App) {
    let playing = app.session.state() != PlayerState::Stopped;
    let items: Vec<ListItem> = app
        .session
        .tracks()
        .iter()
        .enumerate()
        .map(|(i, title)| {
            let marker = if playing && i == app.session.index() {
                "▶ "
            } else {
                "  "
            };
            ListItem::new(format!("{marker}{title}"))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" Playlist "))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        );

    let mut state = ListState::default().with_selected(Some(app.cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_console(frame: &mut Frame, area: Rect, app: &App) {
    // Show the most recent lines that fit
    let visible = area.height.saturating_sub(2) as usize;
    let skip = app.messages.len().saturating_sub(visible);

    let lines: Vec<Line> = app
        .messages
        .iter()
        .skip(skip)
        .map(|message| {
            let color = match message.level {
                MessageLevel::Info => Color::Gray,
                MessageLevel::Error => Color::Red,
            };
            Line::from(vec![
                Span::styled(
                    message.at.format("%H:%M:%S ").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::styled(
                    format!("{} {}", message.tag(), message.text),
                    Style::default().fg(color),
                ),
            ])
        })
        .collect();

    let console = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title(" Console "))
        .wrap(Wrap { trim: true });
    frame.render_widget(console, area);
}

fn render_now_playing(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Now Playing ");
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let title = match (app.session.state(), app.session.current_track()) {
        (PlayerState::Stopped, _) | (_, None) => Span::styled(
            "No track loaded",
            Style::default().fg(Color::DarkGray),
        ),
        (state, Some(track)) => Span::styled(
            format!("{}: {}", state.label(), track),
            Style::default().add_modifier(Modifier::BOLD),
        ),
    };
    frame.render_widget(Paragraph::new(Line::from(title)), rows[0]);

    let gesture = match &app.last_gesture {
        Some((gesture, at)) => format!("Gesture: {} at {}", gesture, at.format("%H:%M:%S")),
        None => String::from("Gesture: none"),
    };
    frame.render_widget(
        Paragraph::new(gesture).style(Style::default().fg(Color::Cyan)),
        rows[1],
    );

    let volume = app.session.volume();
    let gauge = Gauge::default()
        .gauge_style(Style::default().fg(Color::Green))
        .percent(u16::from(volume))
        .label(format!("Volume {volume}%"));
    frame.render_widget(gauge, rows[2]);
}
