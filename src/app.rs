//! Main application state and logic.

use std::collections::VecDeque;

use chrono::{DateTime, Local};
use color_eyre::Result;
use tokio::sync::mpsc;

use crate::action::Action;
use crate::capture::{PassthroughDetector, ReplaySource, SyntheticSource};
use crate::config::{Config, SourceKind};
use crate::gesture::Gesture;
use crate::player::Session;
use crate::worker::{GestureWorker, WorkerEvent, WorkerSnapshot, WorkerState};

/// Console lines kept for display.
const MAX_MESSAGES: usize = 200;

/// Severity of a console line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageLevel {
    Info,
    Error,
}

/// A status or error line shown in the console panel.
#[derive(Debug, Clone)]
pub struct Message {
    pub level: MessageLevel,
    pub text: String,
    pub at: DateTime<Local>,
}

impl Message {
    pub fn tag(&self) -> &'static str {
        match self.level {
            MessageLevel::Info => "[INFO]",
            MessageLevel::Error => "[ERROR]",
        }
    }
}

/// Main application state.
pub struct App {
    /// Whether the app should quit
    pub should_quit: bool,

    /// Configuration
    pub config: Config,

    /// Playback session
    pub session: Session,

    /// Gesture worker, absent when it could not be started
    pub worker: Option<GestureWorker>,

    /// Last gesture dispatched and when
    pub last_gesture: Option<(Gesture, DateTime<Local>)>,

    /// Camera failure reported by the worker
    pub camera_error: Option<String>,

    /// Playlist cursor
    pub cursor: usize,

    /// Console lines, oldest first
    pub messages: VecDeque<Message>,

    /// Action sender for follow-up actions
    pub action_tx: mpsc::UnboundedSender<Action>,
}

impl App {
    /// Create a new application instance.
    pub fn new(config: Config, action_tx: mpsc::UnboundedSender<Action>) -> Self {
        let session = Session::new(
            config.player.tracks.clone(),
            config.player.volume,
            config.player.volume_step,
        );
        Self {
            should_quit: false,
            config,
            session,
            worker: None,
            last_gesture: None,
            camera_error: None,
            cursor: 0,
            messages: VecDeque::new(),
            action_tx,
        }
    }

    /// Start the gesture worker for the configured source.
    pub fn init(&mut self) -> Result<()> {
        let settings = self.config.gesture.worker_settings();
        let source = &self.config.source;

        let spawned = match source.kind {
            SourceKind::Synthetic => GestureWorker::spawn(
                SyntheticSource::new(source.frame_interval(), source.seed),
                PassthroughDetector,
                settings,
            ),
            SourceKind::Replay => {
                let path = source
                    .path
                    .clone()
                    .ok_or_else(|| color_eyre::eyre::eyre!("No trace file configured"))?;
                GestureWorker::spawn(
                    ReplaySource::from_path(path, source.frame_interval())
                        .looping(source.loop_trace),
                    PassthroughDetector,
                    settings,
                )
            }
        };

        match spawned {
            Ok(worker) => {
                tracing::info!("Gesture worker started ({:?} source)", source.kind);
                self.info(format!(
                    "Gesture control started. Cooldown {:.1}s.",
                    self.config.gesture.cooldown_secs
                ));
                self.worker = Some(worker);
            }
            Err(e) => {
                tracing::error!("Failed to start gesture worker: {}", e);
                self.error(format!("Gesture control unavailable: {}", e));
            }
        }

        if self.session.tracks().is_empty() {
            self.info("Playlist is empty.");
        }

        Ok(())
    }

    /// Worker lifecycle for display.
    pub fn worker_state(&self) -> WorkerState {
        self.worker
            .as_ref()
            .map_or(WorkerState::Stopped, GestureWorker::state)
    }

    /// Worker counters and motion baseline, if the worker is still running.
    pub async fn worker_snapshot(&self) -> Option<WorkerSnapshot> {
        self.worker.as_ref()?.snapshot().await
    }

    /// Handle an action and update state.
    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => {
                self.should_quit = true;
            }

            Action::Tick => {
                let events: Vec<_> = match &mut self.worker {
                    Some(worker) => std::iter::from_fn(|| worker.try_recv()).collect(),
                    None => Vec::new(),
                };
                for event in events {
                    self.handle_worker_event(event)?;
                }
            }

            Action::NavigateUp => {
                self.cursor = self.cursor.saturating_sub(1);
            }

            Action::NavigateDown => {
                if self.cursor + 1 < self.session.tracks().len() {
                    self.cursor += 1;
                }
            }

            Action::Select => {
                self.session.select(self.cursor);
                self.play();
            }

            Action::PlayPause => match self.session.toggle_pause() {
                Ok(state) => self.info(format!("{}.", state.label())),
                Err(e) => self.error(format!("Pause/Resume: {}", e)),
            },

            Action::NextTrack => match self.session.next() {
                Ok(track) => {
                    let line = format!("Playing {}", track);
                    self.info(line);
                }
                Err(e) => self.error(format!("Next track: {}", e)),
            },

            Action::PreviousTrack => match self.session.previous() {
                Ok(Some(track)) => {
                    let line = format!("Playing {}", track);
                    self.info(line);
                }
                Ok(None) => {}
                Err(e) => self.error(format!("Previous track: {}", e)),
            },

            Action::VolumeUp => {
                let volume = self.session.volume_up();
                tracing::debug!("Volume {}", volume);
            }

            Action::VolumeDown => {
                let volume = self.session.volume_down();
                tracing::debug!("Volume {}", volume);
            }

            Action::GestureDetected(gesture) => {
                tracing::info!("Gesture: {}", gesture);
                self.last_gesture = Some((gesture, Local::now()));
                let action = Action::from_gesture(gesture);
                if action != Action::None {
                    self.action_tx.send(action)?;
                }
            }

            Action::CameraUnavailable(reason) => {
                if self.camera_error.is_none() {
                    self.error(format!("Gesture camera unavailable: {}", reason));
                    self.camera_error = Some(reason);
                }
            }

            Action::ClearMessages => {
                self.messages.clear();
            }

            Action::None => {}
        }

        Ok(())
    }

    /// Turn a worker notification into an action.
    fn handle_worker_event(&mut self, event: WorkerEvent) -> Result<()> {
        let action = match event {
            WorkerEvent::Gesture(gesture) => Action::GestureDetected(gesture),
            WorkerEvent::Unavailable(reason) => Action::CameraUnavailable(reason),
        };
        self.action_tx.send(action)?;
        Ok(())
    }

    /// Stop the gesture worker. Blocks until its thread has exited.
    pub fn shutdown(&mut self) {
        if let Some(mut worker) = self.worker.take() {
            worker.stop();
            tracing::info!("Gesture worker shut down");
        }
    }

    fn play(&mut self) {
        match self.session.play() {
            Ok(track) => {
                let line = format!("Playing {}", track);
                self.info(line);
            }
            Err(e) => self.error(format!("Playback: {}", e)),
        }
    }

    pub fn info(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Info, text.into());
    }

    pub fn error(&mut self, text: impl Into<String>) {
        self.push(MessageLevel::Error, text.into());
    }

    fn push(&mut self, level: MessageLevel, text: String) {
        if self.messages.len() == MAX_MESSAGES {
            self.messages.pop_front();
        }
        self.messages.push_back(Message {
            level,
            text,
            at: Local::now(),
        });
    }
}
