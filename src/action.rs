//! Application actions/events that drive state changes.

use crate::gesture::Gesture;

/// Actions that can be dispatched to update application state.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    // Application lifecycle
    Quit,
    Tick,

    // Playlist navigation
    NavigateUp,
    NavigateDown,
    Select,

    // Playback controls
    PlayPause,
    NextTrack,
    PreviousTrack,
    VolumeUp,
    VolumeDown,

    // Gesture worker
    GestureDetected(Gesture),
    CameraUnavailable(String),

    // Console
    ClearMessages,

    // No-op
    None,
}

impl Action {
    /// Playback command bound to a gesture.
    pub fn from_gesture(gesture: Gesture) -> Self {
        match gesture {
            Gesture::PlayPause => Self::PlayPause,
            Gesture::Next => Self::NextTrack,
            Gesture::Prev => Self::PreviousTrack,
            Gesture::VolumeUp => Self::VolumeUp,
            Gesture::VolumeDown => Self::VolumeDown,
            Gesture::None => Self::None,
        }
    }
}

/// Current playback state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlayerState {
    #[default]
    Stopped,
    Playing,
    Paused,
}

impl PlayerState {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Stopped => "Stopped",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
        }
    }
}
