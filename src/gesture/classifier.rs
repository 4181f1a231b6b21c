//! Per-frame gesture classification.
//!
//! [`classify`] is a pure function: the only state it needs, the previous
//! wrist position, is passed in and handed back as a [`MotionState`]. Deltas
//! are always taken against the last frame that contained a hand, so the
//! motion thresholds depend on the frame rate.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::landmarks::HandLandmarks;

/// Discrete gesture recognized in a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    PlayPause,
    Next,
    Prev,
    VolumeUp,
    VolumeDown,
    /// Nothing recognized this frame. Never dispatched.
    #[default]
    None,
}

impl Gesture {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PlayPause => "play_pause",
            Self::Next => "next",
            Self::Prev => "prev",
            Self::VolumeUp => "volume_up",
            Self::VolumeDown => "volume_down",
            Self::None => "none",
        }
    }

    pub fn is_none(&self) -> bool {
        *self == Self::None
    }
}

impl fmt::Display for Gesture {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Previous wrist position. Both coordinates stay unset until the first hand is seen.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct MotionState {
    pub prev_x: Option<f32>,
    pub prev_y: Option<f32>,
}

/// Minimum wrist displacement between consecutive frames, in normalized units.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub horizontal: f32,
    pub vertical: f32,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            horizontal: 0.05,
            vertical: 0.05,
        }
    }
}

/// Classification rules. The first rule in [`RULES`] that yields a gesture wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    /// All four fingers extended.
    OpenPalm,
    /// Wrist moved sideways past the horizontal threshold.
    Horizontal,
    /// Wrist moved up or down past the vertical threshold.
    Vertical,
}

/// Rule priority, highest first.
pub const RULES: [Rule; 3] = [Rule::OpenPalm, Rule::Horizontal, Rule::Vertical];

/// Facts about one frame that the rules are evaluated against.
#[derive(Debug, Clone, Copy)]
struct Observation {
    open_palm: bool,
    dx: Option<f32>,
    dy: Option<f32>,
}

impl Rule {
    fn evaluate(self, obs: &Observation, thresholds: &Thresholds) -> Option<Gesture> {
        match self {
            Self::OpenPalm => obs.open_palm.then_some(Gesture::PlayPause),
            Self::Horizontal => match obs.dx? {
                dx if dx > thresholds.horizontal => Some(Gesture::Next),
                dx if dx < -thresholds.horizontal => Some(Gesture::Prev),
                _ => None,
            },
            // y grows downward, so a negative delta is the hand rising.
            Self::Vertical => match obs.dy? {
                dy if dy < -thresholds.vertical => Some(Gesture::VolumeUp),
                dy if dy > thresholds.vertical => Some(Gesture::VolumeDown),
                _ => None,
            },
        }
    }
}

/// Classify one hand and return the motion state for the next frame.
pub fn classify(
    hand: &HandLandmarks,
    motion: MotionState,
    thresholds: &Thresholds,
) -> (Gesture, MotionState) {
    let wrist = hand.wrist();
    let obs = Observation {
        open_palm: hand.is_open_palm(),
        dx: motion.prev_x.map(|prev| wrist.x - prev),
        dy: motion.prev_y.map(|prev| wrist.y - prev),
    };

    let gesture = RULES
        .iter()
        .find_map(|rule| rule.evaluate(&obs, thresholds))
        .unwrap_or(Gesture::None);

    let next = MotionState {
        prev_x: Some(wrist.x),
        prev_y: Some(wrist.y),
    };

    (gesture, next)
}
