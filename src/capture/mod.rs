//! Frame sources and landmark detection seams.
//!
//! The gesture worker is the only owner of a source and a detector, so
//! neither trait requires `Sync`.

pub mod replay;
pub mod synthetic;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::gesture::Point;

pub use replay::ReplaySource;
pub use synthetic::SyntheticSource;

/// Capture failures. All of them are fatal to the worker.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("could not open capture device: {0}")]
    Open(String),

    #[error("capture I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed trace at line {line}: {source}")]
    Trace {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
}

/// A supplier of camera frames.
pub trait FrameSource {
    type Frame;

    /// Acquire the underlying device. Called once before the first frame.
    fn open(&mut self) -> Result<(), CaptureError>;

    /// Next frame, or `Ok(None)` when none is ready yet.
    ///
    /// May block for up to one device frame interval.
    fn next_frame(&mut self) -> Result<Option<Self::Frame>, CaptureError>;

    /// Release the device. Called at most once, and only after a successful `open`.
    fn release(&mut self);
}

/// Finds at most one hand in a frame.
pub trait LandmarkDetector<F> {
    fn detect(&mut self, frame: &F) -> Option<Vec<Point>>;
}

/// A frame whose hand landmarks were recorded ahead of time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TraceFrame {
    /// Detected hand, absent when no hand was in view.
    #[serde(default)]
    pub hand: Option<Vec<Point>>,

    /// Time to wait before this frame is delivered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
}

impl TraceFrame {
    pub fn with_hand(points: Vec<Point>) -> Self {
        Self {
            hand: Some(points),
            delay_ms: None,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

/// Detector for [`TraceFrame`]s: the landmarks are already in the frame.
#[derive(Debug, Default, Clone, Copy)]
pub struct PassthroughDetector;

impl LandmarkDetector<TraceFrame> for PassthroughDetector {
    fn detect(&mut self, frame: &TraceFrame) -> Option<Vec<Point>> {
        frame.hand.clone()
    }
}
