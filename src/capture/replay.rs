//! Replays a recorded landmark trace as if it came from a camera.
//!
//! A trace is JSON Lines, one [`TraceFrame`] per line:
//!
//! ```text
//! {"hand": [[0.41, 0.72], [0.44, 0.70], ...], "delay_ms": 33}
//! {"hand": null}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::time::Duration;

use super::{CaptureError, FrameSource, TraceFrame};

/// Parse a JSON Lines trace. Blank lines are skipped.
pub fn parse_trace<R: BufRead>(reader: R) -> Result<Vec<TraceFrame>, CaptureError> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let frame = serde_json::from_str(line).map_err(|source| CaptureError::Trace {
            line: idx + 1,
            source,
        })?;
        frames.push(frame);
    }
    Ok(frames)
}

/// Frame source backed by a landmark trace.
#[derive(Debug)]
pub struct ReplaySource {
    /// Trace file, loaded on open. `None` for in-memory traces.
    path: Option<PathBuf>,
    frames: Vec<TraceFrame>,
    cursor: usize,
    frame_interval: Duration,
    looping: bool,
}

impl ReplaySource {
    /// Replay the trace stored at `path`.
    pub fn from_path(path: impl Into<PathBuf>, frame_interval: Duration) -> Self {
        Self {
            path: Some(path.into()),
            frames: Vec::new(),
            cursor: 0,
            frame_interval,
            looping: false,
        }
    }

    /// Replay frames already in memory.
    #[cfg(test)]
    pub fn from_frames(frames: Vec<TraceFrame>, frame_interval: Duration) -> Self {
        Self {
            path: None,
            frames,
            cursor: 0,
            frame_interval,
            looping: false,
        }
    }

    /// Restart from the first frame when the trace runs out.
    pub fn looping(mut self, looping: bool) -> Self {
        self.looping = looping;
        self
    }
}

impl FrameSource for ReplaySource {
    type Frame = TraceFrame;

    fn open(&mut self) -> Result<(), CaptureError> {
        if let Some(path) = &self.path {
            let file = File::open(path)
                .map_err(|e| CaptureError::Open(format!("{}: {}", path.display(), e)))?;
            self.frames = parse_trace(BufReader::new(file))?;
            tracing::info!("Loaded {} frames from {}", self.frames.len(), path.display());
        }
        self.cursor = 0;
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<TraceFrame>, CaptureError> {
        if self.cursor >= self.frames.len() {
            if self.looping && !self.frames.is_empty() {
                self.cursor = 0;
            } else {
                // Nothing left; pace the caller's retries like an idle camera
                std::thread::sleep(self.frame_interval);
                return Ok(None);
            }
        }

        let frame = self.frames[self.cursor].clone();
        self.cursor += 1;

        let delay = frame
            .delay_ms
            .map(Duration::from_millis)
            .unwrap_or(self.frame_interval);
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }

        Ok(Some(frame))
    }

    fn release(&mut self) {
        self.frames.clear();
        self.cursor = 0;
    }
}
