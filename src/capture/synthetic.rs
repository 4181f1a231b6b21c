//! A scripted demo hand for running without a camera.
//!
//! The hand loops through a fixed routine: swipe right, swipe left, drop out
//! of view, raise, lower, then hold an open palm. Small seeded jitter is added
//! to every frame so the cooldown filter has realistic noise to absorb.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{CaptureError, FrameSource, TraceFrame};
use crate::gesture::landmarks::{Finger, Joint, LANDMARK_COUNT};
use crate::gesture::Point;

/// Maximum per-axis jitter, well below the motion thresholds.
const JITTER: f32 = 0.004;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pose {
    Fist,
    Palm,
    Hidden,
}

/// A stretch of the routine: the wrist travels from `from` to `to` over `frames`.
#[derive(Debug, Clone, Copy)]
struct Segment {
    pose: Pose,
    from: (f32, f32),
    to: (f32, f32),
    frames: u32,
}

impl Segment {
    const fn hold(pose: Pose, at: (f32, f32), frames: u32) -> Self {
        Self {
            pose,
            from: at,
            to: at,
            frames,
        }
    }

    const fn travel(from: (f32, f32), to: (f32, f32), frames: u32) -> Self {
        Self {
            pose: Pose::Fist,
            from,
            to,
            frames,
        }
    }

    fn wrist_at(&self, frame: u32) -> (f32, f32) {
        let t = (frame + 1) as f32 / self.frames as f32;
        (
            self.from.0 + (self.to.0 - self.from.0) * t,
            self.from.1 + (self.to.1 - self.from.1) * t,
        )
    }
}

const LEFT: (f32, f32) = (0.3, 0.7);
const RIGHT: (f32, f32) = (0.7, 0.7);
const RAISED: (f32, f32) = (0.3, 0.4);

const ROUTINE: [Segment; 11] = [
    Segment::hold(Pose::Fist, LEFT, 15),
    Segment::travel(LEFT, RIGHT, 5),
    Segment::hold(Pose::Fist, RIGHT, 15),
    Segment::travel(RIGHT, LEFT, 5),
    Segment::hold(Pose::Fist, LEFT, 15),
    Segment::hold(Pose::Hidden, LEFT, 10),
    Segment::travel(LEFT, RAISED, 4),
    Segment::hold(Pose::Fist, RAISED, 15),
    Segment::travel(RAISED, LEFT, 4),
    Segment::hold(Pose::Fist, LEFT, 15),
    Segment::hold(Pose::Palm, LEFT, 20),
];

/// Build a full hand around a wrist position.
pub fn hand_at(wrist: (f32, f32), open: bool) -> Vec<Point> {
    let (x, y) = wrist;
    let clamp = |v: f32| v.clamp(0.0, 1.0);
    let mut points = vec![Point::new(clamp(x), clamp(y)); LANDMARK_COUNT];

    // Thumb 1..=4 fans out to the side
    for (i, id) in (1..=Joint::ThumbTip.index()).enumerate() {
        let step = (i + 1) as f32;
        points[id] = Point::new(clamp(x - 0.025 * step), clamp(y - 0.02 * step));
    }

    for (col, finger) in Finger::all().iter().enumerate() {
        let fx = clamp(x - 0.04 + 0.03 * col as f32);
        let pip = finger.pip().index();
        let (dip_dy, tip_dy) = if open { (0.21, 0.25) } else { (0.14, 0.11) };
        points[pip - 1] = Point::new(fx, clamp(y - 0.12));
        points[pip] = Point::new(fx, clamp(y - 0.17));
        points[pip + 1] = Point::new(fx, clamp(y - dip_dy));
        points[pip + 2] = Point::new(fx, clamp(y - tip_dy));
    }

    points
}

/// Frame source that plays the demo routine forever.
#[derive(Debug)]
pub struct SyntheticSource {
    rng: StdRng,
    frame_interval: Duration,
    segment: usize,
    frame: u32,
}

impl SyntheticSource {
    pub fn new(frame_interval: Duration, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            rng,
            frame_interval,
            segment: 0,
            frame: 0,
        }
    }

    /// Frames in one pass of the routine.
    pub fn routine_len() -> usize {
        ROUTINE.iter().map(|s| s.frames as usize).sum()
    }

    fn advance(&mut self) -> TraceFrame {
        let segment = ROUTINE[self.segment];
        let (x, y) = segment.wrist_at(self.frame);

        self.frame += 1;
        if self.frame >= segment.frames {
            self.frame = 0;
            self.segment = (self.segment + 1) % ROUTINE.len();
        }

        if segment.pose == Pose::Hidden {
            return TraceFrame::empty();
        }

        let x = x + self.rng.gen_range(-JITTER..=JITTER);
        let y = y + self.rng.gen_range(-JITTER..=JITTER);
        TraceFrame::with_hand(hand_at((x, y), segment.pose == Pose::Palm))
    }
}

impl FrameSource for SyntheticSource {
    type Frame = TraceFrame;

    fn open(&mut self) -> Result<(), CaptureError> {
        tracing::info!(
            "Synthetic hand started ({} frames per routine)",
            Self::routine_len()
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Option<TraceFrame>, CaptureError> {
        if !self.frame_interval.is_zero() {
            std::thread::sleep(self.frame_interval);
        }
        Ok(Some(self.advance()))
    }

    fn release(&mut self) {
        self.segment = 0;
        self.frame = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gesture::{classify, Gesture, HandLandmarks, MotionState, Thresholds};

    #[test]
    fn test_hand_shapes() {
        let open = HandLandmarks::try_from(hand_at((0.5, 0.7), true)).unwrap();
        let closed = HandLandmarks::try_from(hand_at((0.5, 0.7), false)).unwrap();
        assert!(open.is_open_palm());
        assert!(!closed.is_open_palm());
        assert_eq!(open.wrist(), Point::new(0.5, 0.7));
    }

    #[test]
    fn test_routine_produces_every_gesture_in_order() {
        let mut source = SyntheticSource::new(Duration::ZERO, Some(7));
        source.open().unwrap();

        let thresholds = Thresholds::default();
        let mut motion = MotionState::default();
        let mut seen: Vec<Gesture> = Vec::new();

        for _ in 0..SyntheticSource::routine_len() {
            let frame = source.next_frame().unwrap().unwrap();
            let Some(points) = frame.hand else {
                continue;
            };
            let hand = HandLandmarks::try_from(points).unwrap();
            let (gesture, next) = classify(&hand, motion, &thresholds);
            motion = next;
            if !gesture.is_none() && seen.last() != Some(&gesture) {
                seen.push(gesture);
            }
        }

        assert_eq!(
            seen,
            vec![
                Gesture::Next,
                Gesture::Prev,
                Gesture::VolumeUp,
                Gesture::VolumeDown,
                Gesture::PlayPause,
            ]
        );
    }

    #[test]
    fn test_routine_has_dropouts() {
        let mut source = SyntheticSource::new(Duration::ZERO, Some(1));
        let hidden = (0..SyntheticSource::routine_len())
            .filter(|_| source.next_frame().unwrap().unwrap().hand.is_none())
            .count();
        assert_eq!(hidden, 10);
    }

    #[test]
    fn test_same_seed_same_frames() {
        let mut a = SyntheticSource::new(Duration::ZERO, Some(42));
        let mut b = SyntheticSource::new(Duration::ZERO, Some(42));
        for _ in 0..30 {
            assert_eq!(a.next_frame().unwrap(), b.next_frame().unwrap());
        }
    }
}
