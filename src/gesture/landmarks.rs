//! Hand keypoints as produced by a landmark detector.
//!
//! Coordinates are normalized to the frame: `x` grows to the right and `y`
//! grows downward, both in `[0, 1]`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of keypoints in a complete hand.
pub const LANDMARK_COUNT: usize = 21;

/// A single normalized 2-D keypoint.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Anatomical landmark ids used by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(dead_code)]
pub enum Joint {
    Wrist = 0,
    ThumbIp = 3,
    ThumbTip = 4,
    IndexPip = 6,
    IndexTip = 8,
    MiddlePip = 10,
    MiddleTip = 12,
    RingPip = 14,
    RingTip = 16,
    PinkyPip = 18,
    PinkyTip = 20,
}

impl Joint {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// The four non-thumb fingers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Finger {
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub fn all() -> &'static [Finger] {
        &[Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky]
    }

    pub fn tip(self) -> Joint {
        match self {
            Self::Index => Joint::IndexTip,
            Self::Middle => Joint::MiddleTip,
            Self::Ring => Joint::RingTip,
            Self::Pinky => Joint::PinkyTip,
        }
    }

    /// The lower joint the fingertip is compared against.
    pub fn pip(self) -> Joint {
        match self {
            Self::Index => Joint::IndexPip,
            Self::Middle => Joint::MiddlePip,
            Self::Ring => Joint::RingPip,
            Self::Pinky => Joint::PinkyPip,
        }
    }
}

/// Errors raised while validating a detector result.
#[derive(Debug, Error, PartialEq)]
pub enum LandmarkError {
    #[error("expected {expected} landmarks, found {found}")]
    WrongCount { expected: usize, found: usize },
}

/// One detected hand: exactly [`LANDMARK_COUNT`] keypoints.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    points: [Point; LANDMARK_COUNT],
}

impl HandLandmarks {
    pub fn point(&self, joint: Joint) -> Point {
        self.points[joint.index()]
    }

    /// The wrist, used as the proxy for overall hand position.
    pub fn wrist(&self) -> Point {
        self.point(Joint::Wrist)
    }

    /// Whether a finger's tip sits strictly above its lower joint.
    pub fn is_extended(&self, finger: Finger) -> bool {
        self.point(finger.tip()).y < self.point(finger.pip()).y
    }

    /// All four non-thumb fingers extended.
    pub fn is_open_palm(&self) -> bool {
        Finger::all().iter().all(|&finger| self.is_extended(finger))
    }
}

impl TryFrom<Vec<Point>> for HandLandmarks {
    type Error = LandmarkError;

    fn try_from(points: Vec<Point>) -> Result<Self, Self::Error> {
        let found = points.len();
        let points: [Point; LANDMARK_COUNT] =
            points.try_into().map_err(|_| LandmarkError::WrongCount {
                expected: LANDMARK_COUNT,
                found,
            })?;
        Ok(Self { points })
    }
}


#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    #[test]
    fn test_wrong_count_rejected() {
        let err = HandLandmarks::try_from(vec![Point::default(); 20]).unwrap_err();
        assert_eq!(
            err,
            LandmarkError::WrongCount {
                expected: 21,
                found: 20
            }
        );
        assert!(HandLandmarks::try_from(Vec::new()).is_err());
    }

    #[test]
    fn test_joint_ids() {
        assert_eq!(Joint::Wrist.index(), 0);
        let tips: Vec<usize> = Finger::all().iter().map(|f| f.tip().index()).collect();
        let pips: Vec<usize> = Finger::all().iter().map(|f| f.pip().index()).collect();
        assert_eq!(tips, vec![8, 12, 16, 20]);
        assert_eq!(pips, vec![6, 10, 14, 18]);
    }

    #[test]
    fn test_open_palm() {
        assert!(hand(palm_at(0.5, 0.8)).is_open_palm());
        assert!(!hand(fist_at(0.5, 0.8)).is_open_palm());
    }

    #[test]
    fn test_one_curled_finger_is_not_open_palm() {
        let mut points = palm_at(0.5, 0.8);
        points[Joint::RingTip.index()].y = 0.9;
        assert!(!hand(points).is_open_palm());
    }

    #[test]
    fn test_tip_level_with_joint_is_not_extended() {
        let mut points = palm_at(0.5, 0.8);
        points[Joint::PinkyTip.index()].y = points[Joint::PinkyPip.index()].y;
        let hand = hand(points);
        assert!(!hand.is_extended(Finger::Pinky));
        assert!(!hand.is_open_palm());
    }

    #[test]
    fn test_point_deserializes_from_pair() {
        let p: Point = serde_json::from_str("[0.25, 0.75]").unwrap();
        assert_eq!(p, Point::new(0.25, 0.75));
        let p: Point = serde_json::from_str(r#"{"x": 0.1, "y": 0.2}"#).unwrap();
        assert_eq!(p, Point::new(0.1, 0.2));
    }
}
