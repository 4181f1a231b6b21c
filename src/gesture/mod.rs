//! Hand gesture recognition: landmark validation, classification and cooldown.

pub mod classifier;
pub mod debounce;
pub mod landmarks;

pub use classifier::{classify, Gesture, MotionState, Thresholds};
pub use debounce::{Cooldown, EmissionRecord};
pub use landmarks::{HandLandmarks, Point};
