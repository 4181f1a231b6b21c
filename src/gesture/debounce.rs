//! Cooldown filter between the classifier and the dispatcher.
//!
//! The classifier fires on every frame while a gesture is held. The filter
//! lets a gesture through when it differs from the last emitted one, or when
//! the cooldown window since that emission has fully elapsed.

use std::time::{Duration, Instant};

use super::classifier::Gesture;

/// The last gesture let through and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EmissionRecord {
    pub last: Option<(Gesture, Instant)>,
}

#[cfg(test)]
impl EmissionRecord {
    pub fn last_gesture(&self) -> Option<Gesture> {
        self.last.map(|(gesture, _)| gesture)
    }
}

/// Suppresses repeats of the same gesture within a time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cooldown {
    window: Duration,
}

impl Cooldown {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    /// Decide whether `gesture` observed at `now` should be dispatched.
    ///
    /// The record only changes when the answer is yes.
    pub fn should_emit(
        &self,
        gesture: Gesture,
        now: Instant,
        record: EmissionRecord,
    ) -> (bool, EmissionRecord) {
        if gesture.is_none() {
            return (false, record);
        }

        let emit = match record.last {
            None => true,
            Some((last, _)) if last != gesture => true,
            Some((_, at)) => now.saturating_duration_since(at) > self.window,
        };

        if emit {
            let updated = EmissionRecord {
                last: Some((gesture, now)),
            };
            (true, updated)
        } else {
            (false, record)
        }
    }
}
