//! Local playback session: playlist position, play state and volume.

use thiserror::Error;

use crate::action::PlayerState;

/// Why a playback command could not run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("No tracks loaded. Add tracks to the [player] section of the config.")]
    NoTracks,

    #[error("Nothing is playing. Start a track first.")]
    NothingPlaying,
}

/// Playback state driven by keys and gestures.
#[derive(Debug, Clone)]
pub struct Session {
    tracks: Vec<String>,
    index: usize,
    state: PlayerState,
    volume: u8,
    volume_step: u8,
}

impl Session {
    pub fn new(tracks: Vec<String>, volume: u8, volume_step: u8) -> Self {
        Self {
            tracks,
            index: 0,
            state: PlayerState::Stopped,
            volume: volume.min(100),
            volume_step,
        }
    }

    pub fn tracks(&self) -> &[String] {
        &self.tracks
    }

    /// Selected track index.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn state(&self) -> PlayerState {
        self.state
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn current_track(&self) -> Option<&str> {
        self.tracks.get(self.index).map(String::as_str)
    }

    /// Move the selection without starting playback.
    pub fn select(&mut self, index: usize) {
        if index < self.tracks.len() {
            self.index = index;
        }
    }

    /// Start the selected track from the top.
    pub fn play(&mut self) -> Result<&str, SessionError> {
        let track = self.tracks.get(self.index).ok_or(SessionError::NoTracks)?;
        self.state = PlayerState::Playing;
        Ok(track)
    }

    /// Pause or resume.
    pub fn toggle_pause(&mut self) -> Result<PlayerState, SessionError> {
        self.state = match self.state {
            PlayerState::Playing => PlayerState::Paused,
            PlayerState::Paused => PlayerState::Playing,
            PlayerState::Stopped => return Err(SessionError::NothingPlaying),
        };
        Ok(self.state)
    }

    /// Advance unless already on the last track, then play.
    pub fn next(&mut self) -> Result<&str, SessionError> {
        if self.index + 1 < self.tracks.len() {
            self.index += 1;
        }
        self.play()
    }

    /// Step back and play. Does nothing on the first track.
    pub fn previous(&mut self) -> Result<Option<&str>, SessionError> {
        if self.index == 0 {
            return Ok(None);
        }
        self.index -= 1;
        self.play().map(Some)
    }

    pub fn volume_up(&mut self) -> u8 {
        self.volume = self.volume.saturating_add(self.volume_step).min(100);
        self.volume
    }

    pub fn volume_down(&mut self) -> u8 {
        self.volume = self.volume.saturating_sub(self.volume_step);
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session::new(
            vec![
                String::from("First"),
                String::from("Second"),
                String::from("Third"),
            ],
            75,
            10,
        )
    }

    #[test]
    fn test_empty_playlist() {
        let mut session = Session::new(Vec::new(), 50, 10);
        assert_eq!(session.play(), Err(SessionError::NoTracks));
        assert_eq!(session.next(), Err(SessionError::NoTracks));
        assert_eq!(session.previous(), Ok(None));
        assert_eq!(session.state(), PlayerState::Stopped);
    }

    #[test]
    fn test_toggle_needs_playback() {
        let mut session = session();
        assert_eq!(session.toggle_pause(), Err(SessionError::NothingPlaying));

        session.play().unwrap();
        assert_eq!(session.toggle_pause(), Ok(PlayerState::Paused));
        assert_eq!(session.toggle_pause(), Ok(PlayerState::Playing));
    }

    #[test]
    fn test_next_stops_at_last_track() {
        let mut session = session();
        assert_eq!(session.next(), Ok("Second"));
        assert_eq!(session.next(), Ok("Third"));
        // Replays the last track
        assert_eq!(session.next(), Ok("Third"));
        assert_eq!(session.index(), 2);
        assert_eq!(session.state(), PlayerState::Playing);
    }

    #[test]
    fn test_previous_on_first_track_is_noop() {
        let mut session = session();
        assert_eq!(session.previous(), Ok(None));
        assert_eq!(session.state(), PlayerState::Stopped);

        session.select(2);
        assert_eq!(session.previous(), Ok(Some("Second")));
        assert_eq!(session.index(), 1);
    }

    #[test]
    fn test_select_does_not_play() {
        let mut session = session();
        session.select(1);
        assert_eq!(session.current_track(), Some("Second"));
        assert_eq!(session.state(), PlayerState::Stopped);

        session.select(10);
        assert_eq!(session.index(), 1);
    }

    #[test]
    fn test_volume_is_clamped() {
        let mut session = session();
        assert_eq!(session.volume_up(), 85);
        assert_eq!(session.volume_up(), 95);
        assert_eq!(session.volume_up(), 100);
        assert_eq!(session.volume_up(), 100);

        let mut session = Session::new(Vec::new(), 15, 10);
        assert_eq!(session.volume_down(), 5);
        assert_eq!(session.volume_down(), 0);
        assert_eq!(session.volume_down(), 0);
    }

    #[test]
    fn test_initial_volume_clamped() {
        assert_eq!(Session::new(Vec::new(), 180, 10).volume(), 100);
    }
}
