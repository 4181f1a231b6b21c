//! Playback state controlled by the application.

pub mod session;

pub use session::{Session, SessionError};
