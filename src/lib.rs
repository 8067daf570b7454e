//! speechclip - text-to-speech studio
//!
//! Speaks text through the host's speech engine while recording the
//! playback from an audio input, then trims the recording to a percentage
//! window and exports it as a 16-bit PCM WAV file.

pub mod audio;
pub mod capture;
pub mod error;
pub mod export;
pub mod notice;
pub mod projects;
pub mod speech;
pub mod state;
pub mod voices;

pub use error::{Result, SpeechClipError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const APP_NAME: &str = "speechclip";
