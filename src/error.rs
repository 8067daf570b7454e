//! Error types for speechclip

use std::io;
use thiserror::Error;

/// Main error type for speechclip
#[derive(Error, Debug)]
pub enum SpeechClipError {
    /// The audio input could not be opened (no device, no permission)
    #[error("Input device unavailable: {0}")]
    DeviceUnavailable(String),

    /// Clip bytes are not a valid or supported audio container
    #[error("Could not decode audio: {0}")]
    Decode(String),

    /// Nothing to work on: no text to speak, no clip to export
    #[error("Nothing to process: {0}")]
    EmptyInput(String),

    /// The host is missing a required facility (e.g. no speech engine)
    #[error("Unsupported on this host: {0}")]
    UnsupportedHostCapability(String),

    #[error("Speech synthesis error: {0}")]
    Speech(String),

    #[error("WAV encoding error: {0}")]
    Encode(String),

    #[error("Unknown voice: {0}")]
    UnknownVoice(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("INI parse error: {0}")]
    IniParse(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("{0}")]
    Other(String),
}

impl SpeechClipError {
    /// Whether this error should be shown to the user as a notice and the
    /// current flow continued, rather than aborting the operation.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            SpeechClipError::DeviceUnavailable(_) | SpeechClipError::Decode(_)
        )
    }
}

/// Result type alias for speechclip operations
pub type Result<T> = std::result::Result<T, SpeechClipError>;

impl From<String> for SpeechClipError {
    fn from(s: String) -> Self {
        SpeechClipError::Other(s)
    }
}

impl From<&str> for SpeechClipError {
    fn from(s: &str) -> Self {
        SpeechClipError::Other(s.to_string())
    }
}

// Clips are read from memory, so an I/O failure inside hound means the
// container is truncated or malformed.
impl From<hound::Error> for SpeechClipError {
    fn from(e: hound::Error) -> Self {
        SpeechClipError::Decode(format!("WAV: {}", e))
    }
}
