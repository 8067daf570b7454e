//! Platform-specific speech engines

// Native TTS backend using the tts crate (cross-platform)
#[cfg(feature = "native-tts")]
pub mod native;
