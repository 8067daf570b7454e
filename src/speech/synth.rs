//! Speech synthesizer abstraction
//!
//! Engines report playback progress as [`SynthesisEvent`] messages on a
//! channel instead of invoking callbacks into application state.

use crate::Result;
use crossbeam_channel::Receiver;
use log::info;

/// Commands sent to a speech engine
#[derive(Debug, Clone, PartialEq)]
pub enum SpeechCommand {
    /// Speak a string of text
    Speak(String),
    /// Cancel/silence current speech
    Cancel,
    /// Rate multiplier, 1.0 is the engine's normal rate
    SetRate(f32),
    /// Pitch multiplier, 1.0 is the engine's normal pitch
    SetPitch(f32),
    /// Volume, 0.0 to 1.0
    SetVolume(f32),
    /// Pick the engine voice for a BCP 47 language tag
    SetLanguage(String),
}

/// Identifies one `speak` call. Ids from one engine never repeat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

/// Playback progress reported by the engine, tagged with the utterance it
/// belongs to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SynthesisEvent {
    /// Audio for the utterance started playing
    Started(UtteranceId),
    /// The utterance finished or was cancelled
    Ended(UtteranceId),
    /// The engine gave up on the utterance
    Failed(UtteranceId, String),
}

impl SynthesisEvent {
    pub fn utterance(&self) -> UtteranceId {
        match self {
            SynthesisEvent::Started(id)
            | SynthesisEvent::Ended(id)
            | SynthesisEvent::Failed(id, _) => *id,
        }
    }
}

/// Prosody settings as shown on the sliders
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prosody {
    rate: f32,
    pitch: f32,
    volume: f32,
}

impl Prosody {
    pub const RATE_RANGE: (f32, f32) = (0.5, 2.0);
    pub const PITCH_RANGE: (f32, f32) = (0.5, 2.0);
    pub const VOLUME_RANGE: (f32, f32) = (0.0, 1.0);

    /// Build from raw values, clamping each into its slider range
    pub fn new(rate: f32, pitch: f32, volume: f32) -> Self {
        Self::default()
            .with_rate(rate)
            .with_pitch(pitch)
            .with_volume(volume)
    }

    pub fn with_rate(self, rate: f32) -> Self {
        Self {
            rate: clamp_or(rate, Self::RATE_RANGE, self.rate),
            ..self
        }
    }

    pub fn with_pitch(self, pitch: f32) -> Self {
        Self {
            pitch: clamp_or(pitch, Self::PITCH_RANGE, self.pitch),
            ..self
        }
    }

    pub fn with_volume(self, volume: f32) -> Self {
        Self {
            volume: clamp_or(volume, Self::VOLUME_RANGE, self.volume),
            ..self
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    pub fn pitch(&self) -> f32 {
        self.pitch
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }
}

impl Default for Prosody {
    fn default() -> Self {
        Self {
            rate: 1.0,
            pitch: 1.0,
            volume: 0.8,
        }
    }
}

fn clamp_or(value: f32, (min, max): (f32, f32), fallback: f32) -> f32 {
    if value.is_finite() {
        value.clamp(min, max)
    } else {
        fallback
    }
}

/// Speech synthesizer trait
///
/// All engines implement this. Parameter setters take effect on the next
/// `speak` call.
pub trait Synth: Send {
    /// Send a raw command to the engine
    fn send(&mut self, cmd: SpeechCommand) -> Result<()> {
        match cmd {
            SpeechCommand::Speak(text) => self.speak(&text).map(|_| ()),
            SpeechCommand::Cancel => self.cancel(),
            SpeechCommand::SetRate(rate) => self.set_rate(rate),
            SpeechCommand::SetPitch(pitch) => self.set_pitch(pitch),
            SpeechCommand::SetVolume(volume) => self.set_volume(volume),
            SpeechCommand::SetLanguage(tag) => self.set_language(&tag),
        }
    }

    /// Set speech rate multiplier
    fn set_rate(&mut self, rate: f32) -> Result<()>;

    /// Set pitch multiplier
    fn set_pitch(&mut self, pitch: f32) -> Result<()>;

    /// Set volume (0.0-1.0)
    fn set_volume(&mut self, volume: f32) -> Result<()>;

    /// Select a voice speaking the given language
    fn set_language(&mut self, tag: &str) -> Result<()>;

    /// Start speaking; progress arrives on [`Synth::events`] tagged with
    /// the returned id
    fn speak(&mut self, text: &str) -> Result<UtteranceId>;

    /// Cancel current speech. Events already in flight for the cancelled
    /// utterance may still arrive.
    fn cancel(&mut self) -> Result<()>;

    /// Channel carrying this engine's playback events
    fn events(&self) -> Receiver<SynthesisEvent>;
}

/// Create the platform speech engine
///
/// Fails with `UnsupportedHostCapability` when the host has no engine or the
/// crate was built without one.
pub fn create_synth() -> Result<Box<dyn Synth>> {
    info!(
        "Creating speech synthesizer for platform: {}",
        std::env::consts::OS
    );

    #[cfg(feature = "native-tts")]
    {
        use super::backends::native::NativeSynth;

        let synth = NativeSynth::new()?;
        info!("Native speech engine initialized");
        Ok(Box::new(synth))
    }

    #[cfg(not(feature = "native-tts"))]
    {
        Err(crate::SpeechClipError::UnsupportedHostCapability(
            "built without a speech engine (enable the `native-tts` feature)".into(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prosody_defaults() {
        let prosody = Prosody::default();
        assert_eq!(prosody.rate(), 1.0);
        assert_eq!(prosody.pitch(), 1.0);
        assert_eq!(prosody.volume(), 0.8);
    }

    #[test]
    fn test_prosody_clamps() {
        let prosody = Prosody::new(5.0, 0.1, -1.0);
        assert_eq!(prosody.rate(), 2.0);
        assert_eq!(prosody.pitch(), 0.5);
        assert_eq!(prosody.volume(), 0.0);
    }

    #[test]
    fn test_event_utterance() {
        let id = UtteranceId(7);
        assert_eq!(SynthesisEvent::Started(id).utterance(), id);
        assert_eq!(SynthesisEvent::Failed(id, "x".into()).utterance(), id);
    }

    #[test]
    fn test_prosody_ignores_nan() {
        let prosody = Prosody::default().with_rate(f32::NAN);
        assert_eq!(prosody.rate(), 1.0);
    }
}
