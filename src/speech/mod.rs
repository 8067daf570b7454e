//! Speech synthesis and the playback-driven recording controller

pub mod backends;
pub mod controller;
pub mod synth;

pub use controller::{PlaybackState, SynthesisController, SynthesisRequest};
pub use synth::{create_synth, Prosody, SpeechCommand, Synth, SynthesisEvent, UtteranceId};
