//! Synthesis controller
//!
//! Speaks a request through the engine and records the playback: the
//! engine's `Started` event opens the input and starts a capture session,
//! `Ended`/`Failed` stop it and keep the clip. Events for any utterance other
//! than the one most recently spoken are dropped.

use super::{Prosody, Synth, SynthesisEvent, UtteranceId};
use crate::audio::CompressedClip;
use crate::capture::{CaptureSession, InputDevice, WaveformTap};
use crate::notice::Notice;
use crate::voices::VoiceProfile;
use crate::{Result, SpeechClipError};
use crossbeam_channel::Receiver;
use log::{debug, info, warn};

/// What to say and how
#[derive(Debug, Clone)]
pub struct SynthesisRequest<'a> {
    pub text: &'a str,
    pub voice: &'a VoiceProfile,
    pub prosody: Prosody,
}

/// Where the most recent utterance is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing spoken yet
    Idle,
    /// Handed to the engine, not started yet
    Pending,
    Playing,
    /// Played to the end
    Finished,
    /// Stopped by the user
    Cancelled,
    /// The engine gave up
    Failed,
}

pub struct SynthesisController {
    synth: Option<Box<dyn Synth>>,
    events: Option<Receiver<SynthesisEvent>>,
    input: Box<dyn InputDevice>,
    capture: CaptureSession,
    capture_enabled: bool,
    tap: Option<WaveformTap>,
    state: PlaybackState,
    utterance: Option<UtteranceId>,
    voice_name: String,
    clip: Option<CompressedClip>,
    notices: Vec<Notice>,
}

impl SynthesisController {
    /// `synth` is `None` when the host has no speech engine; speaking then
    /// fails with `UnsupportedHostCapability`.
    pub fn new(synth: Option<Box<dyn Synth>>, input: Box<dyn InputDevice>) -> Self {
        let events = synth.as_ref().map(|s| s.events());
        Self {
            synth,
            events,
            input,
            capture: CaptureSession::new(),
            capture_enabled: true,
            tap: None,
            state: PlaybackState::Idle,
            utterance: None,
            voice_name: String::new(),
            clip: None,
            notices: Vec::new(),
        }
    }

    /// Feed recorded audio to a waveform tap while capturing
    pub fn with_tap(mut self, tap: WaveformTap) -> Self {
        self.tap = Some(tap);
        self
    }

    /// Turn recording of playback on or off
    pub fn set_capture_enabled(&mut self, enabled: bool) {
        self.capture_enabled = enabled;
    }

    pub fn has_engine(&self) -> bool {
        self.synth.is_some()
    }

    pub fn is_playing(&self) -> bool {
        self.state == PlaybackState::Playing
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    /// The utterance whose events are being followed
    pub fn utterance(&self) -> Option<UtteranceId> {
        self.utterance
    }

    pub fn is_recording(&self) -> bool {
        self.capture.is_recording()
    }

    /// Start speaking, or stop if already speaking.
    ///
    /// Empty text is rejected before the engine or the input device is
    /// touched.
    pub fn toggle(&mut self, request: &SynthesisRequest<'_>) -> Result<()> {
        if request.text.trim().is_empty() {
            return Err(SpeechClipError::EmptyInput("enter some text to speak".into()));
        }
        if self.is_playing() {
            self.cancel();
            return Ok(());
        }

        let synth = self.synth.as_mut().ok_or_else(|| {
            SpeechClipError::UnsupportedHostCapability("no speech engine available".into())
        })?;

        synth.set_language(request.voice.language.tag())?;
        synth.set_rate(request.prosody.rate())?;
        synth.set_pitch(request.prosody.pitch())?;
        synth.set_volume(request.prosody.volume())?;

        // A new run replaces whatever was recorded before
        self.clip = None;
        self.voice_name = request.voice.name.to_string();

        info!(
            "Speaking {} chars as {} (rate {}, pitch {}, volume {})",
            request.text.chars().count(),
            request.voice.id,
            request.prosody.rate(),
            request.prosody.pitch(),
            request.prosody.volume()
        );
        let id = synth.speak(request.text)?;
        self.utterance = Some(id);
        self.state = PlaybackState::Pending;
        Ok(())
    }

    /// Silence the engine and stop recording right away.
    ///
    /// Whatever was captured so far is kept.
    pub fn cancel(&mut self) {
        if let Some(synth) = self.synth.as_mut() {
            if let Err(e) = synth.cancel() {
                warn!("Cancel failed: {}", e);
            }
        }
        // Whatever the engine still reports for this utterance is stale now
        self.utterance = None;
        self.state = PlaybackState::Cancelled;
        self.finish_capture();
    }

    /// Handle all engine events already queued. Returns how many there were.
    pub fn pump(&mut self) -> usize {
        let Some(events) = self.events.clone() else {
            return 0;
        };
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            self.handle_event(event);
            handled += 1;
        }
        handled
    }

    pub fn handle_event(&mut self, event: SynthesisEvent) {
        if self.utterance != Some(event.utterance()) {
            debug!("Ignoring event for stale utterance: {:?}", event);
            return;
        }
        debug!("Synthesis event: {:?}", event);
        match event {
            SynthesisEvent::Started(_) => {
                self.state = PlaybackState::Playing;
                self.notices.push(Notice::info(
                    "Playback",
                    format!("Speaking as {}", self.voice_name),
                ));
                self.start_capture();
            }
            SynthesisEvent::Ended(_) => {
                self.utterance = None;
                self.state = PlaybackState::Finished;
                self.finish_capture();
            }
            SynthesisEvent::Failed(_, reason) => {
                self.utterance = None;
                self.state = PlaybackState::Failed;
                self.finish_capture();
                self.notices
                    .push(Notice::error("Error", format!("Playback failed: {}", reason)));
            }
        }
    }

    fn start_capture(&mut self) {
        if !self.capture_enabled || self.capture.is_recording() {
            return;
        }
        if let Some(tap) = &self.tap {
            tap.clear();
        }

        let stream = match self.input.open() {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Recording unavailable: {}", e);
                self.notices.push(Notice::warning(
                    "Recording unavailable",
                    format!("{}; speech will play without a recording", e),
                ));
                return;
            }
        };

        if let Err(e) = self.capture.start(stream, self.tap.clone()) {
            warn!("Recording failed to start: {}", e);
            self.notices.push(Notice::warning(
                "Recording unavailable",
                format!("{}; speech will play without a recording", e),
            ));
        }
    }

    fn finish_capture(&mut self) {
        if !self.capture.is_recording() {
            return;
        }
        let clip = self.capture.stop();
        if clip.is_empty() {
            self.notices
                .push(Notice::warning("Recording", "No audio was captured"));
        } else {
            self.clip = Some(clip);
        }
    }

    /// The most recent recording
    pub fn clip(&self) -> Option<&CompressedClip> {
        self.clip.as_ref()
    }

    pub fn clear_clip(&mut self) {
        self.clip = None;
    }

    /// Notices raised since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }
}

impl Drop for SynthesisController {
    fn drop(&mut self) {
        if matches!(self.state, PlaybackState::Pending | PlaybackState::Playing) {
            if let Some(synth) = self.synth.as_mut() {
                let _ = synth.cancel();
            }
        }
    }
}
