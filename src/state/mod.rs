//! Studio state
//!
//! The `Studio` is what the front-end drives: the text being voiced, the
//! chosen persona and sliders, edit mode with its trim range, the last
//! recording and the saved projects.

pub mod config;

use crate::audio::{CompressedClip, TrimRange};
use crate::capture::{default_input_device, InputDevice, WaveformTap};
use crate::export::{prepare_download, Download};
use crate::notice::Notice;
use crate::projects::{Project, ProjectList};
use crate::speech::{
    create_synth, PlaybackState, Prosody, Synth, SynthesisController, SynthesisRequest,
};
use crate::voices::{default_voice, find_voice, VoiceProfile};
use crate::{Result, SpeechClipError};
use chrono::Local;
use config::Config;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;

pub struct Studio {
    /// Configuration loaded from ~/.speechclip.cfg
    pub config: Config,

    controller: SynthesisController,
    projects: ProjectList,
    tap: WaveformTap,

    text: String,
    voice: &'static VoiceProfile,
    prosody: Prosody,

    /// Trim sliders are shown and applied on download
    edit_mode: bool,
    trim: TrimRange,

    /// Playback progress, 0 to 100
    progress: f64,
    /// Estimated length of the run being played, in seconds
    playback_duration: f64,

    notices: Vec<Notice>,
}

impl Studio {
    /// Create a studio on the host's speech engine and default input.
    ///
    /// A missing engine is not fatal here; speaking reports it.
    pub fn new(config: Config) -> Self {
        let synth = match create_synth() {
            Ok(synth) => Some(synth),
            Err(e) => {
                warn!("Speech engine unavailable: {}", e);
                None
            }
        };
        Self::with_backends(config, synth, default_input_device())
    }

    /// Create a studio on the given engine and input device
    pub fn with_backends(
        config: Config,
        synth: Option<Box<dyn Synth>>,
        input: Box<dyn InputDevice>,
    ) -> Self {
        let voice = match find_voice(&config.voice_id()) {
            Some(voice) => voice,
            None => {
                warn!(
                    "Unknown voice '{}' in config, using {}",
                    config.voice_id(),
                    default_voice().id
                );
                default_voice()
            }
        };
        let prosody = config.prosody();
        let tap = WaveformTap::new(config.waveform_window(), config.waveform_rate_hz());

        let mut controller = SynthesisController::new(synth, input).with_tap(tap.clone());
        controller.set_capture_enabled(config.capture_enabled());

        info!("Configuration loaded from {:?}", config.path());
        info!("  Voice: {} ({})", voice.id, voice.name);
        info!(
            "  Rate {}, pitch {}, volume {}",
            prosody.rate(),
            prosody.pitch(),
            prosody.volume()
        );
        info!("  Capture: {}", config.capture_enabled());

        Self {
            config,
            controller,
            projects: ProjectList::with_demo(),
            tap,
            text: String::new(),
            voice,
            prosody,
            edit_mode: false,
            trim: TrimRange::FULL,
            progress: 0.0,
            playback_duration: 0.0,
            notices: Vec::new(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn voice(&self) -> &'static VoiceProfile {
        self.voice
    }

    pub fn select_voice(&mut self, id: &str) -> Result<&'static VoiceProfile> {
        let voice = find_voice(id).ok_or_else(|| SpeechClipError::UnknownVoice(id.to_string()))?;
        self.voice = voice;
        Ok(voice)
    }

    pub fn prosody(&self) -> Prosody {
        self.prosody
    }

    pub fn set_rate(&mut self, rate: f32) -> f32 {
        self.prosody = self.prosody.with_rate(rate);
        self.prosody.rate()
    }

    pub fn set_pitch(&mut self, pitch: f32) -> f32 {
        self.prosody = self.prosody.with_pitch(pitch);
        self.prosody.pitch()
    }

    pub fn set_volume(&mut self, volume: f32) -> f32 {
        self.prosody = self.prosody.with_volume(volume);
        self.prosody.volume()
    }

    /// Speak the current text, or stop if already speaking
    pub fn toggle_playback(&mut self) -> Result<()> {
        let was_playing = self.controller.is_playing();
        let request = SynthesisRequest {
            text: &self.text,
            voice: self.voice,
            prosody: self.prosody,
        };
        self.controller.toggle(&request)?;
        if !was_playing {
            self.playback_duration = self.estimated_duration();
        }
        self.progress = 0.0;
        Ok(())
    }

    pub fn is_playing(&self) -> bool {
        self.controller.is_playing()
    }

    pub fn is_recording(&self) -> bool {
        self.controller.is_recording()
    }

    /// Handle pending engine events and advance playback progress by
    /// `elapsed`. Returns how many events were handled.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        let handled = self.controller.pump();
        match self.controller.state() {
            PlaybackState::Playing => {
                if self.playback_duration > 0.0 {
                    let step = elapsed.as_secs_f64() * 100.0 / self.playback_duration;
                    self.progress = (self.progress + step).min(100.0);
                }
            }
            PlaybackState::Finished => self.progress = 100.0,
            PlaybackState::Cancelled | PlaybackState::Failed => self.progress = 0.0,
            PlaybackState::Idle | PlaybackState::Pending => {}
        }
        handled
    }

    /// Playback progress in percent
    pub fn progress(&self) -> f64 {
        self.progress
    }

    /// Whole seconds played so far
    pub fn elapsed_seconds(&self) -> u64 {
        (self.progress / 100.0 * self.playback_duration).floor() as u64
    }

    /// Whole seconds the current run is expected to take
    pub fn total_seconds(&self) -> u64 {
        self.playback_duration.floor() as u64
    }

    pub fn edit_mode(&self) -> bool {
        self.edit_mode
    }

    /// Flip edit mode. Entering it starts from the full range.
    pub fn toggle_edit_mode(&mut self) -> bool {
        self.edit_mode = !self.edit_mode;
        if self.edit_mode {
            self.trim = TrimRange::FULL;
        }
        self.edit_mode
    }

    pub fn trim_range(&self) -> TrimRange {
        self.trim
    }

    pub fn set_trim_start(&mut self, start_pct: f64) -> TrimRange {
        self.trim = self.trim.with_start(start_pct);
        self.trim
    }

    pub fn set_trim_end(&mut self, end_pct: f64) -> TrimRange {
        self.trim = self.trim.with_end(end_pct);
        self.trim
    }

    /// Rough playback length in seconds: ten characters a second at rate 1
    pub fn estimated_duration(&self) -> f64 {
        self.text.chars().count() as f64 / 10.0 / self.prosody.rate() as f64
    }

    /// Whole seconds left after trimming
    pub fn trimmed_duration(&self) -> u64 {
        let fraction = if self.edit_mode {
            self.trim.fraction()
        } else {
            1.0
        };
        (self.estimated_duration() * fraction).floor() as u64
    }

    pub fn clip(&self) -> Option<&CompressedClip> {
        self.controller.clip()
    }

    pub fn clear_clip(&mut self) {
        self.controller.clear_clip();
    }

    /// Prepare the current recording for download.
    ///
    /// A failed trim still produces the untouched recording, with a notice.
    pub fn download(&mut self) -> Result<Download> {
        let download = prepare_download(
            self.controller.clip(),
            self.trim,
            self.edit_mode,
            &self.config.export_label(),
            self.voice.name,
            Local::now().timestamp_millis(),
        )?;

        if let Some(error) = &download.fallback {
            self.notices.push(Notice::warning(
                "Trim failed",
                format!("{}; downloading the original recording", error),
            ));
        } else if download.trimmed {
            self.notices.push(Notice::info(
                "Processing complete",
                "Audio trimmed to the selected range",
            ));
        }
        Ok(download)
    }

    /// Prepare the download and write it to the configured directory
    pub fn save_download(&mut self) -> Result<PathBuf> {
        let download = self.download()?;
        let path = download.write_to(self.config.export_dir())?;
        self.notices.push(Notice::info(
            "Downloaded",
            format!("{}", path.display()),
        ));
        Ok(path)
    }

    pub fn projects(&self) -> &ProjectList {
        &self.projects
    }

    pub fn save_project(&mut self) -> Result<&Project> {
        let project = self.projects.save(&self.text, self.voice.id)?;
        self.notices
            .push(Notice::info("Saved", project.name.clone()));
        Ok(project)
    }

    /// Restore text and voice from the project at `index`
    pub fn load_project(&mut self, index: usize) -> Result<()> {
        let project = self
            .projects
            .get(index)
            .ok_or_else(|| SpeechClipError::Other(format!("no project #{}", index + 1)))?;
        let voice = find_voice(&project.voice_id).unwrap_or_else(default_voice);
        self.text = project.text.clone();
        self.voice = voice;
        info!("Loaded {}", project.name);
        let message = format!("Project \"{}\" loaded", project.name);
        self.notices.push(Notice::info("Loaded", message));
        Ok(())
    }

    /// Latest waveform window, mono
    pub fn waveform(&self) -> Vec<f32> {
        self.tap.snapshot()
    }

    /// Notices from the studio and the controller since the last call
    pub fn take_notices(&mut self) -> Vec<Notice> {
        let mut notices = std::mem::take(&mut self.notices);
        notices.extend(self.controller.take_notices());
        notices
    }
}
