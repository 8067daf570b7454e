//! Native speech engine using the tts crate
//!
//! The `tts` crate wraps the platform engine:
//! - Speech Dispatcher on Linux
//! - AVFoundation on macOS/iOS
//! - WinRT/SAPI on Windows
//!
//! Utterance callbacks are turned into [`SynthesisEvent`]s. Engines without
//! callbacks are watched through `is_speaking` on a helper thread.

use crate::speech::{Synth, SynthesisEvent, UtteranceId};
use crate::{Result, SpeechClipError};
use crossbeam_channel::{Receiver, Sender};
use log::{debug, error, warn};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tts::{Tts as TtsCrate, UtteranceId as EngineUtteranceId};

const SPEAKING_POLL: Duration = Duration::from_millis(50);

type UtteranceMap = Arc<Mutex<HashMap<EngineUtteranceId, UtteranceId>>>;

/// Native TTS backend using the tts crate
pub struct NativeSynth {
    tts: TtsCrate,
    events_tx: Sender<SynthesisEvent>,
    events_rx: Receiver<SynthesisEvent>,
    /// Engine reports utterance begin/end itself
    callbacks: bool,
    next_id: u64,
    /// Engine ids of utterances still playing, mapped to ours
    utterances: UtteranceMap,
    /// Our id of the utterance most recently handed to the engine
    current: Arc<AtomicU64>,
    /// Stop flag of the running `is_speaking` watcher
    watch_stop: Option<Arc<AtomicBool>>,
}

/// Our id for an engine utterance. A callback can fire before `speak` has
/// recorded the mapping; that utterance is then the current one.
fn resolve(
    utterances: &UtteranceMap,
    current: &AtomicU64,
    engine_id: EngineUtteranceId,
    finished: bool,
) -> UtteranceId {
    let known = utterances.lock().ok().and_then(|mut map| {
        if finished {
            map.remove(&engine_id)
        } else {
            map.get(&engine_id).copied()
        }
    });
    known.unwrap_or_else(|| UtteranceId(current.load(Ordering::SeqCst)))
}

impl NativeSynth {
    /// Create a new native synthesizer
    pub fn new() -> Result<Self> {
        debug!("Creating native TTS backend");

        let tts = TtsCrate::default().map_err(|e| {
            SpeechClipError::UnsupportedHostCapability(format!("no speech engine: {}", e))
        })?;
        let (events_tx, events_rx) = crossbeam_channel::unbounded();
        let utterances: UtteranceMap = Arc::new(Mutex::new(HashMap::new()));
        let current = Arc::new(AtomicU64::new(0));

        let features = tts.supported_features();
        let callbacks = features.utterance_callbacks;
        if callbacks {
            let (begin, map, cur) = (events_tx.clone(), utterances.clone(), current.clone());
            tts.on_utterance_begin(Some(Box::new(move |engine_id| {
                let id = resolve(&map, &cur, engine_id, false);
                let _ = begin.send(SynthesisEvent::Started(id));
            })))
            .map_err(|e| SpeechClipError::Speech(format!("Failed to register callback: {}", e)))?;

            let (end, map, cur) = (events_tx.clone(), utterances.clone(), current.clone());
            tts.on_utterance_end(Some(Box::new(move |engine_id| {
                let id = resolve(&map, &cur, engine_id, true);
                let _ = end.send(SynthesisEvent::Ended(id));
            })))
            .map_err(|e| SpeechClipError::Speech(format!("Failed to register callback: {}", e)))?;

            let (stop, map, cur) = (events_tx.clone(), utterances.clone(), current.clone());
            tts.on_utterance_stop(Some(Box::new(move |engine_id| {
                let id = resolve(&map, &cur, engine_id, true);
                let _ = stop.send(SynthesisEvent::Ended(id));
            })))
            .map_err(|e| SpeechClipError::Speech(format!("Failed to register callback: {}", e)))?;
        } else if !features.is_speaking {
            return Err(SpeechClipError::UnsupportedHostCapability(
                "speech engine reports neither utterance events nor speaking state".into(),
            ));
        }

        debug!("Native TTS backend created (callbacks: {})", callbacks);

        Ok(Self {
            tts,
            events_tx,
            events_rx,
            callbacks,
            next_id: 0,
            utterances,
            current,
            watch_stop: None,
        })
    }

    /// Map a multiplier around the engine's normal value into its range
    fn scale(normal: f32, min: f32, max: f32, factor: f32) -> f32 {
        (normal * factor).clamp(min.min(max), max.max(min))
    }

    /// Tell the running watcher, if any, to exit without reporting
    fn stop_watch(&mut self) {
        if let Some(stop) = self.watch_stop.take() {
            stop.store(true, Ordering::SeqCst);
        }
    }

    /// Emit begin/end for engines without callbacks
    fn watch_playback(&mut self, id: UtteranceId) {
        let _ = self.events_tx.send(SynthesisEvent::Started(id));
        let stop = Arc::new(AtomicBool::new(false));
        self.watch_stop = Some(stop.clone());

        let tts = self.tts.clone();
        let events = self.events_tx.clone();
        let spawned = thread::Builder::new()
            .name("tts-watch".into())
            .spawn(move || {
                // Give the engine a moment to report that it has started
                thread::sleep(SPEAKING_POLL);
                while !stop.load(Ordering::SeqCst) {
                    match tts.is_speaking() {
                        Ok(true) => thread::sleep(SPEAKING_POLL),
                        Ok(false) => {
                            let _ = events.send(SynthesisEvent::Ended(id));
                            return;
                        }
                        Err(e) => {
                            let _ = events.send(SynthesisEvent::Failed(id, e.to_string()));
                            return;
                        }
                    }
                }
                debug!("Watcher for utterance {} cancelled", id.0);
            });
        if let Err(e) = spawned {
            error!("Failed to watch playback: {}", e);
            let _ = self
                .events_tx
                .send(SynthesisEvent::Failed(id, format!("watcher thread: {}", e)));
        }
    }
}

impl Synth for NativeSynth {
    fn set_rate(&mut self, rate: f32) -> Result<()> {
        debug!("Setting rate to {}", rate);
        if !self.tts.supported_features().rate {
            warn!("Rate control not supported on this platform");
            return Ok(());
        }
        let value = Self::scale(
            self.tts.normal_rate(),
            self.tts.min_rate(),
            self.tts.max_rate(),
            rate,
        );
        self.tts
            .set_rate(value)
            .map_err(|e| SpeechClipError::Speech(format!("Failed to set rate: {}", e)))?;
        Ok(())
    }

    fn set_pitch(&mut self, pitch: f32) -> Result<()> {
        debug!("Setting pitch to {}", pitch);
        if !self.tts.supported_features().pitch {
            warn!("Pitch control not supported on this platform");
            return Ok(());
        }
        let value = Self::scale(
            self.tts.normal_pitch(),
            self.tts.min_pitch(),
            self.tts.max_pitch(),
            pitch,
        );
        self.tts
            .set_pitch(value)
            .map_err(|e| SpeechClipError::Speech(format!("Failed to set pitch: {}", e)))?;
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        debug!("Setting volume to {}", volume);
        if !self.tts.supported_features().volume {
            warn!("Volume control not supported on this platform");
            return Ok(());
        }
        let min = self.tts.min_volume();
        let max = self.tts.max_volume();
        let value = min + (max - min) * volume.clamp(0.0, 1.0);
        self.tts
            .set_volume(value)
            .map_err(|e| SpeechClipError::Speech(format!("Failed to set volume: {}", e)))?;
        Ok(())
    }

    fn set_language(&mut self, tag: &str) -> Result<()> {
        if !self.tts.supported_features().voice {
            warn!("Voice selection not supported on this platform");
            return Ok(());
        }

        let voices = self
            .tts
            .voices()
            .map_err(|e| SpeechClipError::Speech(format!("Failed to get voices: {}", e)))?;

        let primary = tag.split('-').next().unwrap_or(tag);
        let chosen = voices
            .iter()
            .find(|v| v.language().as_str().starts_with(tag))
            .or_else(|| {
                voices
                    .iter()
                    .find(|v| v.language().as_str().starts_with(primary))
            });

        match chosen {
            Some(voice) => {
                debug!("Selecting voice: {} ({})", voice.name(), voice.language());
                self.tts
                    .set_voice(voice)
                    .map_err(|e| SpeechClipError::Speech(format!("Failed to set voice: {}", e)))?;
            }
            None => warn!(
                "No engine voice for {} (have {} voices); using default",
                tag,
                voices.len()
            ),
        }
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<UtteranceId> {
        self.next_id += 1;
        let id = UtteranceId(self.next_id);
        self.current.store(id.0, Ordering::SeqCst);
        self.stop_watch();

        if text.is_empty() {
            let _ = self.events_tx.send(SynthesisEvent::Ended(id));
            return Ok(id);
        }

        debug!("Speaking {} chars as utterance {}", text.chars().count(), id.0);
        let engine_id = self.tts.speak(text, true).map_err(|e| {
            error!("Failed to speak: {}", e);
            SpeechClipError::Speech(format!("Speak failed: {}", e))
        })?;

        if let Some(engine_id) = engine_id {
            if let Ok(mut map) = self.utterances.lock() {
                map.insert(engine_id, id);
            }
        }
        if !self.callbacks {
            self.watch_playback(id);
        }
        Ok(id)
    }

    fn cancel(&mut self) -> Result<()> {
        debug!("Canceling speech");
        self.stop_watch();
        self.tts.stop().map_err(|e| {
            error!("Failed to cancel speech: {}", e);
            SpeechClipError::Speech(format!("Cancel failed: {}", e))
        })?;
        Ok(())
    }

    fn events(&self) -> Receiver<SynthesisEvent> {
        self.events_rx.clone()
    }
}
