//! Integration tests for the synthesis controller
//!
//! A scripted engine and a counting input device stand in for the host,
//! so playback, recording and cancellation can be driven deterministically.

use crossbeam_channel::{Receiver, Sender};
use speechclip::audio::{decode_clip, CompressedClip};
use speechclip::capture::{CaptureEvent, InputDevice, InputStream, WaveformTap};
use speechclip::speech::{
    create_synth, PlaybackState, Prosody, Synth, SynthesisController, SynthesisEvent,
    SynthesisRequest, UtteranceId,
};
use speechclip::voices::find_voice;
use speechclip::{Result, SpeechClipError};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Engine that reports `Started` on speak and, optionally, `Ended` right after
struct ScriptedSynth {
    tx: Sender<SynthesisEvent>,
    rx: Receiver<SynthesisEvent>,
    finish_immediately: bool,
    spoken: u64,
    log: Arc<Mutex<Vec<String>>>,
}

impl ScriptedSynth {
    fn new(finish_immediately: bool, log: Arc<Mutex<Vec<String>>>) -> Self {
        let (tx, rx) = crossbeam_channel::unbounded();
        Self {
            tx,
            rx,
            finish_immediately,
            spoken: 0,
            log,
        }
    }

    fn record(&self, entry: String) {
        self.log.lock().unwrap().push(entry);
    }
}

impl Synth for ScriptedSynth {
    fn set_rate(&mut self, rate: f32) -> Result<()> {
        self.record(format!("rate {}", rate));
        Ok(())
    }

    fn set_pitch(&mut self, pitch: f32) -> Result<()> {
        self.record(format!("pitch {}", pitch));
        Ok(())
    }

    fn set_volume(&mut self, volume: f32) -> Result<()> {
        self.record(format!("volume {}", volume));
        Ok(())
    }

    fn set_language(&mut self, tag: &str) -> Result<()> {
        self.record(format!("language {}", tag));
        Ok(())
    }

    fn speak(&mut self, text: &str) -> Result<UtteranceId> {
        self.record(format!("speak {}", text));
        self.spoken += 1;
        let id = UtteranceId(self.spoken);
        let _ = self.tx.send(SynthesisEvent::Started(id));
        if self.finish_immediately {
            let _ = self.tx.send(SynthesisEvent::Ended(id));
        }
        Ok(id)
    }

    fn cancel(&mut self) -> Result<()> {
        self.record("cancel".to_string());
        let _ = self.tx.send(SynthesisEvent::Ended(UtteranceId(self.spoken)));
        Ok(())
    }

    fn events(&self) -> Receiver<SynthesisEvent> {
        self.rx.clone()
    }
}

/// Counts opens and how many streams are currently held
#[derive(Clone, Default)]
struct Counters {
    opened: Arc<AtomicUsize>,
    held: Arc<AtomicUsize>,
}

struct CountingDevice {
    counters: Counters,
    chunks: Vec<Vec<u8>>,
}

impl InputDevice for CountingDevice {
    fn open(&mut self) -> Result<Box<dyn InputStream>> {
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.held.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(CountingStream {
            held: self.counters.held.clone(),
            chunks: self.chunks.clone(),
            events: None,
            released: false,
        }))
    }
}

struct CountingStream {
    held: Arc<AtomicUsize>,
    chunks: Vec<Vec<u8>>,
    events: Option<Sender<CaptureEvent>>,
    released: bool,
}

impl InputStream for CountingStream {
    fn mime_type(&self) -> String {
        CompressedClip::pcm_mime(8000, 1)
    }

    fn record(&mut self, events: Sender<CaptureEvent>, tap: Option<WaveformTap>) -> Result<()> {
        for chunk in &self.chunks {
            let _ = events.send(CaptureEvent::ChunkAvailable(chunk.clone()));
            if let Some(tap) = &tap {
                let samples: Vec<f32> = chunk
                    .chunks_exact(2)
                    .map(|b| i16::from_le_bytes([b[0], b[1]]) as f32 / 32768.0)
                    .collect();
                tap.feed(&samples, 1);
            }
        }
        self.events = Some(events);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if let Some(events) = self.events.take() {
            let _ = events.send(CaptureEvent::RecordingStopped);
        }
        Ok(())
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            self.held.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

fn controller(
    finish_immediately: bool,
    chunks: Vec<Vec<u8>>,
) -> (SynthesisController, Counters, Arc<Mutex<Vec<String>>>) {
    let counters = Counters::default();
    let log = Arc::new(Mutex::new(Vec::new()));
    let synth = ScriptedSynth::new(finish_immediately, log.clone());
    let device = CountingDevice {
        counters: counters.clone(),
        chunks,
    };
    let controller = SynthesisController::new(Some(Box::new(synth)), Box::new(device));
    (controller, counters, log)
}

fn request(text: &str) -> SynthesisRequest<'_> {
    SynthesisRequest {
        text,
        voice: find_voice("en-2").unwrap(),
        prosody: Prosody::new(1.5, 0.75, 0.5),
    }
}

#[test]
fn test_empty_text_starts_nothing() {
    let (mut controller, counters, log) = controller(true, vec![vec![1, 0]]);

    let result = controller.toggle(&request("   "));
    assert!(matches!(result, Err(SpeechClipError::EmptyInput(_))));

    controller.pump();
    assert_eq!(counters.opened.load(Ordering::SeqCst), 0);
    assert!(!controller.is_recording());
    assert!(controller.clip().is_none());
    assert!(log.lock().unwrap().is_empty());
}

#[test]
fn test_settings_pushed_before_speaking() {
    let (mut controller, _, log) = controller(true, vec![]);
    controller.toggle(&request("Hello")).unwrap();

    let log = log.lock().unwrap();
    assert_eq!(
        *log,
        vec![
            "language en-US".to_string(),
            "rate 1.5".to_string(),
            "pitch 0.75".to_string(),
            "volume 0.5".to_string(),
            "speak Hello".to_string(),
        ]
    );
}

#[test]
fn test_playback_is_recorded() {
    let chunks = vec![vec![0x00, 0x40], vec![0x00, 0xc0]];
    let (mut controller, counters, _) = controller(true, chunks);

    controller.toggle(&request("Hello")).unwrap();
    assert_eq!(controller.pump(), 2);

    assert!(!controller.is_playing());
    assert!(!controller.is_recording());
    let clip = controller.clip().expect("clip recorded");
    assert_eq!(clip.bytes(), &[0x00, 0x40, 0x00, 0xc0]);

    let decoded = decode_clip(clip).unwrap();
    assert_eq!(decoded.len(), 2);
    assert_eq!(decoded.channel(0)[1], -0.5);
    assert_eq!(counters.held.load(Ordering::SeqCst), 0);
}

#[test]
fn test_two_cycles_release_the_device() {
    let (mut controller, counters, _) = controller(true, vec![vec![1, 0]]);

    for _ in 0..2 {
        controller.toggle(&request("Hello")).unwrap();
        controller.pump();
        assert!(controller.clip().is_some());
        assert_eq!(counters.held.load(Ordering::SeqCst), 0);
    }
    assert_eq!(counters.opened.load(Ordering::SeqCst), 2);
}

#[test]
fn test_cancel_keeps_truncated_clip() {
    let (mut controller, counters, log) = controller(false, vec![vec![7, 0], vec![8, 0]]);

    controller.toggle(&request("A long sentence")).unwrap();
    controller.pump();
    assert!(controller.is_playing());
    assert!(controller.is_recording());

    // Toggling while playing stops right away
    controller.toggle(&request("A long sentence")).unwrap();
    assert!(!controller.is_playing());
    assert!(!controller.is_recording());
    assert_eq!(controller.clip().unwrap().bytes(), &[7, 0, 8, 0]);
    assert_eq!(counters.held.load(Ordering::SeqCst), 0);
    assert_eq!(log.lock().unwrap().last().map(String::as_str), Some("cancel"));

    // The engine's trailing end event changes nothing
    controller.pump();
    assert_eq!(controller.clip().unwrap().bytes(), &[7, 0, 8, 0]);
}

#[test]
fn test_new_run_discards_previous_clip() {
    let (mut controller, _, _) = controller(false, vec![vec![1, 0]]);

    controller.toggle(&request("first")).unwrap();
    controller.pump();
    controller.toggle(&request("first")).unwrap();
    controller.pump();
    assert!(controller.clip().is_some());

    controller.toggle(&request("second")).unwrap();
    assert!(controller.clip().is_none());
}

#[test]
fn test_failed_playback_raises_notice() {
    let (mut controller, counters, _) = controller(false, vec![vec![1, 0]]);

    controller.toggle(&request("Hello")).unwrap();
    controller.pump();
    let id = controller.utterance().unwrap();
    controller.handle_event(SynthesisEvent::Failed(id, "engine crashed".into()));

    assert_eq!(controller.state(), PlaybackState::Failed);
    assert!(controller.clip().is_some());
    assert_eq!(counters.held.load(Ordering::SeqCst), 0);
    let notices = controller.take_notices();
    assert!(notices.iter().any(|n| n.message.contains("engine crashed")));
}

#[test]
fn test_late_end_of_cancelled_run_is_ignored() {
    let (mut controller, counters, _) = controller(false, vec![vec![5, 0]]);

    controller.toggle(&request("first run")).unwrap();
    controller.pump();
    let first = controller.utterance().unwrap();
    controller.toggle(&request("first run")).unwrap();
    controller.pump();

    controller.toggle(&request("second run")).unwrap();
    controller.pump();
    assert!(controller.is_recording());
    assert_ne!(controller.utterance(), Some(first));

    // A watcher of the first run reporting late must not stop the second
    controller.handle_event(SynthesisEvent::Ended(first));
    assert!(controller.is_playing());
    assert!(controller.is_recording());
    assert_eq!(counters.held.load(Ordering::SeqCst), 1);

    controller.handle_event(SynthesisEvent::Failed(first, "late".into()));
    assert!(controller.is_recording());
    assert!(controller.take_notices().iter().all(|n| n.message != "Playback failed: late"));
}

#[test]
fn test_waveform_tap_leaves_clip_untouched() {
    let chunks = vec![vec![0x00, 0x40, 0x00, 0xc0], vec![0xff, 0x7f, 0x01, 0x80]];

    let (mut plain, _, _) = controller(true, chunks.clone());
    plain.toggle(&request("Hello")).unwrap();
    plain.pump();

    let tap = WaveformTap::new(16, 1000);
    let (tapped, _, _) = controller(true, chunks);
    let mut tapped = tapped.with_tap(tap.clone());
    tapped.toggle(&request("Hello")).unwrap();
    tapped.pump();

    let plain_clip = plain.clip().expect("clip without tap");
    let tapped_clip = tapped.clip().expect("clip with tap");
    assert_eq!(plain_clip.bytes(), tapped_clip.bytes());
    assert_eq!(plain_clip.mime_type(), tapped_clip.mime_type());
    assert_eq!(tapped_clip.len(), 8);

    let snapshot = tap.snapshot();
    assert!(!snapshot.is_empty());
    assert!(tap.peak() >= 0.5);
}

#[test]
fn test_create_native_synth() {
    // May fail in CI or when built without an engine
    match create_synth() {
        Ok(synth) => {
            println!("✓ Successfully created speech engine");
            drop(synth);
        }
        Err(e) => {
            println!("⚠ Speech engine unavailable (may be expected): {}", e);
        }
    }
}
