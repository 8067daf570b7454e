//! Live waveform tap for on-screen feedback
//!
//! The input backend feeds every block it records into the tap; the UI reads
//! snapshots. The tap keeps its own copy of the samples and never feeds
//! anything back into the recording.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

struct TapState {
    window: VecDeque<f32>,
    capacity: usize,
    snapshot: Vec<f32>,
    interval: Duration,
    last_snapshot: Option<Instant>,
}

/// Shared, clonable view of the most recent input samples (mixed to mono)
#[derive(Clone)]
pub struct WaveformTap {
    state: Arc<Mutex<TapState>>,
}

impl WaveformTap {
    /// Keep the last `window` samples and refresh the snapshot at most
    /// `rate_hz` times per second.
    pub fn new(window: usize, rate_hz: u32) -> Self {
        let capacity = window.max(1);
        let interval = Duration::from_secs_f64(1.0 / rate_hz.max(1) as f64);
        Self {
            state: Arc::new(Mutex::new(TapState {
                window: VecDeque::with_capacity(capacity),
                capacity,
                snapshot: Vec::new(),
                interval,
                last_snapshot: None,
            })),
        }
    }

    /// Push interleaved samples from the recorder.
    ///
    /// Runs on the audio thread, so a contended lock just drops the block.
    pub fn feed(&self, interleaved: &[f32], channels: u16) {
        let Ok(mut state) = self.state.try_lock() else {
            return;
        };
        let channels = channels.max(1) as usize;
        for frame in interleaved.chunks_exact(channels) {
            let mono = frame.iter().sum::<f32>() / channels as f32;
            if state.window.len() == state.capacity {
                state.window.pop_front();
            }
            state.window.push_back(mono);
        }

        let now = Instant::now();
        let due = state
            .last_snapshot
            .map_or(true, |last| now.duration_since(last) >= state.interval);
        if due {
            let snapshot: Vec<f32> = state.window.iter().copied().collect();
            state.snapshot = snapshot;
            state.last_snapshot = Some(now);
        }
    }

    /// The latest sampled waveform
    pub fn snapshot(&self) -> Vec<f32> {
        self.state
            .lock()
            .map(|s| s.snapshot.clone())
            .unwrap_or_default()
    }

    /// Snapshot as unsigned bytes centred on 128, for drawing
    pub fn time_domain_bytes(&self) -> Vec<u8> {
        self.snapshot()
            .into_iter()
            .map(|s| (128.0 + s.clamp(-1.0, 1.0) * 128.0).clamp(0.0, 255.0) as u8)
            .collect()
    }

    /// Largest absolute sample in the snapshot
    pub fn peak(&self) -> f32 {
        self.snapshot()
            .into_iter()
            .fold(0.0f32, |peak, s| peak.max(s.abs()))
    }

    /// Forget everything; used between recordings
    pub fn clear(&self) {
        if let Ok(mut state) = self.state.lock() {
            state.window.clear();
            state.snapshot.clear();
            state.last_snapshot = None;
        }
    }
}
