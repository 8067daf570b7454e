//! Decoded, uncompressed audio

use crate::{Result, SpeechClipError};

/// A fixed-rate block of planar `f32` audio.
///
/// Every channel holds the same number of frames. Samples are nominally in
/// [-1.0, 1.0]; out-of-range values are clamped only when encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioBuffer {
    sample_rate: u32,
    channels: Vec<Vec<f32>>,
}

impl AudioBuffer {
    /// Build a buffer from per-channel sample vectors
    pub fn new(sample_rate: u32, channels: Vec<Vec<f32>>) -> Result<Self> {
        if sample_rate == 0 {
            return Err(SpeechClipError::Decode("sample rate must be > 0".into()));
        }
        if channels.is_empty() {
            return Err(SpeechClipError::Decode("audio has no channels".into()));
        }
        let len = channels[0].len();
        if channels.iter().any(|c| c.len() != len) {
            return Err(SpeechClipError::Decode(
                "channels have different lengths".into(),
            ));
        }
        Ok(Self {
            sample_rate,
            channels,
        })
    }

    /// Silent buffer of `frames` frames
    pub fn silence(sample_rate: u32, channel_count: u16, frames: usize) -> Result<Self> {
        Self::new(
            sample_rate,
            vec![vec![0.0; frames]; channel_count as usize],
        )
    }

    /// Split interleaved samples into planar channels.
    ///
    /// A trailing partial frame is dropped.
    pub fn from_interleaved(sample_rate: u32, channel_count: u16, samples: &[f32]) -> Result<Self> {
        let n = channel_count as usize;
        if n == 0 {
            return Err(SpeechClipError::Decode("audio has no channels".into()));
        }
        let frames = samples.len() / n;
        let mut channels = vec![Vec::with_capacity(frames); n];
        for frame in samples.chunks_exact(n) {
            for (channel, &sample) in channels.iter_mut().zip(frame) {
                channel.push(sample);
            }
        }
        Self::new(sample_rate, channels)
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channel_count(&self) -> u16 {
        self.channels.len() as u16
    }

    /// Number of frames (samples per channel)
    pub fn len(&self) -> usize {
        self.channels[0].len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Duration in seconds
    pub fn duration(&self) -> f64 {
        self.len() as f64 / self.sample_rate as f64
    }

    /// Samples of one channel
    pub fn channel(&self, index: usize) -> &[f32] {
        &self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[f32]> {
        self.channels.iter().map(Vec::as_slice)
    }
}
