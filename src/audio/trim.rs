//! Trim a clip to a percentage window and re-encode it as WAV

use super::decode::decode_clip;
use super::clip::WAV_MIME;
use super::wav::{encode_wav, WavContainer};
use super::{AudioBuffer, CompressedClip, TrimRange};
use crate::{Result, SpeechClipError};
use log::{debug, info, warn};

/// Cut `range` out of `buffer`, channel by channel.
///
/// Sample positions are floored from the time window. The slice is clamped
/// to the buffer so it never reads past the last frame.
pub fn slice(buffer: &AudioBuffer, range: TrimRange) -> Result<AudioBuffer> {
    let total = buffer.len();
    let duration = buffer.duration();

    // floor(time * rate), with time * rate taken straight from the frame
    // count so a full range never loses the last frame to rounding
    let start_sample = ((range.start_pct() / 100.0 * total as f64).floor() as usize).min(total);
    let slice_len =
        ((range.fraction() * total as f64).floor() as usize).min(total - start_sample);

    debug!(
        "Slicing {:.3}..{:.3}s -> samples {}..{} of {}",
        range.start_pct() / 100.0 * duration,
        range.end_pct() / 100.0 * duration,
        start_sample,
        start_sample + slice_len,
        total
    );

    let channels = buffer
        .channels()
        .map(|c| c[start_sample..start_sample + slice_len].to_vec())
        .collect();
    AudioBuffer::new(buffer.sample_rate(), channels)
}

/// Identity render pass.
///
/// Mixes the buffer onto a fresh destination of the same shape, which is a
/// straight copy for a single source at unity gain.
pub fn render(buffer: &AudioBuffer) -> Result<AudioBuffer> {
    let mut destination =
        vec![vec![0.0f32; buffer.len()]; buffer.channel_count() as usize];
    for (out, source) in destination.iter_mut().zip(buffer.channels()) {
        for (o, &s) in out.iter_mut().zip(source) {
            *o += s;
        }
    }
    AudioBuffer::new(buffer.sample_rate(), destination)
}

/// Decode, slice, render and encode a clip
pub fn trim(clip: &CompressedClip, range: TrimRange) -> Result<WavContainer> {
    let decoded = decode_clip(clip)?;
    let sliced = slice(&decoded, range)?;
    let rendered = render(&sliced)?;
    encode_wav(&rendered)
}

/// Result of preparing a clip for export
#[derive(Debug)]
pub enum TrimOutcome {
    /// The range covered the whole clip; nothing was done
    Untouched(CompressedClip),
    /// The clip was trimmed into a new WAV file
    Trimmed(WavContainer),
    /// Trimming failed; the original clip is returned with the reason
    Fallback {
        original: CompressedClip,
        error: SpeechClipError,
    },
}

impl TrimOutcome {
    pub fn bytes(&self) -> &[u8] {
        match self {
            TrimOutcome::Untouched(clip) => clip.bytes(),
            TrimOutcome::Trimmed(wav) => wav.bytes(),
            TrimOutcome::Fallback { original, .. } => original.bytes(),
        }
    }

    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            TrimOutcome::Untouched(clip) => clip.into_bytes(),
            TrimOutcome::Trimmed(wav) => wav.into_bytes(),
            TrimOutcome::Fallback { original, .. } => original.into_bytes(),
        }
    }

    pub fn mime_type(&self) -> &str {
        match self {
            TrimOutcome::Untouched(clip) => clip.mime_type(),
            TrimOutcome::Trimmed(_) => WAV_MIME,
            TrimOutcome::Fallback { original, .. } => original.mime_type(),
        }
    }

    /// File extension matching the bytes
    pub fn extension(&self) -> &'static str {
        match self {
            TrimOutcome::Untouched(clip) => clip.extension(),
            TrimOutcome::Trimmed(_) => "wav",
            TrimOutcome::Fallback { original, .. } => original.extension(),
        }
    }

    pub fn is_trimmed(&self) -> bool {
        matches!(self, TrimOutcome::Trimmed(_))
    }
}

/// Trim when there is something to trim, otherwise hand back the original.
///
/// A full range skips decoding entirely. Decode failures are not fatal: the
/// untouched original comes back with the error attached so the caller can
/// tell the user.
pub fn trim_or_original(clip: &CompressedClip, range: TrimRange) -> TrimOutcome {
    if range.is_full() {
        return TrimOutcome::Untouched(clip.clone());
    }

    match trim(clip, range) {
        Ok(wav) => {
            info!(
                "Trimmed clip to {}%..{}% ({} bytes)",
                range.start_pct(),
                range.end_pct(),
                wav.len()
            );
            TrimOutcome::Trimmed(wav)
        }
        Err(error) => {
            warn!("Trim failed, keeping original clip: {}", error);
            TrimOutcome::Fallback {
                original: clip.clone(),
                error,
            }
        }
    }
}
