//! Clip decoding
//!
//! Turns a [`CompressedClip`] back into planar float samples. The capture
//! backend's raw PCM is handled directly; WAV goes through `hound`.

use super::wav::i16_to_sample;
use super::{AudioBuffer, ClipFormat, CompressedClip};
use crate::{Result, SpeechClipError};
use log::debug;
use std::io::Cursor;

/// Decode a clip into raw audio.
///
/// Fails with [`SpeechClipError::Decode`] for unsupported MIME types and for
/// bytes that do not parse as the declared container.
pub fn decode_clip(clip: &CompressedClip) -> Result<AudioBuffer> {
    let buffer = match clip.format() {
        ClipFormat::Pcm {
            sample_rate,
            channels,
        } => decode_pcm_s16le(clip.bytes(), sample_rate, channels)?,
        ClipFormat::Wav => decode_wav(clip.bytes())?,
        ClipFormat::Other(essence) => {
            return Err(SpeechClipError::Decode(format!(
                "unsupported audio type '{}'",
                essence
            )))
        }
    };

    debug!(
        "Decoded {} byte clip: {} frames, {} ch, {} Hz",
        clip.len(),
        buffer.len(),
        buffer.channel_count(),
        buffer.sample_rate()
    );
    Ok(buffer)
}

/// Raw interleaved signed 16-bit little-endian PCM
fn decode_pcm_s16le(bytes: &[u8], sample_rate: u32, channels: u16) -> Result<AudioBuffer> {
    if channels == 0 {
        return Err(SpeechClipError::Decode("PCM clip declares 0 channels".into()));
    }
    let frame_bytes = channels as usize * 2;
    if bytes.len() % frame_bytes != 0 {
        return Err(SpeechClipError::Decode(format!(
            "PCM clip length {} is not a whole number of {}-byte frames",
            bytes.len(),
            frame_bytes
        )));
    }
    let samples: Vec<f32> = bytes
        .chunks_exact(2)
        .map(|b| i16_to_sample(i16::from_le_bytes([b[0], b[1]])))
        .collect();
    AudioBuffer::from_interleaved(sample_rate, channels, &samples)
}

fn decode_wav(bytes: &[u8]) -> Result<AudioBuffer> {
    let mut reader = hound::WavReader::new(Cursor::new(bytes))?;
    let spec = reader.spec();

    let samples: Vec<f32> = match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Float, 32) => reader
            .samples::<f32>()
            .collect::<std::result::Result<_, _>>()?,
        (hound::SampleFormat::Int, 16) => reader
            .samples::<i16>()
            .map(|s| s.map(i16_to_sample))
            .collect::<std::result::Result<_, _>>()?,
        (hound::SampleFormat::Int, bits) if (1..=32).contains(&bits) => {
            let denom = (1u64 << (bits - 1)) as f32;
            reader
                .samples::<i32>()
                .map(|s| s.map(|v| v as f32 / denom))
                .collect::<std::result::Result<_, _>>()?
        }
        (format, bits) => {
            return Err(SpeechClipError::Decode(format!(
                "unsupported WAV sample format {:?}/{} bits",
                format, bits
            )))
        }
    };

    AudioBuffer::from_interleaved(spec.sample_rate, spec.channels, &samples)
}
