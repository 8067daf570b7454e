//! Canonical 16-bit PCM WAV encoding
//!
//! The header is always the 44-byte PCM layout, whatever the channel count:
//!
//! ```text
//! "RIFF" <36 + data> "WAVE"
//! "fmt " 16 <format=1> <channels> <rate> <byte rate> <block align> <bits=16>
//! "data" <frames * channels * 2> <interleaved samples...>
//! ```

use super::AudioBuffer;
use crate::{Result, SpeechClipError};
use log::debug;

pub const WAV_HEADER_LEN: usize = 44;
const BITS_PER_SAMPLE: u16 = 16;
const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const FORMAT_PCM: u16 = 1;

/// An encoded WAV file, ready to be written out
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WavContainer {
    bytes: Vec<u8>,
}

impl WavContainer {
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Size of the `data` sub-chunk payload
    pub fn data_len(&self) -> usize {
        self.bytes.len().saturating_sub(WAV_HEADER_LEN)
    }
}

/// Convert one float sample to signed 16-bit.
///
/// Clamped to [-1, 1]; negative values scale by 32768 and positive ones by
/// 32767 so both ends of the range are reachable.
pub fn sample_to_i16(sample: f32) -> i16 {
    if sample.is_nan() {
        return 0;
    }
    let s = sample.clamp(-1.0, 1.0) as f64;
    let scaled = if s < 0.0 { s * 32768.0 } else { s * 32767.0 };
    scaled.round() as i16
}

/// Inverse of [`sample_to_i16`]
pub fn i16_to_sample(value: i16) -> f32 {
    if value < 0 {
        value as f32 / 32768.0
    } else {
        value as f32 / 32767.0
    }
}

/// Encode a buffer as canonical 16-bit PCM WAV
pub fn encode_wav(buffer: &AudioBuffer) -> Result<WavContainer> {
    let channels = buffer.channel_count();
    let sample_rate = buffer.sample_rate();
    let frames = buffer.len();

    let data_len = (frames as u64) * (channels as u64) * (BYTES_PER_SAMPLE as u64);
    let riff_len = data_len + (WAV_HEADER_LEN as u64 - 8);
    if riff_len > u32::MAX as u64 {
        return Err(SpeechClipError::Encode(format!(
            "{} frames x {} channels does not fit in a WAV file",
            frames, channels
        )));
    }
    let block_align = channels
        .checked_mul(BYTES_PER_SAMPLE)
        .ok_or_else(|| SpeechClipError::Encode(format!("too many channels: {}", channels)))?;
    let byte_rate = sample_rate
        .checked_mul(block_align as u32)
        .ok_or_else(|| SpeechClipError::Encode(format!("sample rate too high: {}", sample_rate)))?;

    let mut bytes = Vec::with_capacity(WAV_HEADER_LEN + data_len as usize);

    bytes.extend_from_slice(b"RIFF");
    bytes.extend_from_slice(&(riff_len as u32).to_le_bytes());
    bytes.extend_from_slice(b"WAVE");

    bytes.extend_from_slice(b"fmt ");
    bytes.extend_from_slice(&16u32.to_le_bytes());
    bytes.extend_from_slice(&FORMAT_PCM.to_le_bytes());
    bytes.extend_from_slice(&channels.to_le_bytes());
    bytes.extend_from_slice(&sample_rate.to_le_bytes());
    bytes.extend_from_slice(&byte_rate.to_le_bytes());
    bytes.extend_from_slice(&block_align.to_le_bytes());
    bytes.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    bytes.extend_from_slice(b"data");
    bytes.extend_from_slice(&(data_len as u32).to_le_bytes());

    let planes: Vec<&[f32]> = buffer.channels().collect();
    for frame in 0..frames {
        for plane in &planes {
            bytes.extend_from_slice(&sample_to_i16(plane[frame]).to_le_bytes());
        }
    }

    debug!(
        "Encoded WAV: {} frames, {} ch, {} Hz, {} bytes",
        frames,
        channels,
        sample_rate,
        bytes.len()
    );

    Ok(WavContainer { bytes })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u16_at(bytes: &[u8], at: usize) -> u16 {
        u16::from_le_bytes([bytes[at], bytes[at + 1]])
    }

    fn u32_at(bytes: &[u8], at: usize) -> u32 {
        u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
    }

    #[test]
    fn test_sample_scaling() {
        assert_eq!(sample_to_i16(0.0), 0);
        assert_eq!(sample_to_i16(1.0), 32767);
        assert_eq!(sample_to_i16(-1.0), -32768);
        assert_eq!(sample_to_i16(2.5), 32767);
        assert_eq!(sample_to_i16(-7.0), -32768);
        assert_eq!(sample_to_i16(0.5), 16384);
        assert_eq!(sample_to_i16(-0.5), -16384);
        assert_eq!(sample_to_i16(f32::NAN), 0);
    }

    #[test]
    fn test_header_layout() {
        let buffer = AudioBuffer::silence(22050, 3, 10).unwrap();
        let wav = encode_wav(&buffer).unwrap();
        let b = wav.bytes();

        assert_eq!(&b[0..4], b"RIFF");
        assert_eq!(u32_at(b, 4), 36 + 60);
        assert_eq!(&b[8..12], b"WAVE");
        assert_eq!(&b[12..16], b"fmt ");
        assert_eq!(u32_at(b, 16), 16);
        assert_eq!(u16_at(b, 20), 1);
        assert_eq!(u16_at(b, 22), 3);
        assert_eq!(u32_at(b, 24), 22050);
        assert_eq!(u32_at(b, 28), 22050 * 3 * 2);
        assert_eq!(u16_at(b, 32), 6);
        assert_eq!(u16_at(b, 34), 16);
        assert_eq!(&b[36..40], b"data");
        assert_eq!(u32_at(b, 40), 60);
        assert_eq!(b.len(), 44 + 60);
        assert_eq!(wav.data_len(), 60);
    }

    #[test]
    fn test_frames_are_interleaved() {
        let buffer = AudioBuffer::new(8000, vec![vec![1.0, 0.0], vec![-1.0, 0.5]]).unwrap();
        let wav = encode_wav(&buffer).unwrap();
        let data = &wav.bytes()[WAV_HEADER_LEN..];
        let samples: Vec<i16> = data
            .chunks_exact(2)
            .map(|c| i16::from_le_bytes([c[0], c[1]]))
            .collect();
        assert_eq!(samples, vec![32767, -32768, 0, 16384]);
    }

    #[test]
    fn test_empty_buffer_is_header_only() {
        let buffer = AudioBuffer::silence(44100, 1, 0).unwrap();
        let wav = encode_wav(&buffer).unwrap();
        assert_eq!(wav.len(), WAV_HEADER_LEN);
        assert_eq!(wav.data_len(), 0);
    }

    #[test]
    fn test_i16_inverse() {
        for value in [i16::MIN, -12345, -1, 0, 1, 12345, i16::MAX] {
            assert_eq!(sample_to_i16(i16_to_sample(value)), value);
        }
    }
}
