//! Captured audio clips

/// MIME type of the capture backend's native encoding: interleaved signed
/// 16-bit little-endian PCM. Rate and channel count travel as parameters.
pub const PCM_MIME: &str = "audio/pcm";

pub const WAV_MIME: &str = "audio/wav";

/// Container format of a clip, as far as the decoder cares
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClipFormat {
    /// Raw s16le PCM with its parameters
    Pcm { sample_rate: u32, channels: u16 },
    /// RIFF/WAVE
    Wav,
    /// Anything else, keyed by the MIME essence
    Other(String),
}

/// An opaque encoded audio buffer tagged with its MIME type.
///
/// One clip is produced per recording session. Its bytes are never touched
/// after capture; trimming always produces a new container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressedClip {
    bytes: Vec<u8>,
    mime_type: String,
}

impl CompressedClip {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    /// Empty clip in the given encoding
    pub fn empty(mime_type: impl Into<String>) -> Self {
        Self::new(Vec::new(), mime_type)
    }

    /// MIME string for raw PCM with the given parameters
    pub fn pcm_mime(sample_rate: u32, channels: u16) -> String {
        format!("{};rate={};channels={}", PCM_MIME, sample_rate, channels)
    }

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

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// MIME type without parameters, lowercased
    pub fn essence(&self) -> String {
        self.mime_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase()
    }

    /// Value of a `;key=value` MIME parameter
    pub fn param(&self, key: &str) -> Option<&str> {
        self.mime_type.split(';').skip(1).find_map(|part| {
            let (k, v) = part.split_once('=')?;
            if k.trim().eq_ignore_ascii_case(key) {
                Some(v.trim().trim_matches('"'))
            } else {
                None
            }
        })
    }

    /// Classify the clip's container from its MIME type
    pub fn format(&self) -> ClipFormat {
        let essence = self.essence();
        match essence.as_str() {
            PCM_MIME => {
                let sample_rate = self.param("rate").and_then(|v| v.parse().ok());
                let channels = self.param("channels").and_then(|v| v.parse().ok());
                match (sample_rate, channels) {
                    (Some(sample_rate), Some(channels)) => ClipFormat::Pcm {
                        sample_rate,
                        channels,
                    },
                    _ => ClipFormat::Other(essence),
                }
            }
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => ClipFormat::Wav,
            _ => ClipFormat::Other(essence),
        }
    }

    /// File extension for saving the clip as-is
    pub fn extension(&self) -> &'static str {
        match self.essence().as_str() {
            PCM_MIME => "pcm",
            "audio/wav" | "audio/x-wav" | "audio/wave" | "audio/vnd.wave" => "wav",
            "audio/webm" => "webm",
            "audio/ogg" => "ogg",
            "audio/mpeg" => "mp3",
            "audio/mp4" => "m4a",
            _ => "bin",
        }
    }
}
