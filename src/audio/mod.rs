//! Audio post-processing: decode, trim and WAV export

pub mod buffer;
pub mod clip;
pub mod decode;
pub mod range;
pub mod trim;
pub mod wav;

pub use buffer::AudioBuffer;
pub use clip::{ClipFormat, CompressedClip, PCM_MIME, WAV_MIME};
pub use decode::decode_clip;
pub use range::TrimRange;
pub use trim::{trim, trim_or_original, TrimOutcome};
pub use wav::{encode_wav, WavContainer};
