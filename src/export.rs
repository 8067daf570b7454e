//! Download preparation
//!
//! Turns the current recording into a named file, trimming it first when
//! edit mode has narrowed the range.

use crate::audio::{trim_or_original, CompressedClip, TrimOutcome, TrimRange};
use crate::{Result, SpeechClipError};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// A file ready to be written
#[derive(Debug)]
pub struct Download {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    /// A trim was applied
    pub trimmed: bool,
    /// Trimming was requested but failed; `bytes` is the original clip
    pub fallback: Option<SpeechClipError>,
}

impl Download {
    /// Write into `dir`, creating it if needed. Returns the file's path.
    pub fn write_to(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!("Wrote {} bytes to {:?}", self.bytes.len(), path);
        Ok(path)
    }
}

/// `<label>-<voice>-<timestamp>.<ext>`, with path separators removed
pub fn file_name(label: &str, voice_name: &str, timestamp_ms: i64, extension: &str) -> String {
    let name = format!("{}-{}-{}.{}", label, voice_name, timestamp_ms, extension);
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Build the download for `clip`.
///
/// Without edit mode, or with the full range, the clip is exported as
/// recorded. Otherwise it is trimmed to WAV; if the clip cannot be decoded
/// the original is exported and the error kept in `fallback`.
pub fn prepare_download(
    clip: Option<&CompressedClip>,
    range: TrimRange,
    edit_mode: bool,
    label: &str,
    voice_name: &str,
    timestamp_ms: i64,
) -> Result<Download> {
    let clip = match clip {
        Some(clip) if !clip.is_empty() => clip,
        _ => return Err(SpeechClipError::EmptyInput("no recording to download".into())),
    };

    let range = if edit_mode { range } else { TrimRange::FULL };
    debug!(
        "Preparing download: {} bytes of {}, range {}..{}",
        clip.len(),
        clip.mime_type(),
        range.start_pct(),
        range.end_pct()
    );

    let outcome = trim_or_original(clip, range);
    let file_name = file_name(label, voice_name, timestamp_ms, outcome.extension());
    let mime_type = outcome.mime_type().to_string();
    let trimmed = outcome.is_trimmed();

    let (bytes, fallback) = match outcome {
        TrimOutcome::Fallback { original, error } => (original.into_bytes(), Some(error)),
        other => (other.into_bytes(), None),
    };

    Ok(Download {
        file_name,
        mime_type,
        bytes,
        trimmed,
        fallback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pcm_clip() -> CompressedClip {
        // 100 mono frames at 100 Hz
        let bytes: Vec<u8> = (0..100i16).flat_map(|i| (i * 100).to_le_bytes()).collect();
        CompressedClip::new(bytes, CompressedClip::pcm_mime(100, 1))
    }

    #[test]
    fn test_file_name() {
        assert_eq!(
            file_name("voiceover", "Emma", 1700000000000, "wav"),
            "voiceover-Emma-1700000000000.wav"
        );
        assert_eq!(file_name("a/b", "c", 1, "pcm"), "a_b-c-1.pcm");
    }

    #[test]
    fn test_no_clip() {
        let result = prepare_download(None, TrimRange::FULL, false, "voiceover", "Emma", 1);
        assert!(matches!(result, Err(SpeechClipError::EmptyInput(_))));
    }

    #[test]
    fn test_range_ignored_outside_edit_mode() {
        let clip = pcm_clip();
        let range = TrimRange::new(25.0, 75.0).unwrap();
        let download = prepare_download(Some(&clip), range, false, "voiceover", "Emma", 1).unwrap();
        assert!(!download.trimmed);
        assert_eq!(download.bytes, clip.bytes());
        assert_eq!(download.file_name, "voiceover-Emma-1.pcm");
    }

    #[test]
    fn test_trim_in_edit_mode() {
        let clip = pcm_clip();
        let range = TrimRange::new(25.0, 75.0).unwrap();
        let download = prepare_download(Some(&clip), range, true, "voiceover", "Emma", 1).unwrap();
        assert!(download.trimmed);
        assert!(download.fallback.is_none());
        assert_eq!(download.mime_type, "audio/wav");
        assert_eq!(download.file_name, "voiceover-Emma-1.wav");
        assert_eq!(download.bytes.len(), 44 + 50 * 2);
    }

    #[test]
    fn test_fallback_keeps_original() {
        let clip = CompressedClip::new(vec![1, 2, 3, 4, 5], "audio/webm;codecs=opus");
        let range = TrimRange::new(10.0, 20.0).unwrap();
        let download = prepare_download(Some(&clip), range, true, "voiceover", "Emma", 1).unwrap();
        assert!(!download.trimmed);
        assert!(matches!(download.fallback, Some(SpeechClipError::Decode(_))));
        assert_eq!(download.bytes, vec![1, 2, 3, 4, 5]);
        assert_eq!(download.file_name, "voiceover-Emma-1.webm");
    }
}
