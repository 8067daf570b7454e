//! Recording session state machine

use super::{CaptureEvent, InputStream, WaveformTap};
use crate::audio::{CompressedClip, PCM_MIME};
use crate::{Result, SpeechClipError};
use crossbeam_channel::Receiver;
use log::{debug, error, info, warn};
use std::thread::{self, JoinHandle};

/// A recording in progress
struct ActiveCapture {
    stream: Box<dyn InputStream>,
    collector: JoinHandle<Vec<u8>>,
    mime_type: String,
}

/// Records one input stream at a time into an in-memory clip.
///
/// The session is an ordinary value owned by the caller. Each one owns the
/// stream it records, so independent sessions do not interfere. The stream
/// is released on every exit path: `stop`, a failed `start`, or drop.
pub struct CaptureSession {
    active: Option<ActiveCapture>,
}

impl CaptureSession {
    pub fn new() -> Self {
        Self { active: None }
    }

    pub fn is_recording(&self) -> bool {
        self.active.is_some()
    }

    /// Begin recording from an already-acquired stream.
    ///
    /// Starting while a recording is active is rejected and the new stream
    /// is released.
    pub fn start(&mut self, mut stream: Box<dyn InputStream>, tap: Option<WaveformTap>) -> Result<()> {
        if self.active.is_some() {
            stream.release();
            return Err(SpeechClipError::Other(
                "a recording is already in progress".into(),
            ));
        }

        let (tx, rx) = crossbeam_channel::unbounded();
        if let Err(e) = stream.record(tx, tap) {
            error!("Failed to start recording: {}", e);
            stream.release();
            return Err(e);
        }

        let mime_type = stream.mime_type();
        let collector = thread::Builder::new()
            .name("capture-collector".into())
            .spawn(move || collect_chunks(rx));
        let collector = match collector {
            Ok(handle) => handle,
            Err(e) => {
                stream.release();
                return Err(SpeechClipError::Io(e));
            }
        };

        info!("Recording started ({})", mime_type);
        self.active = Some(ActiveCapture {
            stream,
            collector,
            mime_type,
        });
        Ok(())
    }

    /// Finish recording and return everything captured.
    ///
    /// Waits until the stream reports it has stopped, then releases it. A
    /// session that never started, or captured nothing, yields an empty clip.
    pub fn stop(&mut self) -> CompressedClip {
        let Some(ActiveCapture {
            mut stream,
            collector,
            mime_type,
        }) = self.active.take()
        else {
            debug!("Stop requested with no active recording");
            return CompressedClip::empty(PCM_MIME);
        };

        if let Err(e) = stream.finish() {
            warn!("Recorder did not stop cleanly: {}", e);
        }
        stream.release();
        // The stream owns the channel sender; dropping it guarantees the
        // collector sees a closed channel even if the stop message was lost.
        drop(stream);

        let bytes = collector.join().unwrap_or_else(|_| {
            error!("Capture collector panicked; returning empty clip");
            Vec::new()
        });

        info!("Recording stopped: {} bytes", bytes.len());
        CompressedClip::new(bytes, mime_type)
    }
}

impl Default for CaptureSession {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        if self.active.is_some() {
            warn!("Capture session dropped while recording; discarding audio");
            self.stop();
        }
    }
}

/// Accumulate chunks in arrival order until the recorder stops
fn collect_chunks(rx: Receiver<CaptureEvent>) -> Vec<u8> {
    let mut data = Vec::new();
    let mut chunks = 0usize;
    loop {
        match rx.recv() {
            Ok(CaptureEvent::ChunkAvailable(chunk)) => {
                if !chunk.is_empty() {
                    chunks += 1;
                    data.extend_from_slice(&chunk);
                }
            }
            Ok(CaptureEvent::RecordingStopped) => break,
            Err(_) => {
                debug!("Capture channel closed before stop message");
                break;
            }
        }
    }
    debug!("Collected {} chunks ({} bytes)", chunks, data.len());
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Sender;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Stream that plays back a fixed list of chunks
    struct ScriptedStream {
        chunks: Vec<Vec<u8>>,
        events: Option<Sender<CaptureEvent>>,
        releases: Arc<AtomicUsize>,
        fail_record: bool,
    }

    impl ScriptedStream {
        fn boxed(chunks: Vec<Vec<u8>>, releases: Arc<AtomicUsize>) -> Box<dyn InputStream> {
            Box::new(Self {
                chunks,
                events: None,
                releases,
                fail_record: false,
            })
        }
    }

    impl InputStream for ScriptedStream {
        fn mime_type(&self) -> String {
            CompressedClip::pcm_mime(8000, 1)
        }

        fn record(&mut self, events: Sender<CaptureEvent>, tap: Option<WaveformTap>) -> Result<()> {
            if self.fail_record {
                return Err(SpeechClipError::DeviceUnavailable("unplugged".into()));
            }
            for chunk in &self.chunks {
                let _ = events.send(CaptureEvent::ChunkAvailable(chunk.clone()));
                if let Some(tap) = &tap {
                    let samples: Vec<f32> = chunk.iter().map(|&b| b as f32 / 255.0).collect();
                    tap.feed(&samples, 1);
                }
            }
            self.events = Some(events);
            Ok(())
        }

        fn finish(&mut self) -> Result<()> {
            if let Some(events) = self.events.take() {
                let _ = events.send(CaptureEvent::ChunkAvailable(vec![0xff]));
                let _ = events.send(CaptureEvent::RecordingStopped);
            }
            Ok(())
        }

        fn release(&mut self) {
            self.events = None;
            self.releases.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_chunks_concatenate_in_order() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut session = CaptureSession::new();
        session
            .start(
                ScriptedStream::boxed(vec![vec![1, 2], vec![], vec![3]], releases.clone()),
                None,
            )
            .unwrap();
        assert!(session.is_recording());

        let clip = session.stop();
        assert_eq!(clip.bytes(), &[1, 2, 3, 0xff]);
        assert_eq!(clip.mime_type(), "audio/pcm;rate=8000;channels=1");
        assert!(!session.is_recording());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tap_does_not_change_clip() {
        let chunks = vec![vec![10, 20], vec![255, 0, 128]];
        let releases = Arc::new(AtomicUsize::new(0));

        let mut session = CaptureSession::new();
        session
            .start(ScriptedStream::boxed(chunks.clone(), releases.clone()), None)
            .unwrap();
        let without_tap = session.stop();

        let tap = WaveformTap::new(64, 1000);
        session
            .start(ScriptedStream::boxed(chunks, releases.clone()), Some(tap.clone()))
            .unwrap();
        let with_tap = session.stop();

        assert_eq!(with_tap, without_tap);
        assert_eq!(with_tap.bytes(), &[10, 20, 255, 0, 128, 0xff]);
        assert!(!tap.snapshot().is_empty());
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_stop_without_start_is_empty() {
        let mut session = CaptureSession::new();
        let clip = session.stop();
        assert!(clip.is_empty());
    }

    #[test]
    fn test_failed_record_releases_stream() {
        let releases = Arc::new(AtomicUsize::new(0));
        let stream = Box::new(ScriptedStream {
            chunks: vec![],
            events: None,
            releases: releases.clone(),
            fail_record: true,
        });
        let mut session = CaptureSession::new();
        let result = session.start(stream, None);
        assert!(matches!(result, Err(SpeechClipError::DeviceUnavailable(_))));
        assert!(!session.is_recording());
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_second_start_is_rejected() {
        let releases = Arc::new(AtomicUsize::new(0));
        let mut session = CaptureSession::new();
        session
            .start(ScriptedStream::boxed(vec![vec![1]], releases.clone()), None)
            .unwrap();
        let second = session.start(ScriptedStream::boxed(vec![vec![2]], releases.clone()), None);
        assert!(second.is_err());
        // The rejected stream is released straight away
        assert_eq!(releases.load(Ordering::SeqCst), 1);

        let clip = session.stop();
        assert_eq!(clip.bytes(), &[1, 0xff]);
        assert_eq!(releases.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_releases_stream() {
        let releases = Arc::new(AtomicUsize::new(0));
        {
            let mut session = CaptureSession::new();
            session
                .start(ScriptedStream::boxed(vec![vec![9]], releases.clone()), None)
                .unwrap();
        }
        assert_eq!(releases.load(Ordering::SeqCst), 1);
    }
}
