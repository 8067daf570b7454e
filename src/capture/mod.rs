//! Audio capture
//!
//! Input backends push their data as [`CaptureEvent`] messages over a channel;
//! a [`CaptureSession`] collects them on a background thread and turns them
//! into a [`CompressedClip`](crate::audio::CompressedClip) when stopped.

pub mod session;
pub mod tap;

#[cfg(feature = "cpal-capture")]
pub mod cpal;

pub use session::CaptureSession;
pub use tap::WaveformTap;

use crate::{Result, SpeechClipError};
use crossbeam_channel::Sender;

/// Messages from an input stream to the session collecting its audio
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A block of encoded audio, in arrival order
    ChunkAvailable(Vec<u8>),
    /// The recorder has flushed its last chunk; nothing more will follow
    RecordingStopped,
}

/// Something that can hand out an input stream (a microphone, a line-in)
pub trait InputDevice: Send {
    /// Acquire the input.
    ///
    /// Fails with [`SpeechClipError::DeviceUnavailable`] when there is no
    /// device, no permission, or no usable format.
    fn open(&mut self) -> Result<Box<dyn InputStream>>;
}

/// An acquired input, owned by exactly one capture session.
pub trait InputStream: Send {
    /// MIME type of the chunks this stream produces
    fn mime_type(&self) -> String;

    /// Start delivering `ChunkAvailable` events. Raw samples also go to
    /// `tap`, when given, for live display.
    fn record(&mut self, events: Sender<CaptureEvent>, tap: Option<WaveformTap>) -> Result<()>;

    /// Stop recording: flush any pending data, then send `RecordingStopped`.
    fn finish(&mut self) -> Result<()>;

    /// Release the underlying hardware. Must be safe to call more than once
    /// and after a failed `record`.
    fn release(&mut self);
}

/// Input device used when the crate is built without a capture backend
pub struct UnavailableInput;

impl InputDevice for UnavailableInput {
    fn open(&mut self) -> Result<Box<dyn InputStream>> {
        Err(SpeechClipError::DeviceUnavailable(
            "built without audio capture support (enable the `cpal-capture` feature)".into(),
        ))
    }
}

/// The platform's default audio input
pub fn default_input_device() -> Box<dyn InputDevice> {
    #[cfg(feature = "cpal-capture")]
    {
        Box::new(cpal::CpalInputDevice::default_device())
    }

    #[cfg(not(feature = "cpal-capture"))]
    {
        Box::new(UnavailableInput)
    }
}
