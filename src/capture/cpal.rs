//! Microphone capture through cpal
//!
//! Records the device's native sample format and emits interleaved signed
//! 16-bit little-endian PCM chunks, one per driver callback.

use super::{CaptureEvent, InputDevice, InputStream, WaveformTap};
use crate::audio::wav::{i16_to_sample, sample_to_i16};
use crate::audio::CompressedClip;
use crate::{Result, SpeechClipError};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use crossbeam_channel::Sender;
use log::{debug, error, info};

/// Input device selected by name, or the host default
pub struct CpalInputDevice {
    device_name: Option<String>,
}

impl CpalInputDevice {
    pub fn default_device() -> Self {
        Self { device_name: None }
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self {
            device_name: Some(name.into()),
        }
    }

    /// Names of the host's input devices
    pub fn list() -> Vec<String> {
        cpal::default_host()
            .input_devices()
            .map(|devices| devices.filter_map(|d| d.name().ok()).collect())
            .unwrap_or_default()
    }
}

impl InputDevice for CpalInputDevice {
    fn open(&mut self) -> Result<Box<dyn InputStream>> {
        let host = cpal::default_host();

        let device = match &self.device_name {
            None => host.default_input_device(),
            Some(wanted) => host.input_devices().ok().and_then(|mut devices| {
                devices.find(|d| d.name().ok().as_deref() == Some(wanted.as_str()))
            }),
        }
        .ok_or_else(|| SpeechClipError::DeviceUnavailable("no input device".into()))?;

        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let config = device.default_input_config().map_err(|e| {
            SpeechClipError::DeviceUnavailable(format!("{}: no input config: {}", name, e))
        })?;

        info!(
            "Opened input '{}': {} Hz, {} ch, {:?}",
            name,
            config.sample_rate().0,
            config.channels(),
            config.sample_format()
        );

        Ok(Box::new(CpalInputStream {
            device,
            config,
            stream: None,
            events: None,
        }))
    }
}

struct CpalInputStream {
    device: cpal::Device,
    config: cpal::SupportedStreamConfig,
    stream: Option<cpal::Stream>,
    events: Option<Sender<CaptureEvent>>,
}

// cpal streams are not Send on every platform. The handle is created, paused
// and dropped only through the owning CaptureSession.
unsafe impl Send for CpalInputStream {}

fn log_stream_error(err: cpal::StreamError) {
    error!("cpal input error: {}", err);
}

fn send_samples(events: &Sender<CaptureEvent>, tap: Option<&WaveformTap>, data: &[f32], channels: u16) {
    let bytes = data
        .iter()
        .flat_map(|&s| sample_to_i16(s).to_le_bytes())
        .collect();
    let _ = events.send(CaptureEvent::ChunkAvailable(bytes));
    if let Some(tap) = tap {
        tap.feed(data, channels);
    }
}

impl InputStream for CpalInputStream {
    fn mime_type(&self) -> String {
        CompressedClip::pcm_mime(self.config.sample_rate().0, self.config.channels())
    }

    fn record(&mut self, events: Sender<CaptureEvent>, tap: Option<WaveformTap>) -> Result<()> {
        let channels = self.config.channels();
        let stream_config: cpal::StreamConfig = self.config.clone().into();

        let stream = match self.config.sample_format() {
            cpal::SampleFormat::F32 => {
                let tx = events.clone();
                self.device.build_input_stream(
                    &stream_config,
                    move |data: &[f32], _: &cpal::InputCallbackInfo| {
                        send_samples(&tx, tap.as_ref(), data, channels);
                    },
                    log_stream_error,
                    None,
                )
            }
            cpal::SampleFormat::I16 => {
                let tx = events.clone();
                self.device.build_input_stream(
                    &stream_config,
                    move |data: &[i16], _: &cpal::InputCallbackInfo| {
                        let bytes = data.iter().flat_map(|s| s.to_le_bytes()).collect();
                        let _ = tx.send(CaptureEvent::ChunkAvailable(bytes));
                        if let Some(tap) = &tap {
                            let samples: Vec<f32> = data.iter().map(|&s| i16_to_sample(s)).collect();
                            tap.feed(&samples, channels);
                        }
                    },
                    log_stream_error,
                    None,
                )
            }
            other => {
                return Err(SpeechClipError::DeviceUnavailable(format!(
                    "unsupported input sample format {:?}",
                    other
                )))
            }
        }
        .map_err(|e| SpeechClipError::DeviceUnavailable(format!("failed to open input stream: {}", e)))?;

        stream
            .play()
            .map_err(|e| SpeechClipError::DeviceUnavailable(format!("failed to start input: {}", e)))?;

        self.stream = Some(stream);
        self.events = Some(events);
        debug!("cpal input stream running");
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        // Dropping the stream joins the driver callback, so every chunk has
        // been sent before the stop message.
        if let Some(stream) = self.stream.take() {
            if let Err(e) = stream.pause() {
                debug!("pause before drop failed: {}", e);
            }
            drop(stream);
        }
        if let Some(events) = self.events.take() {
            let _ = events.send(CaptureEvent::RecordingStopped);
        }
        Ok(())
    }

    fn release(&mut self) {
        self.stream = None;
        self.events = None;
        debug!("cpal input released");
    }
}
