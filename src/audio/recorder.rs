//! Capture device access via CPAL.
//!
//! Handles device enumeration by index, reads the device's native format and
//! wires the input callback to a [`FrameDispatcher`]. The stream handle must
//! stay on the thread that created it.

use super::dispatch::{f32_to_i16, u16_to_i16, FrameDispatcher};
use crate::log_debug;
use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{SampleFormat, StreamConfig};

/// A capture device as listed by `listdevs`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputDevice {
    pub index: usize,
    pub name: String,
}

/// Input device opened at its default sample rate.
pub struct Recorder {
    device: cpal::Device,
    index: usize,
    config: StreamConfig,
    format: SampleFormat,
}

impl Recorder {
    /// Enumerate capture devices in host order; the position is the device number.
    pub fn list_devices() -> Result<Vec<InputDevice>> {
        let _quiet = quiet_backend_stderr();
        let host = cpal::default_host();
        let devices = host
            .input_devices()
            .context("no input devices available")?;
        Ok(devices
            .enumerate()
            .map(|(index, device)| InputDevice {
                index,
                name: device
                    .name()
                    .unwrap_or_else(|_| "Unknown Device".to_string()),
            })
            .collect())
    }

    /// Open device number `index` using its default input configuration.
    pub fn open(index: usize) -> Result<Self> {
        let _quiet = quiet_backend_stderr();
        let host = cpal::default_host();
        let device = host
            .input_devices()
            .context("no input devices available")?
            .nth(index)
            .ok_or_else(|| {
                anyhow!("input device #{index} not found; run 'voxcorder listdevs' to see devices")
            })?;
        let default_config = device
            .default_input_config()
            .with_context(|| format!("input device #{index} has no usable input config"))?;
        let format = default_config.sample_format();
        let config: StreamConfig = default_config.into();
        log_debug(&format!(
            "Recorder config: device=#{index} format={format:?} sample_rate={}Hz channels={}",
            config.sample_rate.0, config.channels
        ));
        Ok(Self {
            device,
            index,
            config,
            format,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn device_name(&self) -> String {
        self.device
            .name()
            .unwrap_or_else(|_| "Unknown Device".to_string())
    }

    /// Device-reported rate; fixed for the session and written into every file.
    pub fn sample_rate(&self) -> u32 {
        self.config.sample_rate.0
    }

    pub fn channels(&self) -> usize {
        usize::from(self.config.channels.max(1))
    }

    /// Build and start the input stream, feeding every callback into `dispatcher`.
    pub fn start(&self, mut dispatcher: FrameDispatcher) -> Result<CaptureStream> {
        let channels = self.channels();
        let err_fn = |err: cpal::StreamError| log_debug(&format!("audio_stream_error: {err}"));
        let stream = match self.format {
            SampleFormat::I16 => self.device.build_input_stream(
                &self.config,
                move |data: &[i16], _| {
                    dispatcher.push(data, channels, |sample| sample);
                },
                err_fn,
                None,
            ),
            SampleFormat::F32 => self.device.build_input_stream(
                &self.config,
                move |data: &[f32], _| {
                    dispatcher.push(data, channels, f32_to_i16);
                },
                err_fn,
                None,
            ),
            SampleFormat::U16 => self.device.build_input_stream(
                &self.config,
                move |data: &[u16], _| {
                    dispatcher.push(data, channels, u16_to_i16);
                },
                err_fn,
                None,
            ),
            other => return Err(anyhow!("unsupported sample format: {other:?}")),
        }
        .with_context(|| format!("failed to build input stream on device #{}", self.index))?;

        stream
            .play()
            .with_context(|| format!("failed to start capture on device #{}", self.index))?;
        Ok(CaptureStream { stream })
    }
}

/// Running capture stream; dropping it stops the device callback.
pub struct CaptureStream {
    stream: cpal::Stream,
}

impl CaptureStream {
    pub fn stop(self) {
        if let Err(err) = self.stream.pause() {
            log_debug(&format!("failed to pause audio stream: {err}"));
        }
    }
}

/// ALSA prints configuration noise to stderr while the host probes devices.
fn quiet_backend_stderr() -> Option<gag::Gag> {
    gag::Gag::stderr().ok()
}
