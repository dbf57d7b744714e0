use crate::audio::{Frame, BITS_PER_SAMPLE, CHANNELS};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use hound::{SampleFormat, WavSpec, WavWriter};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// File name for a recording that starts at `started`, e.g. `20240131-142501.wav`.
pub fn recording_file_name(started: DateTime<Local>) -> String {
    started.format("%Y%m%d-%H%M%S.wav").to_string()
}

fn wav_spec(sample_rate: u32) -> WavSpec {
    WavSpec {
        channels: CHANNELS,
        sample_rate,
        bits_per_sample: BITS_PER_SAMPLE,
        sample_format: SampleFormat::Int,
    }
}

/// What a finished recording contains.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingSummary {
    pub path: PathBuf,
    pub frames: u64,
    pub samples: u64,
    pub duration: Duration,
}

/// One open mono 16-bit PCM WAV file.
pub struct RecordingWriter {
    path: PathBuf,
    writer: WavWriter<BufWriter<File>>,
    sample_rate: u32,
    frames: u64,
    samples: u64,
}

impl RecordingWriter {
    /// Create (or overwrite) `path` and write the header for `sample_rate`.
    pub fn create(path: &Path, sample_rate: u32) -> Result<Self> {
        let writer = WavWriter::create(path, wav_spec(sample_rate))
            .with_context(|| format!("failed to create recording {}", path.display()))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            sample_rate,
            frames: 0,
            samples: 0,
        })
    }

    pub fn write_frame(&mut self, frame: &Frame) -> Result<()> {
        for &sample in frame.samples() {
            self.writer
                .write_sample(sample)
                .with_context(|| format!("failed to write to {}", self.path.display()))?;
        }
        self.frames += 1;
        self.samples += frame.len() as u64;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Flush and patch the header sizes. The file is complete once this returns.
    pub fn finalize(self) -> Result<RecordingSummary> {
        let Self {
            path,
            writer,
            sample_rate,
            frames,
            samples,
        } = self;
        writer
            .finalize()
            .with_context(|| format!("failed to finalize recording {}", path.display()))?;
        let duration = if sample_rate == 0 {
            Duration::ZERO
        } else {
            Duration::from_secs_f64(samples as f64 / f64::from(sample_rate))
        };
        Ok(RecordingSummary {
            path,
            frames,
            samples,
            duration,
        })
    }
}
