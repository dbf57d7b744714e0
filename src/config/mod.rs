//! Command-line parsing and validation helpers.

mod defaults;
mod validation;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::time::Duration;

pub use defaults::{
    DEFAULT_CHUNK, DEFAULT_DEVICE_INDEX, DEFAULT_HANG_DELAY_SECS, DEFAULT_SAVERECS,
    DEFAULT_THRESHOLD, DEFAULT_TICK_MS, MAX_CHUNK, MAX_HANG_DELAY_SECS, MAX_SAVERECS,
    MAX_THRESHOLD, MAX_TICK_MS, MIN_CHUNK, MIN_THRESHOLD, MIN_TICK_MS,
};

/// CLI options for Voxcorder. Validated values are safe to hand to the pipeline.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "voxcorder",
    about = "Voxcorder: sound-activated (VOX) audio recorder",
    author,
    version
)]
pub struct AppConfig {
    /// 'record' to run the recorder or 'listdevs' to print capture devices
    #[arg(value_enum)]
    pub command: RunCommand,

    /// Chunk size: samples per captured frame
    #[arg(short = 'c', long, default_value_t = DEFAULT_CHUNK)]
    pub chunk: usize,

    /// Capture device number as printed by 'listdevs'
    #[arg(short = 'd', long = "devno", default_value_t = DEFAULT_DEVICE_INDEX)]
    pub devno: usize,

    /// Frames to buffer ahead of the threshold trigger
    #[arg(short = 's', long, default_value_t = DEFAULT_SAVERECS)]
    pub saverecs: usize,

    /// Minimum volume threshold (1-99)
    #[arg(short = 't', long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: u32,

    /// Seconds to keep recording after input drops below threshold
    #[arg(short = 'l', long, default_value_t = DEFAULT_HANG_DELAY_SECS)]
    pub hangdelay: u64,

    /// Directory that receives the WAV recordings
    #[arg(short = 'o', long = "output-dir", default_value = ".")]
    pub output_dir: PathBuf,

    /// Recording timer cadence (milliseconds)
    #[arg(long = "tick-ms", default_value_t = DEFAULT_TICK_MS, hide = true)]
    pub tick_ms: u64,

    /// Enable file logging (debug log + JSON trace)
    #[arg(long = "logs", env = "VOXCORDER_LOGS", default_value_t = false)]
    pub logs: bool,

    /// Disable all file logging (overrides --logs and log env vars)
    #[arg(long = "no-logs", env = "VOXCORDER_NO_LOGS", default_value_t = false)]
    pub no_logs: bool,
}

/// Top-level mode selected by the positional argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunCommand {
    Record,
    Listdevs,
}

impl AppConfig {
    pub fn logging_enabled(&self) -> bool {
        self.logs && !self.no_logs
    }

    pub fn hang_delay(&self) -> Duration {
        Duration::from_secs(self.hangdelay)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }
}
