//! Shared recorder session state.
//!
//! Every field has one designated writer stage; everyone else only reads. The
//! scalar fields are atomics so readers on other threads never see torn values.
//!
//! | field               | writer                        |
//! |---------------------|-------------------------------|
//! | `threshold`         | control surface               |
//! | `current_level`     | stream processor              |
//! | `recording`         | recording timer (and the control surface override, via the timer) |
//! | `running`           | control surface (quit) / fatal pipeline error |
//! | `show_level_meter`  | control surface               |
//! | `recording_file`    | stream processor              |

use crate::config::{AppConfig, MAX_THRESHOLD, MIN_THRESHOLD};
use crate::lock_or_recover;
use anyhow::{bail, Result};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug)]
pub struct Session {
    threshold: AtomicU32,
    current_level: AtomicU32,
    recording: AtomicBool,
    running: AtomicBool,
    show_level_meter: AtomicBool,
    hang_delay: Duration,
    pre_roll_capacity: usize,
    recording_file: Mutex<Option<PathBuf>>,
}

impl Session {
    /// Build a running session. `threshold` is clamped into the valid range.
    pub fn new(threshold: u32, hang_delay: Duration, pre_roll_capacity: usize) -> Self {
        Self {
            threshold: AtomicU32::new(threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD)),
            current_level: AtomicU32::new(0),
            recording: AtomicBool::new(false),
            running: AtomicBool::new(true),
            show_level_meter: AtomicBool::new(false),
            hang_delay,
            pre_roll_capacity,
            recording_file: Mutex::new(None),
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(config.threshold, config.hang_delay(), config.saverecs)
    }

    pub fn threshold(&self) -> u32 {
        self.threshold.load(Ordering::Relaxed)
    }

    /// Replace the trigger level. Out-of-range values are rejected and the
    /// previous threshold stays in effect.
    pub fn set_threshold(&self, value: u32) -> Result<()> {
        if !(MIN_THRESHOLD..=MAX_THRESHOLD).contains(&value) {
            bail!("threshold must be between {MIN_THRESHOLD} and {MAX_THRESHOLD}, got {value}");
        }
        self.threshold.store(value, Ordering::Relaxed);
        Ok(())
    }

    /// Store a threshold chosen by the recorder itself (force start/stop),
    /// pinned into the valid range.
    pub(crate) fn set_threshold_clamped(&self, value: u32) {
        self.threshold.store(
            value.clamp(MIN_THRESHOLD, MAX_THRESHOLD),
            Ordering::Relaxed,
        );
    }

    pub fn current_level(&self) -> u32 {
        self.current_level.load(Ordering::Relaxed)
    }

    pub(crate) fn set_current_level(&self, level: u32) {
        self.current_level.store(level, Ordering::Relaxed);
    }

    pub fn is_recording(&self) -> bool {
        self.recording.load(Ordering::SeqCst)
    }

    /// Returns the previous value so callers can detect transitions.
    pub(crate) fn swap_recording(&self, recording: bool) -> bool {
        self.recording.swap(recording, Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Ask every stage loop to exit at its next iteration boundary.
    pub fn shutdown(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn show_level_meter(&self) -> bool {
        self.show_level_meter.load(Ordering::Relaxed)
    }

    pub fn set_show_level_meter(&self, show: bool) {
        self.show_level_meter.store(show, Ordering::Relaxed);
    }

    /// Flip the meter flag and return the new value.
    pub fn toggle_level_meter(&self) -> bool {
        !self.show_level_meter.fetch_xor(true, Ordering::Relaxed)
    }

    pub fn hang_delay(&self) -> Duration {
        self.hang_delay
    }

    pub fn pre_roll_capacity(&self) -> usize {
        self.pre_roll_capacity
    }

    pub fn recording_file(&self) -> Option<PathBuf> {
        lock_or_recover(&self.recording_file, "session.recording_file").clone()
    }

    pub(crate) fn set_recording_file(&self, path: Option<&Path>) {
        *lock_or_recover(&self.recording_file, "session.recording_file") =
            path.map(Path::to_path_buf);
    }
}
