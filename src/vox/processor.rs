//! Stream processor: the single consumer of the sample queue.
//!
//! Each frame is measured, reported to the timer when it beats the threshold,
//! and then filed by the `recording` flag as it reads at that moment: appended
//! to the open WAV file (opening one and draining the pre-roll first if
//! needed) or pushed into the pre-roll ring. The WAV writer and the pre-roll
//! buffer are owned here and nowhere else; the timer reaches the file only
//! through [`WriterCommand`]s.

use super::writer::{recording_file_name, RecordingWriter};
use super::{CloseReason, RecordingTimer, WriterCommand};
use crate::audio::{compute_level, Frame, PreRollBuffer, SampleQueue};
use crate::control::Console;
use crate::log_debug;
use crate::session::Session;
use anyhow::{Context, Result};
use chrono::Local;
use crossbeam_channel::Receiver;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// How long one queue wait may block before the loop re-checks `running`.
const QUEUE_WAIT: Duration = Duration::from_millis(100);

type FileNamer = Box<dyn FnMut() -> String + Send>;

pub struct StreamProcessor {
    session: Arc<Session>,
    timer: Arc<RecordingTimer>,
    queue: SampleQueue,
    commands: Receiver<WriterCommand>,
    pre_roll: PreRollBuffer,
    writer: Option<RecordingWriter>,
    sample_rate: u32,
    output_dir: PathBuf,
    queue_wait: Duration,
    console: Console,
    file_namer: FileNamer,
}

impl StreamProcessor {
    pub fn new(
        session: Arc<Session>,
        timer: Arc<RecordingTimer>,
        queue: SampleQueue,
        commands: Receiver<WriterCommand>,
        sample_rate: u32,
        output_dir: PathBuf,
        console: Console,
    ) -> Self {
        let pre_roll = PreRollBuffer::new(session.pre_roll_capacity());
        Self {
            session,
            timer,
            queue,
            commands,
            pre_roll,
            writer: None,
            sample_rate,
            output_dir,
            queue_wait: QUEUE_WAIT,
            console,
            file_namer: Box::new(|| recording_file_name(Local::now())),
        }
    }

    pub fn with_queue_wait(mut self, wait: Duration) -> Self {
        self.queue_wait = wait;
        self
    }

    /// Replace the wall-clock file naming, for callers that need stable names.
    pub fn with_file_namer<F>(mut self, namer: F) -> Self
    where
        F: FnMut() -> String + Send + 'static,
    {
        self.file_namer = Box::new(namer);
        self
    }

    pub fn pre_roll(&self) -> &PreRollBuffer {
        &self.pre_roll
    }

    pub fn is_file_open(&self) -> bool {
        self.writer.is_some()
    }

    /// One loop iteration. Returns whether a frame was processed; an empty
    /// wait is an idle tick, not an error.
    pub fn step(&mut self) -> Result<bool> {
        self.apply_commands()?;
        match self.queue.pop(self.queue_wait) {
            Some(frame) => {
                self.process_frame(frame, Instant::now())?;
                Ok(true)
            }
            None => {
                self.apply_commands()?;
                Ok(false)
            }
        }
    }

    /// File one frame observed at `now`.
    pub fn process_frame(&mut self, frame: Frame, now: Instant) -> Result<()> {
        let recording = self.session.is_recording();
        let level = compute_level(frame.samples());
        self.session.set_current_level(level);
        if level > self.session.threshold() {
            self.timer.reset_trigger(now);
        }

        if !recording {
            self.pre_roll.push(frame);
            return Ok(());
        }
        if self.writer.is_none() {
            self.open_recording()?;
        }
        if let Some(writer) = self.writer.as_mut() {
            writer.write_frame(&frame)?;
        }
        Ok(())
    }

    fn open_recording(&mut self) -> Result<()> {
        let name = (self.file_namer)();
        let path = self.output_dir.join(&name);
        let mut writer = RecordingWriter::create(&path, self.sample_rate)?;
        self.console.line(&format!("opening file {name}"));
        self.session.set_recording_file(Some(&path));

        let buffered = self.pre_roll.len();
        while let Some(frame) = self.pre_roll.pop_oldest() {
            writer.write_frame(&frame)?;
        }
        log_debug(&format!(
            "opened {} with {buffered} pre-roll frames",
            path.display()
        ));
        tracing::info!(
            file = %path.display(),
            pre_roll_frames = buffered,
            sample_rate = self.sample_rate,
            "recording opened"
        );
        self.writer = Some(writer);
        Ok(())
    }

    /// Finalize the open file, if any. Closing twice is a no-op.
    pub fn close_recording(&mut self, reason: CloseReason) -> Result<()> {
        let Some(writer) = self.writer.take() else {
            return Ok(());
        };
        self.session.set_recording_file(None);
        let summary = writer.finalize()?;
        log_debug(&format!(
            "closed {} ({reason:?}): {} frames, {:.1}s",
            summary.path.display(),
            summary.frames,
            summary.duration.as_secs_f64()
        ));
        tracing::info!(
            file = %summary.path.display(),
            frames = summary.frames,
            samples = summary.samples,
            duration_ms = summary.duration.as_millis() as u64,
            reason = ?reason,
            "recording closed"
        );
        Ok(())
    }

    fn apply_commands(&mut self) -> Result<()> {
        while let Ok(command) = self.commands.try_recv() {
            match command {
                WriterCommand::Close { reason } => self.close_recording(reason)?,
            }
        }
        Ok(())
    }

    /// Process frames until the session stops, then close any open file.
    /// A failure stops the whole session.
    pub fn run(mut self) -> Result<()> {
        let mut outcome = self.run_loop();
        if let Err(err) = self.close_recording(CloseReason::Shutdown) {
            if outcome.is_ok() {
                outcome = Err(err);
            } else {
                log_debug(&format!("closing recording after failure: {err:#}"));
            }
        }
        if let Err(err) = &outcome {
            log_debug(&format!("stream processor failed: {err:#}"));
            tracing::error!(error = %format!("{err:#}"), "stream processor failed");
            self.session.shutdown();
        }
        outcome
    }

    fn run_loop(&mut self) -> Result<()> {
        while self.session.is_running() {
            self.step()?;
        }
        self.apply_commands()
    }

    pub fn spawn(self) -> Result<thread::JoinHandle<Result<()>>> {
        thread::Builder::new()
            .name("voxcorder-processor".to_string())
            .spawn(move || self.run())
            .context("failed to spawn stream processor thread")
    }
}
