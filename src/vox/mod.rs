//! VOX recording pipeline: the hang-delay timer, the WAV writer, and the
//! stream processor that decides whether each frame goes to pre-roll or disk.

mod processor;
mod timer;
mod writer;
#[cfg(test)]
mod tests;

use crossbeam_channel::{unbounded, Receiver, Sender};

pub use processor::StreamProcessor;
pub use timer::{spawn_timer_thread, RecordingTimer, TimerTransition};
pub use writer::{recording_file_name, RecordingSummary, RecordingWriter};

/// Why an open recording is being closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    HangDelayElapsed,
    ForceStop,
    Shutdown,
}

/// Requests the stream processor applies to the file it owns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterCommand {
    Close { reason: CloseReason },
}

/// Channel from the timer to the stream processor.
pub fn writer_channel() -> (Sender<WriterCommand>, Receiver<WriterCommand>) {
    unbounded()
}
