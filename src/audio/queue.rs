//! Unbounded FIFO handoff from the capture callback to the stream processor.
//!
//! `push` never blocks so the audio thread always meets its deadline. If the
//! consumer falls behind the queue grows without bound.

use super::Frame;
use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Create a connected producer/consumer pair.
pub fn sample_queue() -> (FrameSink, SampleQueue) {
    let (sender, receiver) = unbounded();
    (
        FrameSink {
            sender,
            next_seq: Arc::new(AtomicU64::new(0)),
        },
        SampleQueue { receiver },
    )
}

/// Producer half. Cheap to clone and safe to call from any capture thread.
#[derive(Clone, Debug)]
pub struct FrameSink {
    sender: Sender<Frame>,
    next_seq: Arc<AtomicU64>,
}

impl FrameSink {
    /// Stamp the samples with the next sequence number and enqueue them.
    /// Returns `false` once the consumer is gone.
    pub fn push(&self, samples: Vec<i16>) -> bool {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.sender.send(Frame::new(seq, samples)).is_ok()
    }

    /// Number of frames pushed so far.
    pub fn pushed(&self) -> u64 {
        self.next_seq.load(Ordering::Relaxed)
    }
}

/// Consumer half, owned by the stream processor.
#[derive(Debug)]
pub struct SampleQueue {
    receiver: Receiver<Frame>,
}

impl SampleQueue {
    /// Wait up to `timeout` for the next frame. `None` means nothing arrived,
    /// which is an idle tick rather than an error.
    pub fn pop(&self, timeout: Duration) -> Option<Frame> {
        match self.receiver.recv_timeout(timeout) {
            Ok(frame) => Some(frame),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                // No producer left; keep the caller's cadence instead of spinning.
                thread::sleep(timeout);
                None
            }
        }
    }

    pub fn try_pop(&self) -> Option<Frame> {
        self.receiver.try_recv().ok()
    }

    pub fn len(&self) -> usize {
        self.receiver.len()
    }

    pub fn is_empty(&self) -> bool {
        self.receiver.is_empty()
    }
}
