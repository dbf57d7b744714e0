use super::Frame;
use std::collections::VecDeque;

/// Ring of the most recent frames seen while not recording, flushed into the
/// file when a recording starts so its beginning is not clipped.
#[derive(Debug)]
pub struct PreRollBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl PreRollBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            frames: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Append a frame, evicting and returning the oldest one once full. With a
    /// zero capacity the frame itself comes straight back.
    pub fn push(&mut self, frame: Frame) -> Option<Frame> {
        if self.capacity == 0 {
            return Some(frame);
        }
        let evicted = if self.frames.len() >= self.capacity {
            self.frames.pop_front()
        } else {
            None
        };
        self.frames.push_back(frame);
        evicted
    }

    /// Take the oldest buffered frame; `None` means the buffer is drained.
    pub fn pop_oldest(&mut self) -> Option<Frame> {
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}
