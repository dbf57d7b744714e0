use super::FrameSink;
use crate::session::Session;
use std::sync::Arc;

/// Answer the capture callback gives back to the audio backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureFlow {
    Continue,
    Stop,
}

pub(crate) fn f32_to_i16(sample: f32) -> i16 {
    (sample.clamp(-1.0, 1.0) * 32_767.0) as i16
}

pub(crate) fn u16_to_i16(sample: u16) -> i16 {
    (i32::from(sample) - 32_768) as i16
}

/// Downmix multi-channel input to mono while applying the provided converter so
/// the recording always carries a single channel regardless of the device layout.
pub(super) fn append_downmixed_samples<T, F>(
    buf: &mut Vec<i16>,
    data: &[T],
    channels: usize,
    mut convert: F,
) where
    T: Copy,
    F: FnMut(T) -> i16,
{
    if channels <= 1 {
        buf.extend(data.iter().copied().map(&mut convert));
        return;
    }

    // Average each interleaved frame to produce a mono representation.
    let mut acc = 0i32;
    let mut count = 0i32;
    for sample in data.iter().copied() {
        acc += i32::from(convert(sample));
        count += 1;
        if count as usize == channels {
            buf.push((acc / count) as i16);
            acc = 0;
            count = 0;
        }
    }
    if count > 0 {
        buf.push((acc / count) as i16);
    }
}

/// Sits inside the capture callback: converts whatever the device delivers into
/// fixed-size mono i16 frames and hands them to the sample queue.
pub struct FrameDispatcher {
    frame_samples: usize,
    pending: Vec<i16>,
    scratch: Vec<i16>,
    sink: FrameSink,
    session: Arc<Session>,
    stopped: bool,
}

impl FrameDispatcher {
    pub fn new(frame_samples: usize, sink: FrameSink, session: Arc<Session>) -> Self {
        let frame_samples = frame_samples.max(1);
        Self {
            frame_samples,
            pending: Vec::with_capacity(frame_samples * 2),
            scratch: Vec::new(),
            sink,
            session,
            stopped: false,
        }
    }

    pub fn frame_samples(&self) -> usize {
        self.frame_samples
    }

    /// Feed one callback's worth of interleaved samples. Never blocks.
    pub fn push<T, F>(&mut self, data: &[T], channels: usize, convert: F) -> CaptureFlow
    where
        T: Copy,
        F: FnMut(T) -> i16,
    {
        if self.stopped || !self.session.is_running() {
            self.stopped = true;
            self.pending.clear();
            return CaptureFlow::Stop;
        }

        self.scratch.clear();
        append_downmixed_samples(&mut self.scratch, data, channels, convert);
        self.pending.extend_from_slice(&self.scratch);

        while self.pending.len() >= self.frame_samples {
            let frame: Vec<i16> = self.pending.drain(..self.frame_samples).collect();
            if !self.sink.push(frame) {
                self.stopped = true;
                self.pending.clear();
                return CaptureFlow::Stop;
            }
        }
        CaptureFlow::Continue
    }
}
