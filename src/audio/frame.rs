/// One fixed-size block of mono 16-bit PCM as delivered by the capture callback.
///
/// `seq` is the capture order assigned by the [`FrameSink`](super::FrameSink);
/// frames are never mutated after capture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    seq: u64,
    samples: Vec<i16>,
}

impl Frame {
    pub fn new(seq: u64, samples: Vec<i16>) -> Self {
        Self { seq, samples }
    }

    pub fn seq(&self) -> u64 {
        self.seq
    }

    pub fn samples(&self) -> &[i16] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}
