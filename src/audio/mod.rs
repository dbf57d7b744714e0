//! Audio capture side of the pipeline.
//!
//! Frames come off the device callback as fixed-size mono 16-bit PCM blocks,
//! travel through the unbounded [`SampleQueue`], and are measured with
//! [`compute_level`] before the stream processor files them either into the
//! [`PreRollBuffer`] or the open recording.

/// Every recording is mono.
pub const CHANNELS: u16 = 1;

/// Every recording is 16-bit signed PCM.
pub const BITS_PER_SAMPLE: u16 = 16;

mod dispatch;
mod frame;
mod level;
mod meter;
mod preroll;
mod queue;
mod recorder;

pub use dispatch::{CaptureFlow, FrameDispatcher};
pub use frame::Frame;
pub use level::{compute_level, LEVEL_REFERENCE};
pub use meter::format_meter_line;
pub use preroll::PreRollBuffer;
pub use queue::{sample_queue, FrameSink, SampleQueue};
pub use recorder::{CaptureStream, InputDevice, Recorder};
