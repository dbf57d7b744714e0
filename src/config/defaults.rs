pub const DEFAULT_CHUNK: usize = 8192;
pub const MIN_CHUNK: usize = 64;
pub const MAX_CHUNK: usize = 262_144;

pub const DEFAULT_DEVICE_INDEX: usize = 2;

pub const DEFAULT_SAVERECS: usize = 8;
pub const MAX_SAVERECS: usize = 1024;

/// Also the "quiet" value restored when recording is switched off by hand.
pub const DEFAULT_THRESHOLD: u32 = 99;
pub const MIN_THRESHOLD: u32 = 1;
pub const MAX_THRESHOLD: u32 = 99;

pub const DEFAULT_HANG_DELAY_SECS: u64 = 6;
pub const MAX_HANG_DELAY_SECS: u64 = 3600;

pub const DEFAULT_TICK_MS: u64 = 1000;
pub const MIN_TICK_MS: u64 = 50;
pub const MAX_TICK_MS: u64 = 10_000;
