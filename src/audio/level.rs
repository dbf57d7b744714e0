/// Amplitude that maps to level 100: 2^12 on the 16-bit signed scale.
pub const LEVEL_REFERENCE: f64 = 4096.0;

/// Normalized peak level of a frame: mean absolute amplitude scaled so that
/// [`LEVEL_REFERENCE`] reads as 100. Loud input reads above 100 (full scale is
/// 800) and shows up on the meter as such.
pub fn compute_level(samples: &[i16]) -> u32 {
    if samples.is_empty() {
        return 0;
    }
    let sum: u64 = samples
        .iter()
        .map(|&s| u64::from(s.unsigned_abs()))
        .sum();
    let mean = sum as f64 / samples.len() as f64;
    (mean * 100.0 / LEVEL_REFERENCE) as u32
}
