const METER_CHAR: char = '#';
const METER_MAX_LEVEL: u32 = 99;
const METER_KNEE: u32 = 50;
const METER_MAX_WIDTH: u32 = 72;

/// Width of the bar for a level: linear up to 50, compressed 3:1 above that and
/// capped at 72 columns. Never zero so the line is visible in silence.
pub(crate) fn meter_width(level: u32) -> usize {
    let level = level.min(METER_MAX_LEVEL);
    let width = if level > METER_KNEE {
        (METER_KNEE + (level - METER_KNEE) / 3).min(METER_MAX_WIDTH)
    } else {
        level
    };
    width.max(1) as usize
}

/// One line of the periodic peak display, e.g. `#### 4*` while recording.
pub fn format_meter_line(level: u32, recording: bool) -> String {
    let shown = level.min(METER_MAX_LEVEL);
    let bar: String = std::iter::repeat(METER_CHAR)
        .take(meter_width(level))
        .collect();
    let marker = if recording { "*" } else { "" };
    format!("{bar} {shown}{marker}")
}
