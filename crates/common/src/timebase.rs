//! Microsecond timebase helpers.
//!
//! All timeline arithmetic is done in integer microseconds so that
//! accumulating many segments never drifts. Frame rate only matters when
//! snapping a cut point to a frame boundary.

/// Timeline time in microseconds.
pub type Micros = u64;

pub const MICROS_PER_MILLI: u64 = 1_000;
pub const MICROS_PER_SECOND: u64 = 1_000_000;

/// Convert milliseconds to microseconds, `None` on overflow.
pub fn ms_to_micros(ms: u64) -> Option<Micros> {
    ms.checked_mul(MICROS_PER_MILLI)
}

/// Microseconds as fractional seconds (display only).
pub fn micros_to_secs(micros: Micros) -> f64 {
    micros as f64 / MICROS_PER_SECOND as f64
}

/// Parse a decimal seconds string (`"12.345678"`) into microseconds
/// without going through floating point. Digits past the sixth decimal
/// place are truncated.
pub fn parse_decimal_seconds(raw: &str) -> Option<Micros> {
    let raw = raw.trim();
    if raw.is_empty() || raw.starts_with('-') {
        return None;
    }
    let (whole, frac) = match raw.split_once('.') {
        Some((w, f)) => (w, f),
        None => (raw, ""),
    };
    if !whole.chars().all(|c| c.is_ascii_digit()) || !frac.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    if whole.is_empty() && frac.is_empty() {
        return None;
    }

    let whole_secs: u64 = if whole.is_empty() { 0 } else { whole.parse().ok()? };
    let mut frac_micros: u64 = 0;
    for (i, digit) in frac.bytes().take(6).enumerate() {
        let place = 10u64.pow(5 - i as u32);
        frac_micros += (digit - b'0') as u64 * place;
    }

    whole_secs
        .checked_mul(MICROS_PER_SECOND)?
        .checked_add(frac_micros)
}

/// Length of one frame, rounded to the nearest microsecond and never zero.
pub fn frame_duration_micros(fps: u32) -> Micros {
    let fps = fps.max(1) as u64;
    ((MICROS_PER_SECOND + fps / 2) / fps).max(1)
}

/// Snap a duration down to a whole number of frames.
pub fn snap_down_to_frame(micros: Micros, fps: u32) -> Micros {
    let fps = fps.max(1) as u128;
    let frames = micros as u128 * fps / MICROS_PER_SECOND as u128;
    (frames * MICROS_PER_SECOND as u128 / fps) as Micros
}

/// Snap a duration to the nearest whole number of frames.
pub fn snap_to_nearest_frame(micros: Micros, fps: u32) -> Micros {
    let fps = fps.max(1) as u128;
    let per_sec = MICROS_PER_SECOND as u128;
    let frames = (micros as u128 * fps + per_sec / 2) / per_sec;
    (frames * per_sec / fps) as Micros
}

/// Format microseconds as `HH:MM:SS.mmm`.
pub fn format_timecode(micros: Micros) -> String {
    let total_ms = micros / MICROS_PER_MILLI;
    let hours = total_ms / 3_600_000;
    let minutes = (total_ms % 3_600_000) / 60_000;
    let seconds = (total_ms % 60_000) / 1000;
    let millis = total_ms % 1000;
    format!("{hours:02}:{minutes:02}:{seconds:02}.{millis:03}")
}
