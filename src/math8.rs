/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0)
#[inline]
#[allow(clippy::cast_lossless, clippy::cast_possible_truncation)]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Re-map `value` from one integer range onto another
///
/// Integer division truncates toward zero, so mapping onto a descending
/// range rounds toward the range start.
#[inline]
pub const fn map_range(value: i32, in_min: i32, in_max: i32, out_min: i32, out_max: i32) -> i32 {
    if in_max == in_min {
        return out_min;
    }
    (value - in_min) * (out_max - out_min) / (in_max - in_min) + out_min
}

/// Convert a percentage (clamped to 0-100) to a driver level 0-`max`
#[inline]
#[allow(clippy::cast_sign_loss, clippy::cast_possible_truncation)]
pub const fn percent_to_level(percent: u8, max: u8) -> u8 {
    let percent = if percent > 100 { 100 } else { percent };
    map_range(percent as i32, 0, 100, 0, max as i32) as u8
}
