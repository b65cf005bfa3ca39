mod gamma;

use core::fmt::Write as _;

pub use gamma::{gamma8, gamma_correct};
use heapless::String;
use smart_leds::{RGB8, hsv::Hsv as HSV};
pub use smart_leds::hsv::hsv2rgb;

pub type Rgb = RGB8;
pub type Hsv = HSV;

/// Longest `"R,G,B"` string, `"255,255,255"`
pub const RGB_STRING_CAPACITY: usize = 11;

/// Create an RGB color from a u32 value (0xRRGGBB format)
#[allow(clippy::cast_possible_truncation)]
pub const fn rgb_from_u32(color: u32) -> Rgb {
    Rgb {
        r: ((color >> 16) & 0xFF) as u8,
        g: ((color >> 8) & 0xFF) as u8,
        b: (color & 0xFF) as u8,
    }
}

/// Pack an RGB color into a u32 value (0xRRGGBB format)
#[allow(clippy::cast_lossless)]
pub const fn rgb_to_u32(color: Rgb) -> u32 {
    ((color.r as u32) << 16) | ((color.g as u32) << 8) | color.b as u32
}

/// Color of a point on the 16-bit hue wheel at full saturation and value,
/// gamma corrected for the strip
#[allow(clippy::cast_possible_truncation)]
pub fn hue_wheel(hue: u16) -> Rgb {
    let color = hsv2rgb(Hsv {
        hue: (hue >> 8) as u8,
        sat: 255,
        val: 255,
    });
    gamma_correct(color)
}

/// Format a color as `"R,G,B"`
pub fn format_rgb(color: Rgb) -> String<RGB_STRING_CAPACITY> {
    let mut out = String::new();
    let _ = write!(out, "{},{},{}", color.r, color.g, color.b);
    out
}

/// Parse a `"R,G,B"` decimal triple
///
/// Whitespace around each component is ignored. Returns `None` unless there
/// are exactly three components in 0-255.
pub fn parse_rgb(value: &str) -> Option<Rgb> {
    let mut parts = value.split(',');
    let r = parts.next()?.trim().parse().ok()?;
    let g = parts.next()?.trim().parse().ok()?;
    let b = parts.next()?.trim().parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some(Rgb { r, g, b })
}
