use crate::color::Rgb;

/// Exponent of the strip's perceptual correction curve
const GAMMA: f32 = 2.6;

/// Gamma-correct a single channel
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn gamma8(value: u8) -> u8 {
    let normalized = f32::from(value) / 255.0;
    libm::roundf(libm::powf(normalized, GAMMA) * 255.0) as u8
}

/// Gamma-correct all channels of a color
pub fn gamma_correct(color: Rgb) -> Rgb {
    Rgb {
        r: gamma8(color.r),
        g: gamma8(color.g),
        b: gamma8(color.b),
    }
}
