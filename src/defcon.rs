//! DEFCON indicator levels
//!
//! The strip has one pixel per level. DEFCON 5 sits on pixel 0 and DEFCON 1
//! on pixel 4, so the pixel of a level is `4 - raw`.

use crate::color::{Rgb, rgb_from_u32};
use crate::math8::map_range;
use crate::{LED_COUNT, RenderTarget};

const DEFCON_NAME_1: &str = "DEFCON 1";
const DEFCON_NAME_2: &str = "DEFCON 2";
const DEFCON_NAME_3: &str = "DEFCON 3";
const DEFCON_NAME_4: &str = "DEFCON 4";
const DEFCON_NAME_5: &str = "DEFCON 5";
const DEFCON_NAME_NONE: &str = "None";

const DEFCON_PREFIX: &str = "DEFCON";

/// Palette used until a level color is overridden
pub const DEFAULT_DEFCON_COLORS: [Rgb; LED_COUNT] = [
    rgb_from_u32(0xFF_FF_FF),
    rgb_from_u32(0xFF_00_00),
    rgb_from_u32(0xFF_FF_00),
    rgb_from_u32(0x00_FF_00),
    rgb_from_u32(0x00_00_FF),
];

/// Palette color per level, indexed by the raw level value
pub type DefconPalette = [Rgb; LED_COUNT];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum DefconLevel {
    One = 0,
    Two = 1,
    Three = 2,
    Four = 3,
    Five = 4,
    #[default]
    None = 5,
}

impl DefconLevel {
    pub const fn from_raw(value: u8) -> Self {
        match value {
            0 => Self::One,
            1 => Self::Two,
            2 => Self::Three,
            3 => Self::Four,
            4 => Self::Five,
            _ => Self::None,
        }
    }

    pub const fn as_raw(self) -> u8 {
        self as u8
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::One => DEFCON_NAME_1,
            Self::Two => DEFCON_NAME_2,
            Self::Three => DEFCON_NAME_3,
            Self::Four => DEFCON_NAME_4,
            Self::Five => DEFCON_NAME_5,
            Self::None => DEFCON_NAME_NONE,
        }
    }

    /// Parse a level from text like `"DEFCON 3"` or `"DEFCON3"`
    ///
    /// Anything that does not start with `DEFCON` and end in a digit 1-5 is
    /// `None`.
    pub fn parse_from_str(value: &str) -> Self {
        if !value.starts_with(DEFCON_PREFIX) {
            return Self::None;
        }
        match value.as_bytes().last() {
            Some(digit @ b'1'..=b'5') => Self::from_raw(digit - b'1'),
            _ => Self::None,
        }
    }

    /// Strip pixel showing this level
    pub const fn pixel(self) -> Option<usize> {
        match self {
            Self::None => None,
            level => Some(LED_COUNT - 1 - level as usize),
        }
    }

    /// Level shown while a task is `step` of `total` done
    ///
    /// Runs linearly from raw level 4 at 0% down to raw level 0 at 100%.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_possible_wrap)]
    pub fn from_progress(step: usize, total: usize) -> Self {
        if total == 0 {
            return Self::One;
        }
        let percent = (100 * step / total).min(100) as i32;
        let raw = map_range(percent, 0, 100, 4, 0);
        Self::from_raw(raw as u8)
    }
}

/// Light only the pixel of `level`, in its palette color
pub fn show_level(target: &mut dyn RenderTarget, level: DefconLevel, palette: &DefconPalette) {
    let lit = level.pixel();
    for index in 0..LED_COUNT {
        let color = if Some(index) == lit {
            palette[level.as_raw() as usize]
        } else {
            Rgb::default()
        };
        target.set_pixel(index, color);
    }
    target.show_pixels();
}
