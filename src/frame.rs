//! In-memory render target
//!
//! `Frame` keeps the last shown display line, strip colors and audio state.
//! Hosts use it for previews and tests; firmware drives real peripherals
//! through its own [`RenderTarget`] implementation.

use crate::color::Rgb;
use crate::note::Pitch;
use crate::text::{Cells, DISPLAY_WIDTH, cells_as_str};
use crate::RenderTarget;

/// Number of DEFCON pixels
pub const LED_COUNT: usize = 5;

/// What the buzzer is doing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AudioState {
    #[default]
    Silent,
    Tone(u16),
    Note { pitch: Pitch, octave: u8 },
}

#[derive(Debug, Clone)]
pub struct Frame {
    staged_cells: Cells,
    cells: Cells,
    staged_pixels: [Rgb; LED_COUNT],
    pixels: [Rgb; LED_COUNT],
    audio: AudioState,
    display_brightness: u8,
    pixel_brightness: u8,
    flushes: u32,
}

impl Default for Frame {
    fn default() -> Self {
        Self::new()
    }
}

impl Frame {
    pub const fn new() -> Self {
        Self {
            staged_cells: [b' '; DISPLAY_WIDTH],
            cells: [b' '; DISPLAY_WIDTH],
            staged_pixels: [Rgb { r: 0, g: 0, b: 0 }; LED_COUNT],
            pixels: [Rgb { r: 0, g: 0, b: 0 }; LED_COUNT],
            audio: AudioState::Silent,
            display_brightness: 0,
            pixel_brightness: 0,
            flushes: 0,
        }
    }

    /// Cells as last flushed
    pub const fn cells(&self) -> &Cells {
        &self.cells
    }

    /// Display line as last flushed
    pub fn text(&self) -> &str {
        cells_as_str(&self.cells)
    }

    /// Pixels as last shown
    pub const fn pixels(&self) -> &[Rgb; LED_COUNT] {
        &self.pixels
    }

    pub const fn audio(&self) -> AudioState {
        self.audio
    }

    pub const fn display_brightness(&self) -> u8 {
        self.display_brightness
    }

    pub const fn pixel_brightness(&self) -> u8 {
        self.pixel_brightness
    }

    /// Number of display flushes so far
    pub const fn flush_count(&self) -> u32 {
        self.flushes
    }

    /// True when nothing is visible or audible
    pub fn is_dark(&self) -> bool {
        self.cells.iter().all(|cell| *cell == b' ')
            && self.pixels.iter().all(|pixel| *pixel == Rgb::default())
            && self.audio == AudioState::Silent
    }
}

impl RenderTarget for Frame {
    fn write_cell(&mut self, index: usize, glyph: u8) {
        if let Some(cell) = self.staged_cells.get_mut(index) {
            *cell = glyph;
        }
    }

    fn flush(&mut self) {
        self.cells = self.staged_cells;
        self.flushes = self.flushes.wrapping_add(1);
    }

    fn set_pixel(&mut self, index: usize, color: Rgb) {
        if let Some(pixel) = self.staged_pixels.get_mut(index) {
            *pixel = color;
        }
    }

    fn show_pixels(&mut self) {
        self.pixels = self.staged_pixels;
    }

    fn play_tone(&mut self, frequency: u16) {
        self.audio = AudioState::Tone(frequency);
    }

    fn play_note(&mut self, pitch: Pitch, octave: u8) {
        self.audio = AudioState::Note { pitch, octave };
    }

    fn silence(&mut self) {
        self.audio = AudioState::Silent;
    }

    fn set_display_brightness(&mut self, level: u8) {
        self.display_brightness = level;
    }

    fn set_pixel_brightness(&mut self, level: u8) {
        self.pixel_brightness = level;
    }
}
