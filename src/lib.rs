#![no_std]

pub mod channel;
pub mod clock;
pub mod color;
pub mod command;
pub mod config;
pub mod defcon;
pub mod device;
pub mod effect;
pub mod frame;
pub mod loop_pacer;
pub mod math8;
pub mod note;
pub mod scheduler;
pub mod text;

pub use clock::{DateTime, TimeContext, WallClock};
pub use command::{
    CommandChannel, CommandProcessor, CommandReceiver, CommandSender, CommandSink, ConfigChange,
    DeviceCommand,
};
pub use config::{ConfigError, ConfigLayer, ConfigStore, DeviceConfig, PersistedConfig};
pub use defcon::DefconLevel;
pub use device::{
    BoardVariant, Button, ButtonEvent, ButtonPress, Device, DeviceError, DeviceLayer,
    HomeAssistantLayer, MqttLayer, MqttTransport, TickOutcome, WifiLayer,
};
pub use effect::{Effect, EffectContext, EffectDuration, EffectId, EffectSlot};
pub use frame::{AudioState, Frame, LED_COUNT};
pub use loop_pacer::LoopPacer;
pub use note::Pitch;
pub use scheduler::{EffectHandle, EffectScheduler};
pub use text::{DISPLAY_WIDTH, TextAlignment};

pub use color::{Hsv, Rgb};
pub use embassy_time::{Duration, Instant};

/// Abstract W.O.P.R. peripheral set
///
/// Implement this trait to drive the real display modules, the DEFCON strip
/// and the buzzer. Effects only ever talk to the hardware through it.
pub trait RenderTarget {
    /// Bring up the peripherals; called once by [`Device::begin`]
    fn init(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Stage a glyph for display cell `index` (0..12)
    fn write_cell(&mut self, index: usize, glyph: u8);

    /// Push staged cells to the display modules
    fn flush(&mut self);

    /// Stage a color for DEFCON pixel `index` (0..5)
    fn set_pixel(&mut self, index: usize, color: Rgb);

    /// Push staged pixels to the strip
    fn show_pixels(&mut self);

    /// Play a raw tone in Hz
    fn play_tone(&mut self, frequency: u16);

    /// Play a note of the equal-tempered scale
    fn play_note(&mut self, pitch: Pitch, octave: u8);

    /// Stop any tone
    fn silence(&mut self);

    /// Display brightness on the driver scale (0-15)
    fn set_display_brightness(&mut self, _level: u8) {}

    /// Strip brightness on the driver scale (0-255)
    fn set_pixel_brightness(&mut self, _level: u8) {}

    /// Write a whole 12 cell line and flush it
    fn show_cells(&mut self, cells: &text::Cells) {
        for (index, glyph) in cells.iter().enumerate() {
            self.write_cell(index, *glyph);
        }
        self.flush();
    }

    /// Blank the display
    fn clear_display(&mut self) {
        self.show_cells(&[b' '; DISPLAY_WIDTH]);
    }

    /// Turn all pixels off
    fn clear_pixels(&mut self) {
        self.fill_pixels(Rgb::default());
    }

    /// Set all pixels to one color and show them
    fn fill_pixels(&mut self, color: Rgb) {
        for index in 0..LED_COUNT {
            self.set_pixel(index, color);
        }
        self.show_pixels();
    }
}
