//! Base W.O.P.R. device
//!
//! [`Device`] owns the render target, the effect scheduler and the state of
//! the display, the DEFCON strip and the buttons. The network layers wrap a
//! device by composition and forward everything they do not handle
//! themselves:
//!
//! ```text
//! HomeAssistantLayer -> MqttLayer -> WifiLayer -> Device
//! ```

mod home_assistant;
mod mqtt;
mod wifi;

use embassy_time::{Duration, Instant};
use heapless::{Deque, Vec};
use rand::SeedableRng;
use rand::rngs::SmallRng;

#[cfg(feature = "esp32-log")]
use esp_println::println;

pub use home_assistant::{
    DATE_FORMAT_OPTIONS, HomeAssistantConfig, HomeAssistantLayer, NetworkStatus, TIME_FORMAT_OPTIONS,
};
pub use mqtt::{
    ConnectOptions, InboundMessage, MqttConfig, MqttError, MqttLayer, MqttTransport, PAYLOAD_CAPACITY,
    TOPIC_CAPACITY, TopicString, parse_command,
};
pub use wifi::{NetworkConfig, WifiLayer, default_host_name};

use crate::clock::TimeContext;
use crate::color::Rgb;
use crate::command::{CommandSink, ConfigChange, DeviceCommand};
use crate::config::{
    ConfigError, ConfigLayer, DeviceConfig, JsonDocument, PersistedConfig, decode_section,
};
use crate::defcon::{DEFAULT_DEFCON_COLORS, DefconLevel, DefconPalette};
use crate::effect::{EffectContext, EffectDuration, EffectSlot, ScrollTextEffect};
use crate::math8::percent_to_level;
use crate::note::Pitch;
use crate::scheduler::{EffectHandle, EffectScheduler};
use crate::text::{DISPLAY_WIDTH, TextAlignment, copy_truncated, layout};
use crate::{LED_COUNT, RenderTarget};

/// Firmware version reported to Home Assistant
pub const FIRMWARE_VERSION: &str = "1.0.2";

/// Button presses buffered between ticks
pub const BUTTON_QUEUE_SIZE: usize = 8;

const DISPLAY_LEVEL_MAX: u8 = 15;
const PIXEL_LEVEL_MAX: u8 = 255;
const ONESHOT_SCROLL_SPEED: Duration = Duration::from_millis(100);

const MODEL_ORIGINAL: &str = "W.O.P.R";
const MODEL_HAXORZ: &str = "W.O.P.R. Haxorz";

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DeviceError {
    #[error("display modules did not initialize")]
    DisplayInit,
    #[error("DEFCON strip did not initialize")]
    PixelsInit,
    #[error("buzzer did not initialize")]
    AudioInit,
}

/// Hardware revision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BoardVariant {
    #[default]
    Original,
    /// Adds the two back buttons
    Haxorz,
}

impl BoardVariant {
    pub const fn has_back_buttons(self) -> bool {
        matches!(self, Self::Haxorz)
    }

    pub const fn model(self) -> &'static str {
        match self {
            Self::Original => MODEL_ORIGINAL,
            Self::Haxorz => MODEL_HAXORZ,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    FrontLeft,
    FrontRight,
    BackTop,
    BackBottom,
}

impl Button {
    pub const ALL: [Self; 4] = [Self::FrontLeft, Self::FrontRight, Self::BackTop, Self::BackBottom];

    const fn index(self) -> usize {
        self as usize
    }

    pub const fn is_back(self) -> bool {
        matches!(self, Self::BackTop | Self::BackBottom)
    }

    /// MQTT entity of the button
    pub const fn entity(self) -> &'static str {
        match self {
            Self::FrontLeft => "button_front_left",
            Self::FrontRight => "button_front_right",
            Self::BackTop => "button_back_top",
            Self::BackBottom => "button_back_bottom",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonEvent {
    Click,
    DoubleClick,
}

impl ButtonEvent {
    const fn index(self) -> usize {
        self as usize
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::DoubleClick => "double_click",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonPress {
    pub button: Button,
    pub event: ButtonEvent,
}

impl ButtonPress {
    pub const fn new(button: Button, event: ButtonEvent) -> Self {
        Self { button, event }
    }
}

/// Save a dirty configuration through the outermost layer and request a
/// restart
#[cfg_attr(not(feature = "esp32-log"), allow(unused_variables))]
pub(crate) fn persist_if_dirty<L: PersistedConfig>(layer: &mut L, outcome: &mut TickOutcome) -> bool {
    if !outcome.config_dirty {
        return false;
    }
    if let Err(err) = layer.save_config() {
        #[cfg(feature = "esp32-log")]
        println!("[persist_if_dirty] failed to save configuration: {}", err);
    }
    outcome.config_dirty = false;
    outcome.restart_requested = true;
    true
}

/// Callback run from [`Device`]'s tick for one button and event
pub type ButtonHandler<T, const N: usize> = fn(&mut Device<T, N>, ButtonPress, Instant);

/// What happened during one tick of a layer stack
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickOutcome {
    /// Button presses handled this tick
    pub presses: Vec<ButtonPress, BUTTON_QUEUE_SIZE>,
    /// Configuration changed and has not been saved yet
    pub config_dirty: bool,
    /// A restart was requested; the host should reboot
    pub restart_requested: bool,
    /// The MQTT session was (re)established this tick
    pub connected: bool,
}

/// Common surface of the base device and every network layer
pub trait DeviceLayer {
    /// Bring up the peripherals and apply the loaded configuration
    fn begin(&mut self) -> Result<(), DeviceError>;

    /// One pass of the cooperative main loop
    fn tick(&mut self, now: Instant) -> TickOutcome;
}

pub struct Device<T: RenderTarget, const N: usize> {
    target: T,
    variant: BoardVariant,
    scheduler: EffectScheduler<N>,
    time: TimeContext,
    rng: SmallRng,
    config: DeviceConfig,
    palette: DefconPalette,
    display_on: bool,
    /// Percent
    display_brightness: u8,
    defcon_on: bool,
    /// Percent
    defcon_brightness: u8,
    defcon_level: DefconLevel,
    /// Last color painted over the whole strip
    defcon_color: Rgb,
    pixels: [Rgb; LED_COUNT],
    handlers: [[Option<ButtonHandler<T, N>>; 2]; 4],
    pending: Deque<ButtonPress, BUTTON_QUEUE_SIZE>,
    config_dirty: bool,
    restart_requested: bool,
}

impl<T: RenderTarget, const N: usize> Device<T, N> {
    /// `seed` feeds the random source of the effects; use a hardware RNG
    /// value on the device
    pub fn new(target: T, variant: BoardVariant, seed: u64) -> Self {
        let config = DeviceConfig::default();
        Self {
            target,
            variant,
            scheduler: EffectScheduler::new(),
            time: TimeContext::new(),
            rng: SmallRng::seed_from_u64(seed),
            display_on: true,
            display_brightness: config.display_brightness,
            defcon_on: true,
            defcon_brightness: config.defcon_brightness,
            config,
            palette: DEFAULT_DEFCON_COLORS,
            defcon_level: DefconLevel::None,
            defcon_color: Rgb::default(),
            pixels: [Rgb::default(); LED_COUNT],
            handlers: [[None; 2]; 4],
            pending: Deque::new(),
            config_dirty: false,
            restart_requested: false,
        }
    }

    /// Initialize the peripherals and apply the current configuration
    pub fn begin(&mut self) -> Result<(), DeviceError> {
        self.target.init()?;
        self.apply_config();
        self.display_clear();
        self.defcon_clear();
        self.audio_clear();
        #[cfg(feature = "esp32-log")]
        println!("[Device.begin] {} ready", self.variant.model());
        Ok(())
    }

    pub const fn variant(&self) -> BoardVariant {
        self.variant
    }

    pub const fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub const fn time(&self) -> &TimeContext {
        &self.time
    }

    pub fn time_mut(&mut self) -> &mut TimeContext {
        &mut self.time
    }

    /// Record that UTC was `unix` seconds at `now`
    pub fn sync_time(&mut self, unix: i64, now: Instant) {
        self.time.sync(unix, now);
    }

    pub const fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub const fn palette(&self) -> &DefconPalette {
        &self.palette
    }

    pub const fn scheduler(&self) -> &EffectScheduler<N> {
        &self.scheduler
    }

    /// Borrow the scheduler together with a context for calling it
    fn split(&mut self, now: Instant) -> (&mut EffectScheduler<N>, EffectContext<'_>) {
        let ctx = EffectContext {
            now,
            target: &mut self.target,
            clock: &self.time,
            rng: &mut self.rng,
            config: &self.config,
            palette: &self.palette,
        };
        (&mut self.scheduler, ctx)
    }

    // Effects

    pub fn register_effect(
        &mut self,
        effect: impl Into<EffectSlot>,
    ) -> Result<EffectHandle, EffectSlot> {
        self.scheduler.register(effect)
    }

    pub fn register_default_effect(
        &mut self,
        effect: impl Into<EffectSlot>,
    ) -> Result<EffectHandle, EffectSlot> {
        self.scheduler.register_default(effect)
    }

    /// Start the registered effect called `name`; false when unknown
    pub fn start_effect(&mut self, name: &str, now: Instant) -> bool {
        let (scheduler, mut ctx) = self.split(now);
        scheduler.start_by_name(name, &mut ctx)
    }

    pub fn start_effect_handle(&mut self, handle: EffectHandle, now: Instant) {
        let (scheduler, mut ctx) = self.split(now);
        scheduler.start(handle, &mut ctx);
    }

    pub fn start_current_effect(&mut self, now: Instant) {
        let (scheduler, mut ctx) = self.split(now);
        scheduler.start_current(&mut ctx);
    }

    pub fn stop_effect(&mut self, now: Instant) {
        let (scheduler, mut ctx) = self.split(now);
        scheduler.stop_current(&mut ctx);
    }

    pub fn current_effect_is_running(&self) -> bool {
        self.scheduler.current_is_running()
    }

    pub fn current_effect_name(&self) -> Option<&str> {
        self.scheduler.current_name()
    }

    // Display

    pub fn display_set_state(&mut self, on: bool) {
        self.display_on = on;
        self.apply_display_brightness();
    }

    pub const fn display_state(&self) -> bool {
        self.display_on
    }

    /// Set the display brightness in percent
    pub fn display_set_brightness(&mut self, percent: u8) {
        self.display_brightness = percent.min(100);
        self.apply_display_brightness();
    }

    pub const fn display_brightness(&self) -> u8 {
        self.display_brightness
    }

    fn apply_display_brightness(&mut self) {
        let level = if self.display_on {
            percent_to_level(self.display_brightness, DISPLAY_LEVEL_MAX)
        } else {
            0
        };
        self.target.set_display_brightness(level);
    }

    pub fn display_clear(&mut self) {
        self.target.clear_display();
    }

    pub fn display_show_text(&mut self, text: &str, alignment: TextAlignment) {
        self.target.show_cells(&layout(text, alignment));
    }

    /// Replace one cell; out of range indexes are ignored
    pub fn display_set_cell(&mut self, index: usize, glyph: u8) {
        if index >= DISPLAY_WIDTH {
            return;
        }
        self.target.write_cell(index, glyph);
        self.target.flush();
    }

    /// Scroll `text` once across the display without blocking
    ///
    /// The scroll replaces the current effect and ends by itself.
    pub fn display_scroll_text(&mut self, text: &str, now: Instant) {
        self.display_scroll_text_with_speed(text, ONESHOT_SCROLL_SPEED, now);
    }

    pub fn display_scroll_text_with_speed(&mut self, text: &str, speed: Duration, now: Instant) {
        let scroll = ScrollTextEffect::new(text)
            .with_speed(speed)
            .with_duration(EffectDuration::from_millis(0));
        let (scheduler, mut ctx) = self.split(now);
        scheduler.start_oneshot(scroll, &mut ctx);
    }

    // DEFCON strip

    /// Switch the strip on or off; pixels are kept and shown again when on
    /// unless an effect is drawing on the strip
    pub fn defcon_set_state(&mut self, on: bool) {
        self.defcon_on = on;
        self.apply_defcon_brightness();
        self.refresh_pixels();
    }

    pub const fn defcon_state(&self) -> bool {
        self.defcon_on
    }

    /// Set the strip brightness in percent
    pub fn defcon_set_brightness(&mut self, percent: u8) {
        self.defcon_brightness = percent.min(100);
        self.apply_defcon_brightness();
        self.refresh_pixels();
    }

    pub const fn defcon_brightness(&self) -> u8 {
        self.defcon_brightness
    }

    fn apply_defcon_brightness(&mut self) {
        let level = if self.defcon_on {
            percent_to_level(self.defcon_brightness, PIXEL_LEVEL_MAX)
        } else {
            0
        };
        self.target.set_pixel_brightness(level);
    }

    /// Light only the pixel of `level` in its palette color
    pub fn defcon_set_level(&mut self, level: DefconLevel) {
        self.defcon_level = level;
        self.pixels = [Rgb::default(); LED_COUNT];
        if let Some(pixel) = level.pixel() {
            self.pixels[pixel] = self.palette[level.as_raw() as usize];
        }
        self.show_cached_pixels();
    }

    pub const fn defcon_level(&self) -> DefconLevel {
        self.defcon_level
    }

    /// Paint every pixel with `color`
    pub fn defcon_set_color(&mut self, color: Rgb) {
        self.defcon_color = color;
        self.pixels = [color; LED_COUNT];
        self.show_cached_pixels();
    }

    pub const fn defcon_color(&self) -> Rgb {
        self.defcon_color
    }

    /// Paint the pixel of `level` with `color`, leaving the others
    pub fn defcon_set_level_color(&mut self, level: DefconLevel, color: Rgb) {
        if let Some(pixel) = level.pixel() {
            self.pixels[pixel] = color;
            self.show_cached_pixels();
        }
    }

    /// Change the palette color used for `level`
    pub fn defcon_set_palette_color(&mut self, level: DefconLevel, color: Rgb) {
        if let Some(slot) = self.palette.get_mut(level.as_raw() as usize) {
            *slot = color;
        }
    }

    pub fn defcon_clear(&mut self) {
        self.defcon_level = DefconLevel::None;
        self.pixels = [Rgb::default(); LED_COUNT];
        self.show_cached_pixels();
    }

    /// Pixels as last set through the device
    pub const fn defcon_pixels(&self) -> &[Rgb; LED_COUNT] {
        &self.pixels
    }

    /// Push a brightness change to the strip
    ///
    /// A running effect owns the strip, so its frame is shown as is.
    fn refresh_pixels(&mut self) {
        if self.current_effect_is_running() {
            self.target.show_pixels();
        } else {
            self.show_cached_pixels();
        }
    }

    fn show_cached_pixels(&mut self) {
        for (index, color) in self.pixels.iter().enumerate() {
            self.target.set_pixel(index, *color);
        }
        self.target.show_pixels();
    }

    // Audio

    pub fn audio_play_tone(&mut self, frequency: u16) {
        self.target.play_tone(frequency);
    }

    pub fn audio_play_note(&mut self, pitch: Pitch, octave: u8) {
        self.target.play_note(pitch, octave);
    }

    pub fn audio_clear(&mut self) {
        self.target.silence();
    }

    // Buttons

    pub fn set_button_handler(
        &mut self,
        button: Button,
        event: ButtonEvent,
        handler: ButtonHandler<T, N>,
    ) {
        self.handlers[button.index()][event.index()] = Some(handler);
    }

    pub fn clear_button_handler(&mut self, button: Button, event: ButtonEvent) {
        self.handlers[button.index()][event.index()] = None;
    }

    /// Queue a press for the next tick
    ///
    /// Returns the press back when the queue is full or the board has no
    /// such button.
    pub fn queue_button(&mut self, press: ButtonPress) -> Result<(), ButtonPress> {
        if press.button.is_back() && !self.variant.has_back_buttons() {
            return Err(press);
        }
        self.pending.push_back(press)
    }

    // Configuration

    /// Push brightness and idle timeout from the configuration to the
    /// peripherals and the scheduler
    fn apply_config(&mut self) {
        self.display_brightness = self.config.display_brightness.min(100);
        self.defcon_brightness = self.config.defcon_brightness.min(100);
        self.apply_display_brightness();
        self.apply_defcon_brightness();
        self.scheduler
            .set_idle_timeout(Duration::from_secs(u64::from(self.config.effects_timeout)));
    }

    pub fn set_time_format(&mut self, format: &str) {
        self.config.time_format = copy_truncated(format);
        self.mark_config_dirty();
    }

    pub fn set_date_format(&mut self, format: &str) {
        self.config.date_format = copy_truncated(format);
        self.mark_config_dirty();
    }

    /// Persisted display brightness in percent
    pub fn set_config_display_brightness(&mut self, percent: u8) {
        self.config.display_brightness = percent.min(100);
        self.mark_config_dirty();
    }

    /// Persisted strip brightness in percent
    pub fn set_config_defcon_brightness(&mut self, percent: u8) {
        self.config.defcon_brightness = percent.min(100);
        self.mark_config_dirty();
    }

    pub fn set_effects_timeout(&mut self, seconds: u32) {
        self.config.effects_timeout = seconds;
        self.scheduler
            .set_idle_timeout(Duration::from_secs(u64::from(seconds)));
        self.mark_config_dirty();
    }

    /// Apply a device setting change
    ///
    /// Returns false for settings owned by an outer layer.
    pub fn apply_config_change(&mut self, change: &ConfigChange) -> bool {
        match change {
            ConfigChange::TimeFormat(format) => self.set_time_format(format),
            ConfigChange::DateFormat(format) => self.set_date_format(format),
            ConfigChange::DisplayBrightness(percent) => self.set_config_display_brightness(*percent),
            ConfigChange::DefconBrightness(percent) => self.set_config_defcon_brightness(*percent),
            ConfigChange::EffectsTimeout(seconds) => self.set_effects_timeout(*seconds),
            ConfigChange::HostName(_) | ConfigChange::UseWebPortal(_) => return false,
        }
        true
    }

    pub fn mark_config_dirty(&mut self) {
        self.config_dirty = true;
    }

    pub const fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }

    pub fn request_restart(&mut self) {
        #[cfg(feature = "esp32-log")]
        println!("[Device.request_restart] restart requested");
        self.restart_requested = true;
    }

    pub const fn restart_requested(&self) -> bool {
        self.restart_requested
    }

    /// Handle queued button presses, then advance the effects
    ///
    /// The dirty flag is handed to the caller through the outcome.
    pub fn step(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();

        while let Some(press) = self.pending.pop_front() {
            if let Some(handler) = self.handlers[press.button.index()][press.event.index()] {
                handler(self, press, now);
            }
            let _ = outcome.presses.push(press);
        }

        let (scheduler, mut ctx) = self.split(now);
        scheduler.tick(&mut ctx);

        outcome.config_dirty = core::mem::take(&mut self.config_dirty);
        outcome.restart_requested = self.restart_requested;
        outcome
    }
}

impl<T: RenderTarget, const N: usize> DeviceLayer for Device<T, N> {
    fn begin(&mut self) -> Result<(), DeviceError> {
        Device::begin(self)
    }

    fn tick(&mut self, now: Instant) -> TickOutcome {
        self.step(now)
    }
}

impl<T: RenderTarget, const N: usize> ConfigLayer for Device<T, N> {
    fn load_sections(&mut self, json: &[u8]) -> Result<(), ConfigError> {
        self.config = decode_section(json)?;
        self.apply_config();
        Ok(())
    }

    fn save_sections<const M: usize>(&self, doc: &mut JsonDocument<M>) -> Result<(), ConfigError> {
        doc.merge(&self.config)
    }
}

impl<T: RenderTarget, const N: usize> CommandSink for Device<T, N> {
    fn apply(&mut self, command: DeviceCommand, now: Instant) {
        match command {
            DeviceCommand::Restart => self.request_restart(),
            DeviceCommand::StartEffect(name) => {
                self.start_effect(&name, now);
            }
            DeviceCommand::StopEffect => self.stop_effect(now),
            DeviceCommand::ShowText(text) => {
                if self.current_effect_is_running() {
                    self.stop_effect(now);
                }
                self.display_show_text(&text, TextAlignment::Left);
            }
            DeviceCommand::ScrollText(text) => self.display_scroll_text(&text, now),
            DeviceCommand::DisplayState(on) => self.display_set_state(on),
            DeviceCommand::DisplayBrightness(percent) => self.display_set_brightness(percent),
            DeviceCommand::DefconState(on) => self.defcon_set_state(on),
            DeviceCommand::DefconLevel(level) => self.defcon_set_level(level),
            DeviceCommand::DefconColor(color) => self.defcon_set_color(color),
            DeviceCommand::DefconBrightness(percent) => self.defcon_set_brightness(percent),
            DeviceCommand::Config(change) => {
                if !self.apply_config_change(&change) {
                    #[cfg(feature = "esp32-log")]
                    println!("[Device.apply] setting {:?} needs the network layer", change);
                }
            }
        }
    }
}
