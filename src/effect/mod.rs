//! Effect system with compile-time known effect variants
//!
//! All effects are stored in an enum to avoid heap allocations.
//! Each effect implements the `Effect` trait and is driven by repeated
//! non-blocking `tick` calls from the scheduler.

mod clock;
mod code_solve;
mod countdown;
mod rainbow;
mod scroll;
mod song;
mod text;
mod tunes;

use embassy_time::{Duration, Instant};
use heapless::String;
use rand::rngs::SmallRng;

#[cfg(feature = "esp32-log")]
use esp_println::println;

pub use clock::{ClockEffect, ClockMode};
pub use code_solve::{CodeSolveEffect, CodeSolveVariant};
pub use countdown::CountdownEffect;
pub use rainbow::{HueRotation, RainbowEffect};
pub use scroll::ScrollTextEffect;
pub use song::{Note, SongEffect, note_duration};
pub use text::TextEffect;
pub use tunes::{NOKIA_TUNE, THE_RICK};

use crate::RenderTarget;
use crate::clock::WallClock;
use crate::config::DeviceConfig;
use crate::defcon::DefconPalette;

const EFFECT_NAME_TEXT: &str = "Text";
const EFFECT_NAME_SCROLL_TEXT: &str = "Scroll text";
const EFFECT_NAME_SONG: &str = "Song";
const EFFECT_NAME_TIME: &str = "Time";
const EFFECT_NAME_TIME_RAINBOW: &str = "Time R";
const EFFECT_NAME_DATE: &str = "Date";
const EFFECT_NAME_DATE_RAINBOW: &str = "Date R";
const EFFECT_NAME_DATETIME: &str = "Date Time";
const EFFECT_NAME_DATETIME_RAINBOW: &str = "Date Time R";
const EFFECT_NAME_XMAS_SECONDS: &str = "Xmas seconds";
const EFFECT_NAME_CODE_SOLVE: &str = "Code Solve";
const EFFECT_NAME_CODE_RANDOM: &str = "Random Code";
const EFFECT_NAME_CODE_MESSAGE: &str = "Message Code";
const EFFECT_NAME_RAINBOW: &str = "Rainbow";
const EFFECT_NAME_NOKIA_TUNE: &str = "Nokia Tune";
const EFFECT_NAME_THE_RICK: &str = "The Rick";

const EFFECT_ID_TIME: u8 = 0;
const EFFECT_ID_TIME_RAINBOW: u8 = 1;
const EFFECT_ID_DATE: u8 = 2;
const EFFECT_ID_DATE_RAINBOW: u8 = 3;
const EFFECT_ID_DATETIME: u8 = 4;
const EFFECT_ID_DATETIME_RAINBOW: u8 = 5;
const EFFECT_ID_XMAS_SECONDS: u8 = 6;
const EFFECT_ID_CODE_SOLVE: u8 = 7;
const EFFECT_ID_CODE_RANDOM: u8 = 8;
const EFFECT_ID_CODE_MESSAGE: u8 = 9;
const EFFECT_ID_RAINBOW: u8 = 10;
const EFFECT_ID_NOKIA_TUNE: u8 = 11;
const EFFECT_ID_THE_RICK: u8 = 12;

/// Capacity of an effect name
pub const EFFECT_NAME_CAPACITY: usize = 16;

pub type EffectName = String<EFFECT_NAME_CAPACITY>;

/// Everything an effect may touch during one call
pub struct EffectContext<'a> {
    /// Current tick
    pub now: Instant,
    /// Display, strip and buzzer
    pub target: &'a mut dyn RenderTarget,
    /// Local time of day
    pub clock: &'a dyn WallClock,
    /// Source for shuffles, filler glyphs and tones
    pub rng: &'a mut SmallRng,
    /// Fallback formats for the clock effects
    pub config: &'a DeviceConfig,
    /// Colors of the DEFCON levels
    pub palette: &'a DefconPalette,
}

/// How long an effect keeps running after its content is complete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EffectDuration {
    #[default]
    Infinite,
    Finite(Duration),
}

impl EffectDuration {
    pub const fn from_millis(millis: u64) -> Self {
        Self::Finite(Duration::from_millis(millis))
    }

    pub const fn is_infinite(self) -> bool {
        matches!(self, Self::Infinite)
    }
}

pub trait Effect {
    /// Name used to start the effect by name
    fn name(&self) -> &str;

    /// Configured run time
    fn duration(&self) -> EffectDuration;

    fn is_running(&self) -> bool;

    /// Arm the effect and render its first frame
    fn start(&mut self, ctx: &mut EffectContext<'_>);

    /// Advance by at most one frame
    fn tick(&mut self, ctx: &mut EffectContext<'_>);

    /// Clear display, strip and buzzer and stop running
    fn stop(&mut self, ctx: &mut EffectContext<'_>);
}

/// Bookkeeping shared by every effect
///
/// While content is incomplete the start time follows `now`, so a finite
/// duration only starts counting once the content has finished.
#[derive(Debug, Clone)]
pub struct Lifetime {
    name: EffectName,
    duration: EffectDuration,
    started_at: Instant,
    running: bool,
    content_done: bool,
}

impl Lifetime {
    pub fn new(name: &str, duration: EffectDuration) -> Self {
        Self {
            name: crate::text::copy_truncated(name),
            duration,
            started_at: Instant::from_millis(0),
            running: false,
            content_done: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) {
        self.name = crate::text::copy_truncated(name);
    }

    pub const fn duration(&self) -> EffectDuration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: EffectDuration) {
        self.duration = duration;
    }

    pub const fn is_running(&self) -> bool {
        self.running
    }

    pub const fn is_content_done(&self) -> bool {
        self.content_done
    }

    /// Mark the effect running from `now`
    ///
    /// `content_done` says whether the effect has content that must finish
    /// before the duration starts counting.
    pub fn begin(&mut self, now: Instant, content_done: bool) {
        #[cfg(feature = "esp32-log")]
        println!("[Lifetime.begin] starting effect {}", self.name.as_str());
        self.started_at = now;
        self.content_done = content_done;
        self.running = true;
    }

    /// Content reached its final frame at `now`
    pub fn finish_content(&mut self, now: Instant) {
        self.started_at = now;
        self.content_done = true;
    }

    /// Restart the duration window at `now`
    pub fn restart(&mut self, now: Instant) {
        self.started_at = now;
    }

    /// Stop running without touching the peripherals
    pub fn halt(&mut self) {
        self.running = false;
    }

    /// Clear every peripheral and stop running
    pub fn end(&mut self, target: &mut dyn RenderTarget) {
        #[cfg(feature = "esp32-log")]
        println!("[Lifetime.end] stopping effect {}", self.name.as_str());
        target.clear_display();
        target.clear_pixels();
        target.silence();
        self.running = false;
    }

    /// Check the duration at `now`
    ///
    /// Returns true when the effect should stop.
    pub fn expired(&mut self, now: Instant) -> bool {
        let EffectDuration::Finite(duration) = self.duration else {
            return false;
        };
        if !self.content_done {
            self.started_at = now;
            return false;
        }
        now > self.started_at + duration
    }
}

/// Next-frame deadline of a periodically refreshed effect
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickGate {
    next: Instant,
}

impl Default for TickGate {
    fn default() -> Self {
        Self::new()
    }
}

impl TickGate {
    pub const fn new() -> Self {
        Self {
            next: Instant::from_millis(0),
        }
    }

    /// Open the gate at `now`
    pub fn open(&mut self, now: Instant) {
        self.next = now;
    }

    pub fn is_ready(&self, now: Instant) -> bool {
        now >= self.next
    }

    /// Close the gate until `now + delay`
    pub fn schedule(&mut self, now: Instant, delay: Duration) {
        self.next = now + delay;
    }

    pub const fn deadline(&self) -> Instant {
        self.next
    }
}

/// Effect slot - enum containing all possible effects
#[derive(Debug, Clone)]
pub enum EffectSlot {
    Text(TextEffect),
    Scroll(ScrollTextEffect),
    Clock(ClockEffect),
    Countdown(CountdownEffect),
    CodeSolve(CodeSolveEffect),
    Rainbow(RainbowEffect),
    Song(SongEffect),
}

macro_rules! dispatch {
    ($slot:expr, $effect:ident => $body:expr) => {
        match $slot {
            EffectSlot::Text($effect) => $body,
            EffectSlot::Scroll($effect) => $body,
            EffectSlot::Clock($effect) => $body,
            EffectSlot::Countdown($effect) => $body,
            EffectSlot::CodeSolve($effect) => $body,
            EffectSlot::Rainbow($effect) => $body,
            EffectSlot::Song($effect) => $body,
        }
    };
}

impl Effect for EffectSlot {
    fn name(&self) -> &str {
        dispatch!(self, effect => effect.name())
    }

    fn duration(&self) -> EffectDuration {
        dispatch!(self, effect => effect.duration())
    }

    fn is_running(&self) -> bool {
        dispatch!(self, effect => effect.is_running())
    }

    fn start(&mut self, ctx: &mut EffectContext<'_>) {
        dispatch!(self, effect => effect.start(ctx));
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        dispatch!(self, effect => effect.tick(ctx));
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        dispatch!(self, effect => effect.stop(ctx));
    }
}

impl From<TextEffect> for EffectSlot {
    fn from(effect: TextEffect) -> Self {
        Self::Text(effect)
    }
}

impl From<ScrollTextEffect> for EffectSlot {
    fn from(effect: ScrollTextEffect) -> Self {
        Self::Scroll(effect)
    }
}

impl From<ClockEffect> for EffectSlot {
    fn from(effect: ClockEffect) -> Self {
        Self::Clock(effect)
    }
}

impl From<CountdownEffect> for EffectSlot {
    fn from(effect: CountdownEffect) -> Self {
        Self::Countdown(effect)
    }
}

impl From<CodeSolveEffect> for EffectSlot {
    fn from(effect: CodeSolveEffect) -> Self {
        Self::CodeSolve(effect)
    }
}

impl From<RainbowEffect> for EffectSlot {
    fn from(effect: RainbowEffect) -> Self {
        Self::Rainbow(effect)
    }
}

impl From<SongEffect> for EffectSlot {
    fn from(effect: SongEffect) -> Self {
        Self::Song(effect)
    }
}

/// Built-in effect presets that can be requested by id or name
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum EffectId {
    Time = EFFECT_ID_TIME,
    TimeRainbow = EFFECT_ID_TIME_RAINBOW,
    Date = EFFECT_ID_DATE,
    DateRainbow = EFFECT_ID_DATE_RAINBOW,
    DateTime = EFFECT_ID_DATETIME,
    DateTimeRainbow = EFFECT_ID_DATETIME_RAINBOW,
    XmasSeconds = EFFECT_ID_XMAS_SECONDS,
    CodeSolve = EFFECT_ID_CODE_SOLVE,
    CodeSolveRandom = EFFECT_ID_CODE_RANDOM,
    CodeSolveMessage = EFFECT_ID_CODE_MESSAGE,
    Rainbow = EFFECT_ID_RAINBOW,
    NokiaTune = EFFECT_ID_NOKIA_TUNE,
    TheRick = EFFECT_ID_THE_RICK,
}

impl EffectId {
    /// Every preset in id order
    pub const ALL: [Self; 13] = [
        Self::Time,
        Self::TimeRainbow,
        Self::Date,
        Self::DateRainbow,
        Self::DateTime,
        Self::DateTimeRainbow,
        Self::XmasSeconds,
        Self::CodeSolve,
        Self::CodeSolveRandom,
        Self::CodeSolveMessage,
        Self::Rainbow,
        Self::NokiaTune,
        Self::TheRick,
    ];

    pub fn from_raw(value: u8) -> Option<Self> {
        Some(match value {
            EFFECT_ID_TIME => Self::Time,
            EFFECT_ID_TIME_RAINBOW => Self::TimeRainbow,
            EFFECT_ID_DATE => Self::Date,
            EFFECT_ID_DATE_RAINBOW => Self::DateRainbow,
            EFFECT_ID_DATETIME => Self::DateTime,
            EFFECT_ID_DATETIME_RAINBOW => Self::DateTimeRainbow,
            EFFECT_ID_XMAS_SECONDS => Self::XmasSeconds,
            EFFECT_ID_CODE_SOLVE => Self::CodeSolve,
            EFFECT_ID_CODE_RANDOM => Self::CodeSolveRandom,
            EFFECT_ID_CODE_MESSAGE => Self::CodeSolveMessage,
            EFFECT_ID_RAINBOW => Self::Rainbow,
            EFFECT_ID_NOKIA_TUNE => Self::NokiaTune,
            EFFECT_ID_THE_RICK => Self::TheRick,
            _ => return None,
        })
    }

    /// Build the preset with its default settings
    pub fn to_slot(self) -> EffectSlot {
        match self {
            Self::Time => ClockEffect::new(ClockMode::Time).into(),
            Self::TimeRainbow => ClockEffect::new(ClockMode::Time).with_rainbow().into(),
            Self::Date => ClockEffect::new(ClockMode::Date).into(),
            Self::DateRainbow => ClockEffect::new(ClockMode::Date).with_rainbow().into(),
            Self::DateTime => ClockEffect::new(ClockMode::DateTime).into(),
            Self::DateTimeRainbow => ClockEffect::new(ClockMode::DateTime).with_rainbow().into(),
            Self::XmasSeconds => CountdownEffect::christmas().into(),
            Self::CodeSolve => CodeSolveEffect::new(CodeSolveVariant::Movie).into(),
            Self::CodeSolveRandom => CodeSolveEffect::new(CodeSolveVariant::Random)
                .with_name(EFFECT_NAME_CODE_RANDOM)
                .into(),
            Self::CodeSolveMessage => CodeSolveEffect::new(CodeSolveVariant::Message)
                .with_name(EFFECT_NAME_CODE_MESSAGE)
                .into(),
            Self::Rainbow => RainbowEffect::new().into(),
            Self::NokiaTune => SongEffect::nokia_tune().into(),
            Self::TheRick => SongEffect::the_rick().into(),
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Time => EFFECT_NAME_TIME,
            Self::TimeRainbow => EFFECT_NAME_TIME_RAINBOW,
            Self::Date => EFFECT_NAME_DATE,
            Self::DateRainbow => EFFECT_NAME_DATE_RAINBOW,
            Self::DateTime => EFFECT_NAME_DATETIME,
            Self::DateTimeRainbow => EFFECT_NAME_DATETIME_RAINBOW,
            Self::XmasSeconds => EFFECT_NAME_XMAS_SECONDS,
            Self::CodeSolve => EFFECT_NAME_CODE_SOLVE,
            Self::CodeSolveRandom => EFFECT_NAME_CODE_RANDOM,
            Self::CodeSolveMessage => EFFECT_NAME_CODE_MESSAGE,
            Self::Rainbow => EFFECT_NAME_RAINBOW,
            Self::NokiaTune => EFFECT_NAME_NOKIA_TUNE,
            Self::TheRick => EFFECT_NAME_THE_RICK,
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|id| id.as_str() == s)
    }
}
