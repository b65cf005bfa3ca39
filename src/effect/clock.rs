//! Time, date and date+time display effects
//!
//! One effect type covers all three clock faces. Each refresh reads the wall
//! clock from the effect context and renders the face centered. The time face
//! alternates between its format and a dotted "odd" format so separators
//! blink; the date+time face shows the time for seven refreshes and the date
//! for three.

use embassy_time::Duration;
use heapless::String;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{
    EFFECT_NAME_DATE, EFFECT_NAME_DATE_RAINBOW, EFFECT_NAME_DATETIME, EFFECT_NAME_DATETIME_RAINBOW,
    EFFECT_NAME_TIME, EFFECT_NAME_TIME_RAINBOW, Effect, EffectContext, EffectDuration, HueRotation,
    Lifetime, TickGate,
};
use crate::clock::{DateTime, format_time, odd_time_format};
use crate::config::FormatString;
use crate::text::{DISPLAY_WIDTH, TextAlignment, copy_truncated, layout};

const FALLBACK_TIME_FORMAT: &str = "%H:%M:%S";
const FALLBACK_DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FAILED: &str = "Time failed";

const TIME_REFRESH: Duration = Duration::from_millis(500);
const DATE_REFRESH: Duration = Duration::from_millis(1000);

/// Refreshes per date+time cycle
const CYCLE_LENGTH: u8 = 10;
/// Refreshes of a cycle that show the time
const TIME_SHARE: u8 = 7;

/// Clock face
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClockMode {
    Time,
    Date,
    DateTime,
}

impl ClockMode {
    const fn refresh(self) -> Duration {
        match self {
            Self::Date => DATE_REFRESH,
            Self::Time | Self::DateTime => TIME_REFRESH,
        }
    }

    const fn name(self, rainbow: bool) -> &'static str {
        match (self, rainbow) {
            (Self::Time, false) => EFFECT_NAME_TIME,
            (Self::Time, true) => EFFECT_NAME_TIME_RAINBOW,
            (Self::Date, false) => EFFECT_NAME_DATE,
            (Self::Date, true) => EFFECT_NAME_DATE_RAINBOW,
            (Self::DateTime, false) => EFFECT_NAME_DATETIME,
            (Self::DateTime, true) => EFFECT_NAME_DATETIME_RAINBOW,
        }
    }

    const fn failure_alignment(self) -> TextAlignment {
        match self {
            Self::Time => TextAlignment::Center,
            Self::Date | Self::DateTime => TextAlignment::Left,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClockEffect {
    lifetime: Lifetime,
    mode: ClockMode,
    /// Formats given at construction; empty means "use the configuration"
    time_format: FormatString,
    date_format: FormatString,
    /// Formats resolved at start
    even_format: FormatString,
    odd_format: FormatString,
    resolved_date_format: FormatString,
    even: bool,
    counter: u8,
    gate: TickGate,
    rainbow: Option<HueRotation>,
}

impl ClockEffect {
    pub fn new(mode: ClockMode) -> Self {
        Self {
            lifetime: Lifetime::new(mode.name(false), EffectDuration::Infinite),
            mode,
            time_format: FormatString::new(),
            date_format: FormatString::new(),
            even_format: FormatString::new(),
            odd_format: FormatString::new(),
            resolved_date_format: FormatString::new(),
            even: false,
            counter: 0,
            gate: TickGate::new(),
            rainbow: None,
        }
    }

    /// Rotate rainbow hues over the DEFCON strip while showing the clock
    #[must_use]
    pub fn with_rainbow(mut self) -> Self {
        self.rainbow = Some(HueRotation::new());
        self.lifetime.set_name(self.mode.name(true));
        self
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.lifetime.set_name(name);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: EffectDuration) -> Self {
        self.lifetime.set_duration(duration);
        self
    }

    #[must_use]
    pub fn with_time_format(mut self, format: &str) -> Self {
        self.time_format = copy_truncated(format);
        self
    }

    #[must_use]
    pub fn with_date_format(mut self, format: &str) -> Self {
        self.date_format = copy_truncated(format);
        self
    }

    pub const fn mode(&self) -> ClockMode {
        self.mode
    }

    pub const fn has_rainbow(&self) -> bool {
        self.rainbow.is_some()
    }

    /// Time format in use since the last start
    pub fn time_format(&self) -> &str {
        &self.even_format
    }

    /// Dotted time format in use since the last start
    pub fn odd_time_format(&self) -> &str {
        &self.odd_format
    }

    /// Date format in use since the last start
    pub fn date_format(&self) -> &str {
        &self.resolved_date_format
    }

    fn resolve_formats(&mut self, ctx: &EffectContext<'_>) {
        let time = pick_format(&self.time_format, &ctx.config.time_format, FALLBACK_TIME_FORMAT);
        let date = pick_format(&self.date_format, &ctx.config.date_format, FALLBACK_DATE_FORMAT);
        self.even_format = copy_truncated(time);
        self.odd_format = odd_time_format(time);
        self.resolved_date_format = copy_truncated(date);
    }

    fn render(&mut self, ctx: &mut EffectContext<'_>) {
        let Some(local) = ctx.clock.local_time(ctx.now) else {
            #[cfg(feature = "esp32-log")]
            println!("[ClockEffect.render] failed to obtain time");
            let cells = layout(TIME_FAILED, self.mode.failure_alignment());
            ctx.target.show_cells(&cells);
            return;
        };

        let text = match self.mode {
            ClockMode::Time => self.next_time_text(&local),
            ClockMode::Date => format_time(&local, &self.resolved_date_format),
            ClockMode::DateTime => {
                self.counter += 1;
                if self.counter >= CYCLE_LENGTH {
                    self.counter = 0;
                }
                if self.counter < TIME_SHARE {
                    self.next_time_text(&local)
                } else {
                    format_time(&local, &self.resolved_date_format)
                }
            }
        };
        ctx.target.show_cells(&layout(&text, TextAlignment::Center));
    }

    fn next_time_text(&mut self, local: &DateTime) -> String<DISPLAY_WIDTH> {
        self.even = !self.even;
        let format = if self.even {
            &self.even_format
        } else {
            &self.odd_format
        };
        format_time(local, format)
    }
}

fn pick_format<'a>(explicit: &'a str, configured: &'a str, fallback: &'a str) -> &'a str {
    if !explicit.is_empty() {
        explicit
    } else if !configured.is_empty() {
        configured
    } else {
        fallback
    }
}

impl Effect for ClockEffect {
    fn name(&self) -> &str {
        self.lifetime.name()
    }

    fn duration(&self) -> EffectDuration {
        self.lifetime.duration()
    }

    fn is_running(&self) -> bool {
        self.lifetime.is_running()
    }

    fn start(&mut self, ctx: &mut EffectContext<'_>) {
        self.resolve_formats(ctx);
        self.even = false;
        self.counter = 0;
        self.gate.open(ctx.now);
        if let Some(rotation) = self.rainbow.as_mut() {
            *rotation = HueRotation::new();
        }
        self.lifetime.begin(ctx.now, true);
        self.tick(ctx);
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.lifetime.is_running() {
            return;
        }
        if self.lifetime.expired(ctx.now) {
            self.stop(ctx);
            return;
        }
        if self.gate.is_ready(ctx.now) {
            self.render(ctx);
            self.gate.schedule(ctx.now, self.mode.refresh());
        }
        if let Some(rotation) = self.rainbow.as_mut() {
            rotation.tick(ctx.now, ctx.target);
        }
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.lifetime.end(ctx.target);
    }
}
