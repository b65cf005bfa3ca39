//! Seconds-until-a-date countdown
//!
//! The remaining seconds are computed once at start and scrolled as text.

use core::fmt::Write as _;

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{EFFECT_NAME_XMAS_SECONDS, Effect, EffectContext, EffectDuration, ScrollTextEffect};
use crate::clock::DateTime;
use crate::text::TextBuffer;

const CHRISTMAS_MONTH: u8 = 12;
const CHRISTMAS_DAY: u8 = 25;
const COUNTDOWN_SUFFIX: &str = " Seconds until XMAS...";
const TIME_UNAVAILABLE: &str = "Failed to obtain time";

#[derive(Debug, Clone)]
pub struct CountdownEffect {
    scroll: ScrollTextEffect,
    month: u8,
    day: u8,
}

impl CountdownEffect {
    /// Countdown to 00:00 on `month`/`day` local time
    pub fn new(month: u8, day: u8) -> Self {
        Self {
            scroll: ScrollTextEffect::new("").with_name(EFFECT_NAME_XMAS_SECONDS),
            month,
            day,
        }
    }

    /// Countdown to December 25
    pub fn christmas() -> Self {
        Self::new(CHRISTMAS_MONTH, CHRISTMAS_DAY)
    }

    #[must_use]
    pub fn with_name(mut self, name: &str) -> Self {
        self.scroll = self.scroll.with_name(name);
        self
    }

    #[must_use]
    pub fn with_duration(mut self, duration: EffectDuration) -> Self {
        self.scroll = self.scroll.with_duration(duration);
        self
    }

    #[must_use]
    pub fn with_speed(mut self, speed: Duration) -> Self {
        self.scroll = self.scroll.with_speed(speed);
        self
    }

    /// Text of the last run
    pub fn text(&self) -> &str {
        self.scroll.text()
    }

    /// Whole seconds from `local` to the next target date
    ///
    /// On the target day itself the countdown runs to next year's date.
    pub fn seconds_until(&self, local: &DateTime) -> i64 {
        let year = if (local.month, local.day) >= (self.month, self.day) {
            local.year + 1
        } else {
            local.year
        };
        DateTime::date(year, self.month, self.day).to_unix() - local.to_unix()
    }
}

impl Effect for CountdownEffect {
    fn name(&self) -> &str {
        self.scroll.name()
    }

    fn duration(&self) -> EffectDuration {
        self.scroll.duration()
    }

    fn is_running(&self) -> bool {
        self.scroll.is_running()
    }

    fn start(&mut self, ctx: &mut EffectContext<'_>) {
        let Some(local) = ctx.clock.local_time(ctx.now) else {
            #[cfg(feature = "esp32-log")]
            println!("[CountdownEffect.start] failed to obtain time");
            self.scroll.set_text(TIME_UNAVAILABLE);
            return;
        };

        let mut text = TextBuffer::new();
        let _ = write!(text, "{}{}", self.seconds_until(&local), COUNTDOWN_SUFFIX);
        self.scroll.set_text(&text);
        self.scroll.start(ctx);
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        self.scroll.tick(ctx);
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.scroll.stop(ctx);
    }
}
