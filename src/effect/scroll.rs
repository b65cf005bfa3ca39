//! Scrolling text effect
//!
//! A 12 cell window slides over the text padded with a display width of
//! blanks on both sides, one cell per `speed`. With an infinite duration the
//! scroll repeats; otherwise the effect holds the blank last frame for the
//! duration and stops.

use embassy_time::Duration;

use super::{EFFECT_NAME_SCROLL_TEXT, Effect, EffectContext, EffectDuration, Lifetime, TickGate};
use crate::text::{DISPLAY_WIDTH, TextBuffer, copy_truncated, scroll_window};

const DEFAULT_SCROLL_SPEED: Duration = Duration::from_millis(200);

#[derive(Debug, Clone)]
pub struct ScrollTextEffect {
    lifetime: Lifetime,
    text: TextBuffer,
    speed: Duration,
    gate: TickGate,
    offset: usize,
}

impl ScrollTextEffect {
    pub fn new(text: &str) -> Self {
        Self {
            lifetime: Lifetime::new(EFFECT_NAME_SCROLL_TEXT, EffectDuration::Infinite),
            text: copy_truncated(text),
            speed: DEFAULT_SCROLL_SPEED,
            gate: TickGate::new(),
            offset: 0,
        }
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
    pub fn with_speed(mut self, speed: Duration) -> Self {
        self.speed = speed;
        self
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = copy_truncated(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_speed(&mut self, speed: Duration) {
        self.speed = speed;
    }

    pub const fn speed(&self) -> Duration {
        self.speed
    }

    /// Offset of the last window position
    fn last_offset(&self) -> usize {
        self.text.len() + DISPLAY_WIDTH
    }

    fn render_step(&mut self, ctx: &mut EffectContext<'_>) {
        ctx.target.show_cells(&scroll_window(&self.text, self.offset));
        self.offset += 1;
        self.gate.schedule(ctx.now, self.speed);

        if self.offset > self.last_offset() && !self.lifetime.duration().is_infinite() {
            self.lifetime.finish_content(ctx.now);
        }
    }
}

impl Effect for ScrollTextEffect {
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
        self.lifetime.begin(ctx.now, false);
        self.offset = 0;
        self.render_step(ctx);
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.lifetime.is_running() {
            return;
        }
        if self.lifetime.expired(ctx.now) {
            self.stop(ctx);
            return;
        }
        if !self.gate.is_ready(ctx.now) {
            return;
        }

        if self.offset > self.last_offset() {
            if !self.lifetime.duration().is_infinite() {
                // Holding the last frame until the duration runs out
                return;
            }
            self.lifetime.restart(ctx.now);
            self.offset = 0;
        }
        self.render_step(ctx);
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.lifetime.end(ctx.target);
    }
}
