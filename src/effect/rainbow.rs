//! Rainbow cycling over the DEFCON strip
//!
//! The base hue advances one step every 40 ms and the five pixels are spread
//! evenly around the 16-bit hue wheel.

use embassy_time::Duration;

use super::{EFFECT_NAME_RAINBOW, Effect, EffectContext, EffectDuration, Lifetime, TickGate};
use crate::color::hue_wheel;
use crate::{LED_COUNT, RenderTarget};

const HUE_STEP: u16 = 256;
const ROTATION_PERIOD: Duration = Duration::from_millis(40);

/// Hue rotation sub-loop shared by the rainbow and clock effects
#[derive(Debug, Clone, Default)]
pub struct HueRotation {
    hue: u16,
    gate: TickGate,
}

impl HueRotation {
    pub const fn new() -> Self {
        Self {
            hue: 0,
            gate: TickGate::new(),
        }
    }

    /// Base hue of pixel 0
    pub const fn hue(&self) -> u16 {
        self.hue
    }

    /// Render the next step if its period has passed
    #[allow(clippy::cast_possible_truncation)]
    pub fn tick(&mut self, now: embassy_time::Instant, target: &mut dyn RenderTarget) {
        if !self.gate.is_ready(now) {
            return;
        }
        self.hue = self.hue.wrapping_add(HUE_STEP);
        for index in 0..LED_COUNT {
            let offset = (index as u32 * 65_536 / LED_COUNT as u32) as u16;
            target.set_pixel(index, hue_wheel(self.hue.wrapping_add(offset)));
        }
        target.show_pixels();
        self.gate.schedule(now, ROTATION_PERIOD);
    }
}

#[derive(Debug, Clone)]
pub struct RainbowEffect {
    lifetime: Lifetime,
    rotation: HueRotation,
}

impl Default for RainbowEffect {
    fn default() -> Self {
        Self::new()
    }
}

impl RainbowEffect {
    pub fn new() -> Self {
        Self {
            lifetime: Lifetime::new(EFFECT_NAME_RAINBOW, EffectDuration::Infinite),
            rotation: HueRotation::new(),
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

    pub const fn hue(&self) -> u16 {
        self.rotation.hue()
    }
}

impl Effect for RainbowEffect {
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
        self.lifetime.begin(ctx.now, true);
        self.rotation.tick(ctx.now, ctx.target);
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.lifetime.is_running() {
            return;
        }
        if self.lifetime.expired(ctx.now) {
            self.stop(ctx);
            return;
        }
        self.rotation.tick(ctx.now, ctx.target);
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.lifetime.end(ctx.target);
    }
}
