//! Static text effect
//!
//! Places a string on the display once and holds it.

use super::{EFFECT_NAME_TEXT, Effect, EffectContext, EffectDuration, Lifetime};
use crate::text::{TextAlignment, TextBuffer, copy_truncated, layout};

#[derive(Debug, Clone)]
pub struct TextEffect {
    lifetime: Lifetime,
    text: TextBuffer,
    alignment: TextAlignment,
}

impl TextEffect {
    pub fn new(text: &str, alignment: TextAlignment) -> Self {
        Self {
            lifetime: Lifetime::new(EFFECT_NAME_TEXT, EffectDuration::Infinite),
            text: copy_truncated(text),
            alignment,
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

    /// Replace the text; takes effect on the next start
    pub fn set_text(&mut self, text: &str) {
        self.text = copy_truncated(text);
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_alignment(&mut self, alignment: TextAlignment) {
        self.alignment = alignment;
    }

    pub const fn alignment(&self) -> TextAlignment {
        self.alignment
    }
}

impl Effect for TextEffect {
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
        ctx.target.show_cells(&layout(&self.text, self.alignment));
    }

    fn tick(&mut self, ctx: &mut EffectContext<'_>) {
        if !self.lifetime.is_running() {
            return;
        }
        if self.lifetime.expired(ctx.now) {
            self.stop(ctx);
        }
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.lifetime.end(ctx.target);
    }
}
