//! Missile launch code solve
//!
//! Unsolved cells flicker through random glyphs while a buzzer chatters.
//! At random intervals one more cell locks in, in a fixed or shuffled
//! order. When every cell is solved the code blinks six times, then
//! `LAUNCHING...` blinks six times, and the effect stops. A finite
//! duration never cuts the sequence short.

use embassy_time::Duration;
use heapless::Vec;
use rand::Rng;
use rand::seq::SliceRandom;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use super::{EFFECT_NAME_CODE_SOLVE, Effect, EffectContext, EffectDuration, Lifetime, TickGate};
use crate::color::rgb_from_u32;
use crate::defcon::{DefconLevel, show_level};
use crate::note::Pitch;
use crate::text::{Cells, DISPLAY_WIDTH, TextAlignment, layout};

const MOVIE_CODE: &[u8; DISPLAY_WIDTH] = b"CPE 1704 TKS";
const MESSAGE_CODE: &[u8; DISPLAY_WIDTH] = b"LOLZ FOR YOU";
const MOVIE_ORDER: [u8; 10] = [7, 1, 4, 6, 11, 2, 5, 0, 10, 9];
const MOVIE_PRESOLVED: [usize; 2] = [3, 8];
const LAUNCHING: &str = "LAUNCHING...";

const REDRAW_PERIOD: Duration = Duration::from_millis(100);
const REVEAL_HOLD: Duration = Duration::from_millis(500);
const BLINK_PERIOD: Duration = Duration::from_millis(800);
const SOLVE_MIN_MS: u64 = 1300;
const SOLVE_MAX_MS: u64 = 2500;
const CHATTER_MIN_HZ: u16 = 90;
const CHATTER_MAX_HZ: u16 = 250;
const BLINK_STEPS: usize = 6;

/// Digits, letters and a space
const GLYPH_COUNT: u8 = 38;

const ALERT_OCTAVE: u8 = 5;
const LAUNCH_COLOR: u32 = 0xFF_00_00;

/// Which code is solved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSolveVariant {
    /// `CPE 1704 TKS` in the order seen in the film
    Movie,
    /// A fresh random code every run
    Random,
    /// `LOLZ FOR YOU`
    Message,
}

#[derive(Debug, Clone)]
pub struct CodeSolveEffect {
    lifetime: Lifetime,
    variant: CodeSolveVariant,
    solution: Cells,
    revealed: [bool; DISPLAY_WIDTH],
    order: Vec<u8, DISPLAY_WIDTH>,
    step: usize,
    gate: TickGate,
    solve_gate: TickGate,
    defcon: Option<DefconLevel>,
}

impl CodeSolveEffect {
    pub fn new(variant: CodeSolveVariant) -> Self {
        Self {
            lifetime: Lifetime::new(EFFECT_NAME_CODE_SOLVE, EffectDuration::Infinite),
            variant,
            solution: [b' '; DISPLAY_WIDTH],
            revealed: [false; DISPLAY_WIDTH],
            order: Vec::new(),
            step: 0,
            gate: TickGate::new(),
            solve_gate: TickGate::new(),
            defcon: None,
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

    /// Takes effect on the next start
    pub fn set_variant(&mut self, variant: CodeSolveVariant) {
        self.variant = variant;
    }

    pub const fn variant(&self) -> CodeSolveVariant {
        self.variant
    }

    /// Code being solved in the current run
    pub fn solution(&self) -> &str {
        core::str::from_utf8(&self.solution).unwrap_or("")
    }

    /// Reveal order of the current run
    pub fn order(&self) -> &[u8] {
        &self.order
    }

    pub const fn revealed(&self) -> &[bool; DISPLAY_WIDTH] {
        &self.revealed
    }

    /// Reveals done so far, then blink steps
    pub const fn step(&self) -> usize {
        self.step
    }

    #[allow(clippy::cast_possible_truncation)]
    fn prepare(&mut self, rng: &mut impl Rng) {
        self.revealed = [false; DISPLAY_WIDTH];
        self.order.clear();
        match self.variant {
            CodeSolveVariant::Movie => {
                self.solution = *MOVIE_CODE;
                for index in MOVIE_PRESOLVED {
                    self.revealed[index] = true;
                }
                let _ = self.order.extend_from_slice(&MOVIE_ORDER);
            }
            CodeSolveVariant::Random | CodeSolveVariant::Message => {
                self.solution = if self.variant == CodeSolveVariant::Message {
                    *MESSAGE_CODE
                } else {
                    let mut code = [b' '; DISPLAY_WIDTH];
                    for cell in &mut code {
                        *cell = random_glyph(rng);
                    }
                    code
                };
                for index in 0..DISPLAY_WIDTH {
                    let _ = self.order.push(index as u8);
                }
                self.order.shuffle(rng);
            }
        }
    }

    fn schedule_reveal(&mut self, ctx: &mut EffectContext<'_>) {
        let delay = ctx.rng.gen_range(SOLVE_MIN_MS..SOLVE_MAX_MS);
        self.solve_gate.schedule(ctx.now, Duration::from_millis(delay));
    }

    fn draw_scramble(&mut self, ctx: &mut EffectContext<'_>) {
        let mut cells = self.solution;
        for (cell, revealed) in cells.iter_mut().zip(self.revealed) {
            if !revealed {
                *cell = random_glyph(ctx.rng);
            }
        }
        let tone = ctx.rng.gen_range(CHATTER_MIN_HZ..CHATTER_MAX_HZ);
        ctx.target.play_tone(tone);

        let level = DefconLevel::from_progress(self.step, self.order.len());
        if self.defcon != Some(level) {
            self.defcon = Some(level);
            show_level(ctx.target, level, ctx.palette);
        }
        ctx.target.show_cells(&cells);
    }

    fn draw_solved(&self, ctx: &mut EffectContext<'_>) {
        let mut cells = self.solution;
        for (cell, revealed) in cells.iter_mut().zip(self.revealed) {
            if !revealed {
                *cell = b'*';
            }
        }
        ctx.target.play_note(Pitch::G, ALERT_OCTAVE);
        ctx.target.show_cells(&cells);
    }

    fn draw_blink(&self, ctx: &mut EffectContext<'_>, launching: bool) {
        if self.step % 2 == 1 {
            ctx.target.silence();
            ctx.target.clear_display();
            ctx.target.clear_pixels();
            return;
        }
        ctx.target.play_note(Pitch::G, ALERT_OCTAVE);
        if launching {
            ctx.target.show_cells(&layout(LAUNCHING, TextAlignment::Left));
            ctx.target.fill_pixels(rgb_from_u32(LAUNCH_COLOR));
        } else {
            ctx.target.show_cells(&self.solution);
            show_level(ctx.target, DefconLevel::One, ctx.palette);
        }
    }
}

fn random_glyph(rng: &mut impl Rng) -> u8 {
    match rng.gen_range(0..GLYPH_COUNT) {
        digit @ 0..10 => b'0' + digit,
        letter @ 10..36 => b'A' + letter - 10,
        _ => b' ',
    }
}

impl Effect for CodeSolveEffect {
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
        self.prepare(ctx.rng);
        self.step = 0;
        self.defcon = None;
        self.schedule_reveal(ctx);
        self.gate.open(ctx.now);
        self.lifetime.begin(ctx.now, false);
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
        if !self.gate.is_ready(ctx.now) {
            return;
        }
        self.gate.schedule(ctx.now, REDRAW_PERIOD);

        let total = self.order.len();
        if self.step < total {
            self.draw_scramble(ctx);

            if self.solve_gate.is_ready(ctx.now) {
                let index = usize::from(self.order[self.step]);
                self.revealed[index] = true;
                self.schedule_reveal(ctx);
                self.draw_solved(ctx);
                self.gate.schedule(ctx.now, REVEAL_HOLD);
                self.step += 1;
            }
        }

        if self.step >= total {
            if self.step < total + BLINK_STEPS {
                self.draw_blink(ctx, false);
                self.gate.schedule(ctx.now, BLINK_PERIOD);
            } else if self.step < total + 2 * BLINK_STEPS {
                self.draw_blink(ctx, true);
                self.gate.schedule(ctx.now, BLINK_PERIOD);
            } else {
                #[cfg(feature = "esp32-log")]
                println!("[CodeSolveEffect.tick] launch sequence complete");
                self.lifetime.finish_content(ctx.now);
                self.stop(ctx);
                return;
            }
            self.step += 1;
        }
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.lifetime.end(ctx.target);
    }
}
