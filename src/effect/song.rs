//! Melody player with optional lyrics
//!
//! Every note may carry a lyric line: an empty lyric leaves the display as
//! it is, `"-"` clears it and anything else is shown centered.

use embassy_time::Duration;

use super::{
    EFFECT_NAME_NOKIA_TUNE, EFFECT_NAME_SONG, EFFECT_NAME_THE_RICK, Effect, EffectContext,
    EffectDuration, Lifetime, NOKIA_TUNE, THE_RICK, TickGate,
};
use crate::note::Pitch;
use crate::text::{TextAlignment, layout};

const DEFAULT_TEMPO: u16 = 114;
const NOKIA_TEMPO: u16 = 180;
const THE_RICK_TEMPO: u16 = 114;

/// Four beats of one minute each, in milliseconds
const WHOLE_NOTE_BEATS_MS: u64 = 60_000 * 4;

const CLEAR_LYRIC: &str = "-";

/// One step of a melody
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Note {
    /// `None` is a rest
    pub pitch: Option<Pitch>,
    pub octave: u8,
    /// Fraction of a whole note; negative means dotted
    pub divisor: i16,
    pub lyric: &'static str,
}

impl Note {
    pub const fn new(pitch: Pitch, octave: u8, divisor: i16, lyric: &'static str) -> Self {
        Self {
            pitch: Some(pitch),
            octave,
            divisor,
            lyric,
        }
    }

    pub const fn rest(divisor: i16, lyric: &'static str) -> Self {
        Self {
            pitch: None,
            octave: 0,
            divisor,
            lyric,
        }
    }
}

/// Length of a note of `divisor` given the length of a whole note
///
/// A negative divisor is a dotted note, half again as long. Zero yields a
/// zero-length step.
pub fn note_duration(whole_note: Duration, divisor: i16) -> Duration {
    let whole = whole_note.as_millis();
    let millis = match divisor {
        0 => 0,
        d if d > 0 => whole / u64::from(d.unsigned_abs()),
        d => whole / u64::from(d.unsigned_abs()) * 3 / 2,
    };
    Duration::from_millis(millis)
}

fn whole_note_for(tempo: u16) -> Duration {
    Duration::from_millis(WHOLE_NOTE_BEATS_MS / u64::from(tempo.max(1)))
}

#[derive(Debug, Clone)]
pub struct SongEffect {
    lifetime: Lifetime,
    song: &'static [Note],
    tempo: u16,
    whole_note: Duration,
    step: usize,
    gate: TickGate,
    locked: bool,
}

impl SongEffect {
    pub fn new(song: &'static [Note]) -> Self {
        Self {
            lifetime: Lifetime::new(EFFECT_NAME_SONG, EffectDuration::Infinite),
            song,
            tempo: DEFAULT_TEMPO,
            whole_note: whole_note_for(DEFAULT_TEMPO),
            step: 0,
            gate: TickGate::new(),
            locked: false,
        }
    }

    /// "Nokia Tune" at 180 bpm
    pub fn nokia_tune() -> Self {
        Self::new(&NOKIA_TUNE)
            .with_tempo(NOKIA_TEMPO)
            .with_name(EFFECT_NAME_NOKIA_TUNE)
            .locked()
    }

    /// "The Rick" at 114 bpm
    pub fn the_rick() -> Self {
        Self::new(&THE_RICK)
            .with_tempo(THE_RICK_TEMPO)
            .with_name(EFFECT_NAME_THE_RICK)
            .locked()
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
    pub fn with_tempo(mut self, tempo: u16) -> Self {
        self.tempo = tempo;
        self.whole_note = whole_note_for(tempo);
        self
    }

    #[must_use]
    fn locked(mut self) -> Self {
        self.locked = true;
        self
    }

    /// Replace the melody; refused for the built-in songs
    pub fn set_song(&mut self, song: &'static [Note]) -> bool {
        if self.locked {
            return false;
        }
        self.song = song;
        true
    }

    /// Change the tempo in beats per minute; refused for the built-in songs
    pub fn set_tempo(&mut self, tempo: u16) -> bool {
        if self.locked {
            return false;
        }
        self.tempo = tempo;
        self.whole_note = whole_note_for(tempo);
        true
    }

    pub const fn tempo(&self) -> u16 {
        self.tempo
    }

    pub const fn whole_note(&self) -> Duration {
        self.whole_note
    }

    pub const fn song(&self) -> &'static [Note] {
        self.song
    }

    /// Index of the next note to play
    pub const fn step(&self) -> usize {
        self.step
    }

    fn play(&mut self, note: &Note, ctx: &mut EffectContext<'_>) {
        match note.pitch {
            Some(pitch) => ctx.target.play_note(pitch, note.octave),
            None => ctx.target.silence(),
        }

        match note.lyric {
            "" => {}
            CLEAR_LYRIC => ctx.target.clear_display(),
            lyric => ctx.target.show_cells(&layout(lyric, TextAlignment::Center)),
        }

        self.gate.schedule(ctx.now, note_duration(self.whole_note, note.divisor));
    }
}

impl Effect for SongEffect {
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
        self.step = 0;
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

        let Some(note) = self.song.get(self.step).copied() else {
            ctx.target.silence();
            self.lifetime.finish_content(ctx.now);
            self.lifetime.halt();
            return;
        };
        self.play(&note, ctx);
        self.step += 1;
    }

    fn stop(&mut self, ctx: &mut EffectContext<'_>) {
        self.lifetime.end(ctx.target);
    }
}
