//! Equal-tempered pitches for the buzzer

/// Frequencies of octave 8, in Hz
const OCTAVE_8: [f32; 12] = [
    4186.01, 4434.92, 4698.63, 4978.03, 5274.04, 5587.65, 5919.91, 6271.93, 6644.88, 7040.00,
    7458.62, 7902.13,
];

const TOP_OCTAVE: u8 = 8;

/// Pitch class of a note
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Pitch {
    C = 0,
    Cs,
    D,
    Eb,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    Bb,
    B,
}

impl Pitch {
    /// Frequency of this pitch in `octave`, rounded to whole Hz
    ///
    /// Octaves above 8 are clamped to 8.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn frequency(self, octave: u8) -> u16 {
        let shift = TOP_OCTAVE - octave.min(TOP_OCTAVE);
        let hz = OCTAVE_8[self as usize] / f32::from(1u16 << shift);
        libm::roundf(hz) as u16
    }
}
