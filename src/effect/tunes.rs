//! Built-in melodies

use super::Note;
use crate::note::Pitch;

/// The Nokia ringtone, spelling out its slogan
pub const NOKIA_TUNE: [Note; 14] = [
    Note::new(Pitch::E, 5, 8, "      R    "),
    Note::new(Pitch::D, 5, 8, " O    R    "),
    Note::new(Pitch::Fs, 4, 4, " O    R  E "),
    Note::new(Pitch::Gs, 4, 4, " O I  R  EZ"),
    Note::new(Pitch::Cs, 5, 8, " O IA R  EZ"),
    Note::new(Pitch::B, 4, 8, "NO IA RU EZ"),
    Note::new(Pitch::D, 4, 4, "NO IA RULEZ"),
    Note::new(Pitch::E, 4, 4, "NOKIA RULEZ"),
    Note::new(Pitch::B, 4, 8, ""),
    Note::new(Pitch::A, 4, 8, "-"),
    Note::new(Pitch::Cs, 4, 4, "NOKIA RULEZ"),
    Note::new(Pitch::E, 4, 4, "-"),
    Note::new(Pitch::A, 4, 2, "NOKIA RULEZ"),
    Note::rest(4, ""),
];

/// Never gonna give you up
pub const THE_RICK: [Note; 124] = [
    Note::rest(4, ""),
    Note::new(Pitch::B, 4, 8, "WE'RE"),
    Note::new(Pitch::Cs, 5, 8, "NO"),
    Note::new(Pitch::D, 5, 8, "STRANGERS"),
    Note::new(Pitch::D, 5, 8, ""),
    Note::new(Pitch::E, 5, 8, "TO"),
    Note::new(Pitch::Cs, 5, -8, "LOVE"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::A, 4, 2, ""),
    Note::rest(4, "-"),
    Note::rest(8, ""),
    Note::new(Pitch::B, 4, 8, "YOU"),
    Note::new(Pitch::B, 4, 8, "KNOW"),
    Note::new(Pitch::Cs, 5, 8, "THE"),
    Note::new(Pitch::D, 5, 8, "RULES"),
    Note::new(Pitch::B, 4, 4, ""),
    Note::new(Pitch::A, 4, 8, "AND"),
    Note::new(Pitch::A, 5, 8, "SO"),
    Note::rest(8, "DO"),
    Note::new(Pitch::A, 5, 8, "I"),
    Note::new(Pitch::E, 5, -4, ""),
    Note::rest(4, ""),
    Note::new(Pitch::B, 4, 8, "A"),
    Note::new(Pitch::B, 4, 8, "FULL"),
    Note::new(Pitch::Cs, 5, 8, "COMMITMENT'S"),
    Note::new(Pitch::D, 5, 8, ""),
    Note::new(Pitch::B, 4, 8, ""),
    Note::new(Pitch::D, 5, 8, "WHAT"),
    Note::new(Pitch::E, 5, 8, "I'M"),
    Note::rest(8, ""),
    Note::rest(8, ""),
    Note::new(Pitch::Cs, 5, 8, "THINKING"),
    Note::new(Pitch::B, 4, 8, ""),
    Note::new(Pitch::A, 4, -4, "OF"),
    Note::rest(4, "-"),
    Note::rest(8, ""),
    Note::new(Pitch::B, 4, 8, "YOU"),
    Note::new(Pitch::B, 4, 8, "WOULDN'T"),
    Note::new(Pitch::Cs, 5, 8, ""),
    Note::new(Pitch::D, 5, 8, "GET"),
    Note::new(Pitch::B, 4, 8, "THIS"),
    Note::new(Pitch::A, 4, 4, "FROM"),
    Note::new(Pitch::E, 5, 8, "ANY"),
    Note::new(Pitch::E, 5, 8, "OTHER"),
    Note::new(Pitch::E, 5, 8, ""),
    Note::new(Pitch::Fs, 5, 8, "GUY"),
    Note::new(Pitch::E, 5, 4, ""),
    Note::rest(4, "-"),
    Note::new(Pitch::D, 5, 2, "I"),
    Note::new(Pitch::E, 5, 8, "JUST"),
    Note::new(Pitch::Fs, 5, 8, "WANNA"),
    Note::new(Pitch::D, 5, 8, "TELL"),
    Note::new(Pitch::E, 5, 8, "YOU"),
    Note::new(Pitch::E, 5, 8, "HOW"),
    Note::new(Pitch::E, 5, 8, "I'M"),
    Note::new(Pitch::Fs, 5, 8, ""),
    Note::new(Pitch::E, 5, 4, "FEELING"),
    Note::new(Pitch::A, 4, 4, ""),
    Note::rest(2, "-"),
    Note::new(Pitch::B, 4, 8, "GOTTA"),
    Note::new(Pitch::Cs, 5, 8, ""),
    Note::new(Pitch::D, 5, 8, "MAKE"),
    Note::new(Pitch::B, 4, 8, "YOU"),
    Note::rest(8, ""),
    Note::new(Pitch::E, 5, 8, "UNDERSTAND"),
    Note::new(Pitch::Fs, 5, 8, ""),
    Note::new(Pitch::E, 5, -4, ""),
    Note::new(Pitch::A, 4, 16, "NEVER"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 16, "GONNA"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::Fs, 5, -8, "GIVE"),
    Note::new(Pitch::Fs, 5, -8, "YOU"),
    Note::new(Pitch::E, 5, -4, "UP"),
    Note::new(Pitch::A, 4, 16, "NEVER"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 16, "GONNA"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::E, 5, -8, "LET"),
    Note::new(Pitch::E, 5, -8, "YOU"),
    Note::new(Pitch::D, 5, -8, "DOWN"),
    Note::new(Pitch::Cs, 5, 16, ""),
    Note::new(Pitch::B, 4, -8, "-"),
    Note::new(Pitch::A, 4, 16, "NEVER"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 16, "GONNA"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 4, "RUN"),
    Note::new(Pitch::E, 5, 8, "AROUND"),
    Note::new(Pitch::Cs, 5, -8, ""),
    Note::new(Pitch::B, 4, 16, "AND"),
    Note::new(Pitch::A, 4, 8, ""),
    Note::new(Pitch::A, 4, 8, "DESERT"),
    Note::new(Pitch::E, 5, 4, ""),
    Note::new(Pitch::D, 5, 2, "YOU"),
    Note::new(Pitch::A, 4, 16, "NEVER"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 16, "GONNA"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::Fs, 5, -8, "MAKE"),
    Note::new(Pitch::Fs, 5, -8, "YOU"),
    Note::new(Pitch::E, 5, -4, "CRY"),
    Note::new(Pitch::A, 4, 16, "NEVER"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 16, "GONNA"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::A, 5, 4, "SAY"),
    Note::new(Pitch::Cs, 5, 8, "GOODBYE"),
    Note::new(Pitch::D, 5, -8, ""),
    Note::new(Pitch::Cs, 5, 16, ""),
    Note::new(Pitch::B, 4, 8, "-"),
    Note::new(Pitch::A, 4, 16, "NEVER"),
    Note::new(Pitch::B, 4, 16, "-"),
    Note::new(Pitch::D, 5, 16, "GONNA"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::D, 5, 4, "TELL"),
    Note::new(Pitch::E, 5, 8, "A"),
    Note::new(Pitch::Cs, 5, -8, "LIE"),
    Note::new(Pitch::B, 4, 16, ""),
    Note::new(Pitch::A, 4, 4, "AND"),
    Note::new(Pitch::A, 4, 8, ""),
    Note::new(Pitch::E, 5, 4, "HURT"),
    Note::new(Pitch::D, 5, 2, "YOU"),
    Note::rest(4, ""),
];
