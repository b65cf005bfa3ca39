//! Wall-clock time for the clock effects
//!
//! The device has no battery-backed clock. The host syncs a [`TimeContext`]
//! from NTP (or anything else) and the context extrapolates local time from
//! the monotonic tick afterwards.

mod calendar;
mod format;

use embassy_time::Instant;

pub use calendar::{DateTime, civil_from_days, days_from_civil};
pub use format::{format_time, odd_time_format};

/// Source of local wall-clock time
pub trait WallClock {
    /// Local time at `now`, or `None` while time is unknown
    fn local_time(&self, now: Instant) -> Option<DateTime>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SyncPoint {
    unix: i64,
    at: Instant,
}

/// Explicit time-of-day context
///
/// Created once at startup, synced by the network layer, and lent to effects
/// through the effect context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeContext {
    utc_offset: i32,
    sync: Option<SyncPoint>,
}

impl TimeContext {
    pub const fn new() -> Self {
        Self {
            utc_offset: 0,
            sync: None,
        }
    }

    /// Set the local offset from UTC in seconds
    #[must_use]
    pub const fn with_utc_offset(mut self, seconds: i32) -> Self {
        self.utc_offset = seconds;
        self
    }

    pub fn set_utc_offset(&mut self, seconds: i32) {
        self.utc_offset = seconds;
    }

    pub const fn utc_offset(&self) -> i32 {
        self.utc_offset
    }

    /// Record that the UTC time was `unix` seconds at `now`
    pub fn sync(&mut self, unix: i64, now: Instant) {
        self.sync = Some(SyncPoint { unix, at: now });
    }

    pub const fn is_synced(&self) -> bool {
        self.sync.is_some()
    }

    /// Forget the sync point
    pub fn invalidate(&mut self) {
        self.sync = None;
    }
}

impl WallClock for TimeContext {
    #[allow(clippy::cast_possible_wrap)]
    fn local_time(&self, now: Instant) -> Option<DateTime> {
        let sync = self.sync?;
        let elapsed_ms = now.as_millis() as i64 - sync.at.as_millis() as i64;
        let unix = sync.unix + elapsed_ms.div_euclid(1000) + i64::from(self.utc_offset);
        Some(DateTime::from_unix(unix))
    }
}

/// Parse a UTC offset into seconds east of UTC
///
/// Accepts `+HH:MM`, `+HHMM`, `+HH` and the standard-time part of a POSIX
/// `TZ` value such as `CET-1CEST,M3.5.0,M10.5.0/3` or `EST5EDT`. POSIX
/// offsets count west of UTC, so their sign is flipped. Daylight saving
/// rules are ignored.
pub fn parse_utc_offset(value: &str) -> Option<i32> {
    let value = value.trim();
    match value.as_bytes().first()? {
        b'+' | b'-' => parse_signed_offset(value, false),
        b'<' => {
            let end = value.find('>')?;
            parse_signed_offset(&value[end + 1..], true)
        }
        ch if ch.is_ascii_alphabetic() => {
            let start = value.find(|c: char| !c.is_ascii_alphabetic())?;
            parse_signed_offset(&value[start..], true)
        }
        _ => None,
    }
}

fn parse_signed_offset(value: &str, posix: bool) -> Option<i32> {
    let (negative, rest) = match value.as_bytes().first()? {
        b'-' => (true, &value[1..]),
        b'+' => (false, &value[1..]),
        _ => (false, value),
    };
    let end = rest
        .find(|c: char| !(c.is_ascii_digit() || c == ':'))
        .unwrap_or(rest.len());
    let digits = &rest[..end];

    let (hours, minutes) = if let Some((hours, minutes)) = digits.split_once(':') {
        let minutes = minutes.split(':').next().unwrap_or("0");
        (hours.parse::<i32>().ok()?, minutes.parse::<i32>().ok()?)
    } else if digits.len() == 4 && !posix {
        (digits[..2].parse().ok()?, digits[2..].parse().ok()?)
    } else {
        (digits.parse::<i32>().ok()?, 0)
    };
    if hours > 24 || minutes > 59 {
        return None;
    }

    let seconds = hours * 3600 + minutes * 60;
    let east = if negative { -seconds } else { seconds };
    Some(if posix { -east } else { east })
}
