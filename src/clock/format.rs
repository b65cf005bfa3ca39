//! `strftime` subset for the clock effects

use core::fmt::Write as _;

use heapless::String;

use super::DateTime;

const WEEKDAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// Expand `format` for `time`
///
/// Supports `%Y %y %m %d %e %H %I %M %S %p %j %a %A %b %B %%`. Unknown
/// specifiers are copied as written. Output past `N` bytes is dropped.
pub fn format_time<const N: usize>(time: &DateTime, format: &str) -> String<N> {
    let mut out = String::new();
    let mut chars = format.chars();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            let _ = out.push(ch);
            continue;
        }
        let Some(spec) = chars.next() else {
            let _ = out.push('%');
            break;
        };
        let _ = write_spec(&mut out, time, spec);
    }
    out
}

fn write_spec<const N: usize>(out: &mut String<N>, time: &DateTime, spec: char) -> core::fmt::Result {
    let weekday = usize::from(time.weekday());
    let month = usize::from(time.month.clamp(1, 12) - 1);
    match spec {
        'Y' => write!(out, "{}", time.year),
        'y' => write!(out, "{:02}", time.year.rem_euclid(100)),
        'm' => write!(out, "{:02}", time.month),
        'd' => write!(out, "{:02}", time.day),
        'e' => write!(out, "{:2}", time.day),
        'H' => write!(out, "{:02}", time.hour),
        'I' => write!(out, "{:02}", time.hour12()),
        'M' => write!(out, "{:02}", time.minute),
        'S' => write!(out, "{:02}", time.second),
        'p' => out.write_str(if time.hour < 12 { "AM" } else { "PM" }),
        'j' => write!(out, "{:03}", time.day_of_year()),
        'a' => out.write_str(&WEEKDAYS[weekday][..3]),
        'A' => out.write_str(WEEKDAYS[weekday]),
        'b' => out.write_str(&MONTHS[month][..3]),
        'B' => out.write_str(MONTHS[month]),
        '%' => out.write_char('%'),
        other => {
            out.write_char('%')?;
            out.write_char(other)
        }
    }
}

/// Blink variant of a time format
///
/// Every character that is neither `%` nor a letter becomes `.`, so
/// separators alternate with dots between refreshes.
pub fn odd_time_format<const N: usize>(format: &str) -> String<N> {
    let mut out = String::new();
    for ch in format.chars() {
        let mapped = if ch == '%' || ch.is_alphabetic() { ch } else { '.' };
        if out.push(mapped).is_err() {
            break;
        }
    }
    out
}
