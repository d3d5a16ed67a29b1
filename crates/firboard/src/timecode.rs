//! Zulu clock strings.
//!
//! Parses the `HHMM`, `HH:MM` and `HHMMZ` forms the feed and operators use,
//! normalizes operator keystrokes for the editable cells, and measures how far
//! apart two times of day are.

use std::cmp::Ordering;
use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::flight::ManualField;

/// Minutes in one day.
pub const MINUTES_PER_DAY: u16 = 24 * 60;

/// A valid time of day, stored as minutes since midnight (0..=1439).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClockTime(u16);

impl ClockTime {
    /// 0000.
    pub const MIDNIGHT: Self = Self(0);

    /// Build a time from an hour (0-23) and minute (0-59).
    #[must_use]
    pub fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        (hour < 24 && minute < 60).then_some(Self(hour * 60 + minute))
    }

    /// Minutes since midnight.
    #[must_use]
    pub const fn minutes(self) -> u16 {
        self.0
    }

    /// Hour of day.
    #[must_use]
    pub const fn hour(self) -> u16 {
        self.0 / 60
    }

    /// Minute of hour.
    #[must_use]
    pub const fn minute(self) -> u16 {
        self.0 % 60
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}{:02}", self.hour(), self.minute())
    }
}

fn colon_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Literal pattern, cannot fail to compile
    RE.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})$").expect("valid clock pattern"))
}

fn block_form() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{1,4}$").expect("valid clock pattern"))
}

/// Parse a clock string into a time of day.
///
/// A trailing `Z` zone marker is stripped. `HH:MM` is split on the colon;
/// anything else must be a block of up to four digits, left-padded to `HHMM`.
/// Returns `None` for empty, non-numeric or out-of-range input. Never panics.
///
/// # Examples
///
/// ```
/// use firboard::timecode::parse_clock;
///
/// assert_eq!(parse_clock("1230").map(|t| t.minutes()), Some(750));
/// assert_eq!(parse_clock("12:30Z").map(|t| t.minutes()), Some(750));
/// assert_eq!(parse_clock("930").map(|t| t.minutes()), Some(570));
/// assert!(parse_clock("2460").is_none());
/// ```
#[must_use]
pub fn parse_clock(s: &str) -> Option<ClockTime> {
    let trimmed = s.trim();
    let body = trimmed
        .strip_suffix('Z')
        .or_else(|| trimmed.strip_suffix('z'))
        .unwrap_or(trimmed);

    if let Some(caps) = colon_form().captures(body) {
        let hour = caps[1].parse().ok()?;
        let minute = caps[2].parse().ok()?;
        return ClockTime::from_hm(hour, minute);
    }

    if !block_form().is_match(body) {
        return None;
    }
    let padded = format!("{body:0>4}");
    let hour = padded[..2].parse().ok()?;
    let minute = padded[2..].parse().ok()?;
    ClockTime::from_hm(hour, minute)
}

/// Ordering for parsed clock values where an unknown time sorts after every
/// known one.
#[must_use]
pub fn compare_unknown_last(a: Option<ClockTime>, b: Option<ClockTime>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Distance in minutes between two times of day, taking the short way round
/// midnight. `None` when either side is unknown, which callers treat as "no
/// match".
#[must_use]
pub fn minute_difference(a: Option<ClockTime>, b: Option<ClockTime>) -> Option<u16> {
    let (a, b) = (a?, b?);
    let direct = a.minutes().abs_diff(b.minutes());
    Some(direct.min(MINUTES_PER_DAY - direct))
}

/// Reduce an operator's raw keystrokes to what the cell may hold.
///
/// Only digits and the first decimal point survive. Altitude keeps three
/// characters; mach keeps at most two digits after the point (the integer
/// part is dropped once a point is typed); pilot estimate keeps four.
/// Malformed input is never rejected, only reduced.
#[must_use]
pub fn normalize_manual_entry(field: ManualField, raw: &str) -> String {
    let mut seen_point = false;
    let cleaned: String = raw
        .chars()
        .filter(|c| match c {
            '0'..='9' => true,
            '.' if !seen_point => {
                seen_point = true;
                true
            }
            _ => false,
        })
        .collect();

    match field {
        ManualField::Altitude => cleaned.chars().take(3).collect(),
        ManualField::Mach => match cleaned.split_once('.') {
            Some((_, fraction)) => fraction.chars().take(2).collect(),
            None => cleaned.chars().take(2).collect(),
        },
        ManualField::PilotEstimate => cleaned.chars().take(4).collect(),
    }
}
