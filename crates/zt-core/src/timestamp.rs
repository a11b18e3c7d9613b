//! Parsing of user-supplied timestamps and zone conversions.
//!
//! Instants are always stored in UTC with whole-second precision. Calendar
//! questions (which day, which hour) are answered in the owner's zone.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, SubsecRound, TimeZone, Timelike, Utc};
use chrono_tz::Tz;

use crate::error::TrackerError;
use crate::format::Locale;

/// Local formats accepted besides RFC 3339, tried in order.
const LOCAL_FORMATS: [&str; 4] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Drops sub-second precision.
pub fn whole_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    instant.trunc_subsecs(0)
}

/// Current instant truncated to whole seconds.
pub fn now() -> DateTime<Utc> {
    whole_seconds(Utc::now())
}

/// Parses a timestamp supplied by a caller.
///
/// RFC 3339 values carry their own offset. Values without an offset
/// (`2024-01-01 08:00:00`, `2024-01-01T08:00`) are local to `zone`.
pub fn parse_timestamp(input: &str, zone: Tz) -> Result<DateTime<Utc>, TrackerError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(TrackerError::validation("Zeitpunkt fehlt"));
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(input) {
        return Ok(whole_seconds(parsed.with_timezone(&Utc)));
    }
    let naive = LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .ok_or_else(|| TrackerError::validation(format!("Ungültiger Zeitpunkt: {input}")))?;
    local_to_utc(naive, zone)
        .map(whole_seconds)
        .ok_or_else(|| TrackerError::validation(format!("Zeitpunkt existiert nicht: {input}")))
}

/// Parses an ISO date (`YYYY-MM-DD`).
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d").ok()
}

/// Resolves a local wall-clock time. Ambiguous times (DST fall-back) pick the
/// earlier instant; times inside a DST gap do not exist.
pub fn local_to_utc(naive: NaiveDateTime, zone: Tz) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Converts a local date at midnight to UTC.
///
/// A DST spring-forward gap at midnight is rare but possible; the first valid
/// hour of the day is used instead.
pub fn local_midnight_to_utc(date: NaiveDate, zone: Tz) -> DateTime<Utc> {
    (0..24)
        .filter_map(|hour| NaiveTime::from_hms_opt(hour, 0, 0))
        .find_map(|time| local_to_utc(date.and_time(time), zone))
        .unwrap_or_else(|| Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN)))
}

/// The local calendar date of an instant.
pub fn local_date(instant: DateTime<Utc>, zone: Tz) -> NaiveDate {
    instant.with_timezone(&zone).date_naive()
}

/// The owner's calendar: the zone used for bucketing and the display language.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Calendar {
    pub zone: Tz,
    pub locale: Locale,
}

impl Calendar {
    pub const fn new(zone: Tz, locale: Locale) -> Self {
        Self { zone, locale }
    }

    /// The local date of `now`.
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        local_date(now, self.zone)
    }

    pub fn date_of(&self, instant: DateTime<Utc>) -> NaiveDate {
        local_date(instant, self.zone)
    }

    /// Local hour of day (0-23).
    pub fn hour_of(&self, instant: DateTime<Utc>) -> u32 {
        instant.with_timezone(&self.zone).hour()
    }

    /// Formats an instant in local time with a `strftime` pattern.
    pub fn render(&self, instant: DateTime<Utc>, pattern: &str) -> String {
        instant.with_timezone(&self.zone).format(pattern).to_string()
    }
}

impl Default for Calendar {
    fn default() -> Self {
        Self::new(Tz::UTC, Locale::default())
    }
}
