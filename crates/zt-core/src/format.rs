//! Human-readable duration formatting.
//!
//! All helpers are pure functions of a second count and are only used at the
//! presentation boundary. Values are truncated, never rounded, except for
//! [`decimal_hours`].

use std::fmt;
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

const SECONDS_PER_HOUR: i64 = 3600;
const SECONDS_PER_MINUTE: i64 = 60;

/// Language used for long durations and weekday names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
}

impl Locale {
    /// String representation used in configuration.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::De => "de",
            Self::En => "en",
        }
    }

    /// Full weekday name.
    pub const fn weekday_name(self, weekday: Weekday) -> &'static str {
        match self {
            Self::De => match weekday {
                Weekday::Mon => "Montag",
                Weekday::Tue => "Dienstag",
                Weekday::Wed => "Mittwoch",
                Weekday::Thu => "Donnerstag",
                Weekday::Fri => "Freitag",
                Weekday::Sat => "Samstag",
                Weekday::Sun => "Sonntag",
            },
            Self::En => match weekday {
                Weekday::Mon => "Monday",
                Weekday::Tue => "Tuesday",
                Weekday::Wed => "Wednesday",
                Weekday::Thu => "Thursday",
                Weekday::Fri => "Friday",
                Weekday::Sat => "Saturday",
                Weekday::Sun => "Sunday",
            },
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "de" => Ok(Self::De),
            "en" => Ok(Self::En),
            other => Err(format!("unsupported locale: {other}")),
        }
    }
}

fn split(seconds: i64) -> (i64, i64, i64) {
    let seconds = seconds.max(0);
    (
        seconds / SECONDS_PER_HOUR,
        (seconds % SECONDS_PER_HOUR) / SECONDS_PER_MINUTE,
        seconds % SECONDS_PER_MINUTE,
    )
}

/// Formats seconds as `HH:MM`. Hours are not wrapped at 24.
/// Negative values format as `00:00`.
pub fn hh_mm(seconds: i64) -> String {
    let (hours, minutes, _) = split(seconds);
    format!("{hours:02}:{minutes:02}")
}

/// Formats seconds as `HH:MM:SS`.
pub fn hh_mm_ss(seconds: i64) -> String {
    let (hours, minutes, secs) = split(seconds);
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// Formats seconds as decimal hours with two places, e.g. `5400` → `1.50`.
///
/// Rounds half up on the third decimal using integer arithmetic.
pub fn decimal_hours(seconds: i64) -> String {
    let seconds = seconds.max(0);
    let centi_hours = (seconds * 100 + SECONDS_PER_HOUR / 2) / SECONDS_PER_HOUR;
    format!("{}.{:02}", centi_hours / 100, centi_hours % 100)
}

/// Formats seconds as a long localized string.
///
/// German: `2 Std. 5 Min.`, `45 Min.`, `0 Stunden`.
/// English: `2h 5m`, `45m`, `0h`.
pub fn long(seconds: i64, locale: Locale) -> String {
    let (hours, minutes, _) = split(seconds);
    match locale {
        Locale::De => {
            if seconds <= 0 {
                "0 Stunden".to_string()
            } else if hours > 0 {
                format!("{hours} Std. {minutes} Min.")
            } else {
                format!("{minutes} Min.")
            }
        }
        Locale::En => {
            if seconds <= 0 {
                "0h".to_string()
            } else if hours > 0 {
                format!("{hours}h {minutes}m")
            } else {
                format!("{minutes}m")
            }
        }
    }
}
