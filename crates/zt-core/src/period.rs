//! Period resolution.
//!
//! Maps a period tag (plus explicit bounds for `custom`) to a concrete inclusive
//! date range on the owner's calendar. Weeks run Monday to Sunday. Resolution
//! never fails: unknown tags fall back to `today`, and an incomplete custom range
//! falls back to the last 30 days.

use std::fmt;

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::timestamp::{local_midnight_to_utc, parse_date};

/// Length of the fallback window for an incomplete custom range.
const CUSTOM_FALLBACK_DAYS: i64 = 30;

/// Named reporting period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodKind {
    #[default]
    Today,
    Yesterday,
    Week,
    LastWeek,
    Month,
    LastMonth,
    Year,
    Custom,
}

impl PeriodKind {
    /// Parses a period tag leniently. Unknown tags become [`PeriodKind::Today`].
    pub fn parse(tag: &str) -> Self {
        match tag.trim().to_ascii_lowercase().as_str() {
            "yesterday" => Self::Yesterday,
            "week" => Self::Week,
            "last_week" => Self::LastWeek,
            "month" => Self::Month,
            "last_month" => Self::LastMonth,
            "year" => Self::Year,
            "custom" => Self::Custom,
            "today" => Self::Today,
            other => {
                tracing::debug!(tag = other, "unknown period tag, using today");
                Self::Today
            }
        }
    }

    /// String representation, as echoed in report output.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Today => "today",
            Self::Yesterday => "yesterday",
            Self::Week => "week",
            Self::LastWeek => "last_week",
            Self::Month => "month",
            Self::LastMonth => "last_month",
            Self::Year => "year",
            Self::Custom => "custom",
        }
    }
}

impl fmt::Display for PeriodKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A period tag with optional explicit bounds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodSelection {
    pub kind: PeriodKind,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl PeriodSelection {
    /// A selection without explicit bounds.
    pub const fn new(kind: PeriodKind) -> Self {
        Self {
            kind,
            from: None,
            to: None,
        }
    }

    /// A `custom` selection over the given dates.
    pub const fn custom(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            kind: PeriodKind::Custom,
            from: Some(from),
            to: Some(to),
        }
    }

    /// Builds a selection from raw query values.
    ///
    /// `default_kind` applies when no tag is given. Unparseable dates count as
    /// missing.
    pub fn from_query(
        period: Option<&str>,
        date_from: Option<&str>,
        date_to: Option<&str>,
        default_kind: PeriodKind,
    ) -> Self {
        let kind = period
            .filter(|tag| !tag.trim().is_empty())
            .map_or(default_kind, PeriodKind::parse);
        Self {
            kind,
            from: date_from.and_then(parse_date),
            to: date_to.and_then(parse_date),
        }
    }

    /// Resolves to a concrete inclusive range relative to `today`.
    pub fn resolve(&self, today: NaiveDate) -> DateRange {
        match self.kind {
            PeriodKind::Today => DateRange::single(today),
            PeriodKind::Yesterday => DateRange::single(today - Duration::days(1)),
            PeriodKind::Week => week_of(today),
            PeriodKind::LastWeek => week_of(today - Duration::days(7)),
            PeriodKind::Month => month_of(today),
            PeriodKind::LastMonth => month_of(first_of_month(today) - Duration::days(1)),
            PeriodKind::Year => year_of(today),
            PeriodKind::Custom => match (self.from, self.to) {
                (Some(from), Some(to)) => DateRange::new(from, to),
                _ => DateRange {
                    from: today - Duration::days(CUSTOM_FALLBACK_DAYS),
                    to: today,
                },
            },
        }
    }
}

/// An inclusive range of calendar dates. `from <= to` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    /// Creates a range, swapping reversed bounds.
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        if from <= to {
            Self { from, to }
        } else {
            Self { from: to, to: from }
        }
    }

    /// A range covering a single day.
    pub const fn single(day: NaiveDate) -> Self {
        Self { from: day, to: day }
    }

    /// Whether `day` lies inside the range.
    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    /// Converts to a half-open UTC interval: local midnight of `from` up to local
    /// midnight of the day after `to`.
    pub fn to_utc(&self, zone: Tz) -> UtcRange {
        let end_day = self.to.succ_opt().unwrap_or(self.to);
        UtcRange {
            start: local_midnight_to_utc(self.from, zone),
            end: local_midnight_to_utc(end_day, zone),
        }
    }
}

/// A half-open interval `[start, end)` of instants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UtcRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl UtcRange {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

fn week_of(day: NaiveDate) -> DateRange {
    let monday = day - Duration::days(i64::from(day.weekday().num_days_from_monday()));
    DateRange {
        from: monday,
        to: monday + Duration::days(6),
    }
}

fn first_of_month(day: NaiveDate) -> NaiveDate {
    day.with_day(1).unwrap_or(day)
}

fn month_of(day: NaiveDate) -> DateRange {
    let first = first_of_month(day);
    let next_first = if first.month() == 12 {
        NaiveDate::from_ymd_opt(first.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(first.year(), first.month() + 1, 1)
    };
    let last = next_first.map_or(first, |next| next - Duration::days(1));
    DateRange {
        from: first,
        to: last,
    }
}

fn year_of(day: NaiveDate) -> DateRange {
    let from = day.with_ordinal(1).unwrap_or(day);
    let to = NaiveDate::from_ymd_opt(day.year(), 12, 31).unwrap_or(day);
    DateRange { from, to }
}
