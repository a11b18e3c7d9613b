//! Shared utilities for CLI commands.

use std::sync::LazyLock;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use regex::Regex;
use zt_core::timestamp::parse_timestamp;
use zt_core::{EntryId, PeriodKind, PeriodSelection, ProjectId, Scope, TaskId};

use crate::cli::PeriodArgs;

/// Pre-compiled regex for relative time parsing.
static RELATIVE_TIME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+)\s+(minute|hour|day|week)s?\s+ago$").expect("valid relative time regex")
});

/// Conservative bounds for relative time parsing (~1000 years in minutes).
const MAX_RELATIVE_MINUTES: i64 = 1000 * 365 * 24 * 60;

/// Parses a point in time given on the command line.
///
/// Supports:
/// - `now`
/// - Relative: "2 hours ago", "30 minutes ago", "1 day ago", "1 week ago"
/// - RFC 3339, or a local time in `zone` such as "2024-03-04 09:00"
pub fn parse_time(input: &str, zone: Tz, now: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let input = input.trim();
    if input.eq_ignore_ascii_case("now") {
        return Ok(now);
    }

    let Some(caps) = RELATIVE_TIME_RE.captures(input) else {
        return parse_timestamp(input, zone).with_context(|| {
            format!("invalid time {input:?}; use e.g. '2024-03-04 09:00' or '2 hours ago'")
        });
    };

    let n: i64 = caps[1]
        .parse()
        .context("failed to parse number in relative time")?;

    let (max_for_unit, minutes_per_unit) = match &caps[2] {
        "minute" => (MAX_RELATIVE_MINUTES, 1),
        "hour" => (MAX_RELATIVE_MINUTES / 60, 60),
        "day" => (MAX_RELATIVE_MINUTES / (60 * 24), 60 * 24),
        "week" => (MAX_RELATIVE_MINUTES / (60 * 24 * 7), 60 * 24 * 7),
        unit => anyhow::bail!("Unknown time unit: {unit}"),
    };

    if n > max_for_unit {
        anyhow::bail!("Relative time value too large: {n} {}", &caps[2]);
    }

    Ok(now - Duration::minutes(n * minutes_per_unit))
}

pub fn entry_id(raw: &str) -> Result<EntryId> {
    EntryId::new(raw).context("invalid entry id")
}

pub fn project_id(raw: Option<&str>) -> Result<Option<ProjectId>> {
    raw.map(|id| ProjectId::new(id).context("invalid project id"))
        .transpose()
}

pub fn task_id(raw: Option<&str>) -> Result<Option<TaskId>> {
    raw.map(|id| TaskId::new(id).context("invalid task id"))
        .transpose()
}

/// Resolves period arguments, using `default_kind` when no period is given.
pub fn scope(args: &PeriodArgs, default_kind: PeriodKind, today: NaiveDate) -> Result<Scope> {
    let selection = PeriodSelection::from_query(
        args.period.as_deref(),
        args.from.as_deref(),
        args.to.as_deref(),
        default_kind,
    );
    Ok(Scope::resolve(
        &selection,
        project_id(args.project.as_deref())?,
        today,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_relative_times() {
        assert_eq!(
            parse_time("2 hours ago", Tz::UTC, now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 4, 10, 0, 0).unwrap()
        );
        assert_eq!(
            parse_time("1 day ago", Tz::UTC, now()).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, 3, 12, 0, 0).unwrap()
        );
        assert_eq!(parse_time("now", Tz::UTC, now()).unwrap(), now());
    }

    #[test]
    fn test_parse_local_time_in_zone() {
        let parsed = parse_time("2024-03-04 09:00", chrono_tz::Europe::Berlin, now()).unwrap();
        assert_eq!(parsed, Utc.with_ymd_and_hms(2024, 3, 4, 8, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_rejects_garbage_and_huge_values() {
        assert!(parse_time("yesterday-ish", Tz::UTC, now()).is_err());
        assert!(parse_time("999999999 weeks ago", Tz::UTC, now()).is_err());
    }

    #[test]
    fn test_scope_uses_default_period() {
        let args = PeriodArgs {
            project: Some("website".to_string()),
            ..PeriodArgs::default()
        };
        let today = NaiveDate::from_ymd_opt(2024, 3, 6).unwrap();
        let scope = scope(&args, PeriodKind::Month, today).unwrap();
        assert_eq!(scope.kind, PeriodKind::Month);
        assert_eq!(scope.range.from, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        assert_eq!(scope.project_id.unwrap().as_str(), "website");
    }
}
