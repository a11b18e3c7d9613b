//! Aggregation of completed entries into report series.
//!
//! Every figure is derived from the same filtered set: entries of one owner
//! whose start falls inside the resolved period, optionally narrowed to one
//! project, with running entries left out. Nothing computed here is stored.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc, Weekday};
use serde::Serialize;

use crate::entry::EntryDetails;
use crate::error::{Result, TrackerError};
use crate::format;
use crate::period::{DateRange, PeriodKind, PeriodSelection};
use crate::store::{EntryQuery, SortOrder, TimeEntryStore};
use crate::timestamp::Calendar;
use crate::types::{OwnerId, ProjectId};

/// Maximum number of entries listed alongside a report.
pub const RECENT_LIMIT: usize = 50;

/// Bucket label for entries without a (known) project.
pub const NO_PROJECT: &str = "Kein Projekt";

/// Color used for the no-project bucket and uncolored projects.
pub const DEFAULT_PROJECT_COLOR: &str = "#6c757d";

const WEEK_FROM_SUNDAY: [Weekday; 7] = [
    Weekday::Sun,
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
];

/// A resolved period plus the optional project filter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    pub kind: PeriodKind,
    pub range: DateRange,
    pub project_id: Option<ProjectId>,
}

impl Scope {
    pub fn resolve(
        selection: &PeriodSelection,
        project_id: Option<ProjectId>,
        today: NaiveDate,
    ) -> Self {
        Self {
            kind: selection.kind,
            range: selection.resolve(today),
            project_id,
        }
    }

    /// Query for all entries in scope, newest first.
    pub fn query(&self, calendar: &Calendar) -> EntryQuery {
        EntryQuery::new(self.range.to_utc(calendar.zone)).project(self.project_id.clone())
    }
}

/// The resolved period, echoed back with the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodEcho {
    #[serde(rename = "type")]
    pub kind: PeriodKind,
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total_entries: usize,
    pub total_seconds: i64,
    pub total_formatted: String,
    pub total_long: String,
    pub work_seconds: i64,
    pub work_formatted: String,
    pub break_seconds: i64,
    pub break_formatted: String,
    pub avg_entry_seconds: i64,
    pub avg_entry_formatted: String,
    pub days_worked: usize,
    pub avg_per_day_seconds: i64,
    pub avg_per_day: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DailyRow {
    pub date: NaiveDate,
    pub work_seconds: i64,
    pub work_formatted: String,
    pub break_seconds: i64,
    pub break_formatted: String,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectRow {
    pub project_id: Option<ProjectId>,
    pub project_name: String,
    pub project_color: String,
    pub total_seconds: i64,
    pub total_formatted: String,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HourRow {
    pub hour: u32,
    pub label: String,
    pub total_seconds: i64,
    pub total_formatted: String,
    pub entries: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayRow {
    /// 1 = Sunday through 7 = Saturday.
    pub day_num: u32,
    pub day_name: String,
    pub total_seconds: i64,
    pub total_formatted: String,
    pub days_count: usize,
    pub entries: usize,
    /// Mean duration of the entries that started on this weekday.
    pub avg_seconds: i64,
}

/// Full report for one scope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub period: PeriodEcho,
    pub summary: Summary,
    pub daily: Vec<DailyRow>,
    pub by_project: Vec<ProjectRow>,
    pub by_hour: Vec<HourRow>,
    pub by_weekday: Vec<WeekdayRow>,
    /// Up to [`RECENT_LIMIT`] entries, newest first.
    pub entries: Vec<EntryDetails>,
}

/// Completed-time totals for today, this week and this month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Stats {
    pub today: String,
    pub week: String,
    pub month: String,
    pub today_seconds: i64,
    pub week_seconds: i64,
    pub month_seconds: i64,
}

/// Loads the completed entries in scope and aggregates them.
pub fn report<S: TimeEntryStore>(
    store: &S,
    owner: &OwnerId,
    scope: &Scope,
    calendar: &Calendar,
) -> Result<Report> {
    let query = scope
        .query(calendar)
        .completed_only()
        .order(SortOrder::Ascending);
    let entries = store.list(owner, &query).map_err(TrackerError::storage)?;
    tracing::debug!(owner = %owner, period = %scope.kind, entries = entries.len(), "aggregating report");
    Ok(build_report(scope, entries, calendar))
}

/// Aggregates entries already filtered to `scope`, in ascending start order.
///
/// Running entries are skipped.
pub fn build_report(scope: &Scope, entries: Vec<EntryDetails>, calendar: &Calendar) -> Report {
    let completed: Vec<EntryDetails> = entries
        .into_iter()
        .filter(|details| details.entry.duration_seconds.is_some())
        .collect();

    let summary = summarize(&completed, calendar);
    let daily = daily_series(&completed, calendar);
    let by_project = project_series(&completed);
    let by_hour = hour_series(&completed, calendar);
    let by_weekday = weekday_series(&completed, calendar);
    let recent = completed.into_iter().rev().take(RECENT_LIMIT).collect();

    Report {
        period: PeriodEcho {
            kind: scope.kind,
            from: scope.range.from,
            to: scope.range.to,
        },
        summary,
        daily,
        by_project,
        by_hour,
        by_weekday,
        entries: recent,
    }
}

/// Totals for today, the current week and the current month.
pub fn stats<S: TimeEntryStore>(
    store: &S,
    owner: &OwnerId,
    calendar: &Calendar,
    now: DateTime<Utc>,
) -> Result<Stats> {
    let today = calendar.today(now);
    let total = |kind: PeriodKind| -> Result<i64> {
        let range = PeriodSelection::new(kind).resolve(today).to_utc(calendar.zone);
        store
            .total_seconds(owner, range)
            .map_err(TrackerError::storage)
    };
    let today_seconds = total(PeriodKind::Today)?;
    let week_seconds = total(PeriodKind::Week)?;
    let month_seconds = total(PeriodKind::Month)?;

    Ok(Stats {
        today: format::hh_mm(today_seconds),
        week: format::hh_mm(week_seconds),
        month: format::hh_mm(month_seconds),
        today_seconds,
        week_seconds,
        month_seconds,
    })
}

fn seconds(details: &EntryDetails) -> i64 {
    details.entry.duration_seconds.unwrap_or(0)
}

fn average(total: i64, count: usize) -> i64 {
    i64::try_from(count)
        .ok()
        .filter(|&n| n > 0)
        .map_or(0, |n| total / n)
}

fn summarize(entries: &[EntryDetails], calendar: &Calendar) -> Summary {
    let total_seconds: i64 = entries.iter().map(seconds).sum();
    let break_seconds: i64 = entries
        .iter()
        .filter(|details| details.entry.is_break)
        .map(seconds)
        .sum();
    let work_seconds = total_seconds - break_seconds;
    let days_worked = entries
        .iter()
        .map(|details| calendar.date_of(details.entry.start_time))
        .collect::<BTreeSet<_>>()
        .len();
    let avg_entry_seconds = average(total_seconds, entries.len());
    let avg_per_day_seconds = average(total_seconds, days_worked);

    Summary {
        total_entries: entries.len(),
        total_seconds,
        total_formatted: format::hh_mm(total_seconds),
        total_long: format::long(total_seconds, calendar.locale),
        work_seconds,
        work_formatted: format::hh_mm(work_seconds),
        break_seconds,
        break_formatted: format::hh_mm(break_seconds),
        avg_entry_seconds,
        avg_entry_formatted: format::hh_mm(avg_entry_seconds),
        days_worked,
        avg_per_day_seconds,
        avg_per_day: format::hh_mm(avg_per_day_seconds),
    }
}

fn daily_series(entries: &[EntryDetails], calendar: &Calendar) -> Vec<DailyRow> {
    let mut days: BTreeMap<NaiveDate, (i64, i64, usize)> = BTreeMap::new();
    for details in entries {
        let day = days
            .entry(calendar.date_of(details.entry.start_time))
            .or_default();
        if details.entry.is_break {
            day.1 += seconds(details);
        } else {
            day.0 += seconds(details);
        }
        day.2 += 1;
    }

    days.into_iter()
        .map(|(date, (work_seconds, break_seconds, entries))| DailyRow {
            date,
            work_seconds,
            work_formatted: format::hh_mm(work_seconds),
            break_seconds,
            break_formatted: format::hh_mm(break_seconds),
            entries,
        })
        .collect()
}

/// Entries whose project could not be resolved land in the no-project bucket.
fn project_series(entries: &[EntryDetails]) -> Vec<ProjectRow> {
    let mut buckets: HashMap<Option<ProjectId>, ProjectRow> = HashMap::new();
    for details in entries {
        let key = details
            .entry
            .project_id
            .clone()
            .filter(|_| details.project_name.is_some());
        let row = buckets.entry(key.clone()).or_insert_with(|| ProjectRow {
            project_id: key,
            project_name: details
                .project_name
                .clone()
                .unwrap_or_else(|| NO_PROJECT.to_string()),
            project_color: details
                .project_color
                .clone()
                .filter(|_| details.project_name.is_some())
                .unwrap_or_else(|| DEFAULT_PROJECT_COLOR.to_string()),
            total_seconds: 0,
            total_formatted: String::new(),
            entries: 0,
        });
        row.total_seconds += seconds(details);
        row.entries += 1;
    }

    let mut rows: Vec<ProjectRow> = buckets
        .into_values()
        .map(|mut row| {
            row.total_formatted = format::hh_mm(row.total_seconds);
            row
        })
        .collect();
    rows.sort_by(|a, b| {
        b.total_seconds
            .cmp(&a.total_seconds)
            .then_with(|| a.project_name.cmp(&b.project_name))
    });
    rows
}

fn hour_series(entries: &[EntryDetails], calendar: &Calendar) -> Vec<HourRow> {
    let mut hours: BTreeMap<u32, (i64, usize)> = BTreeMap::new();
    for details in entries {
        let hour = hours
            .entry(calendar.hour_of(details.entry.start_time))
            .or_default();
        hour.0 += seconds(details);
        hour.1 += 1;
    }

    hours
        .into_iter()
        .map(|(hour, (total_seconds, entries))| HourRow {
            hour,
            label: format!("{hour:02}:00"),
            total_seconds,
            total_formatted: format::hh_mm(total_seconds),
            entries,
        })
        .collect()
}

/// Always seven rows, Sunday first.
fn weekday_series(entries: &[EntryDetails], calendar: &Calendar) -> Vec<WeekdayRow> {
    let mut totals: HashMap<Weekday, (i64, usize, BTreeSet<NaiveDate>)> = HashMap::new();
    for details in entries {
        let date = calendar.date_of(details.entry.start_time);
        let bucket = totals.entry(date.weekday()).or_default();
        bucket.0 += seconds(details);
        bucket.1 += 1;
        bucket.2.insert(date);
    }

    WEEK_FROM_SUNDAY
        .iter()
        .map(|&weekday| {
            let (total_seconds, count, dates) = totals.remove(&weekday).unwrap_or_default();
            WeekdayRow {
                day_num: weekday.number_from_sunday(),
                day_name: calendar.locale.weekday_name(weekday).to_string(),
                total_seconds,
                total_formatted: format::hh_mm(total_seconds),
                days_count: dates.len(),
                entries: count,
                avg_seconds: average(total_seconds, count),
            }
        })
        .collect()
}
