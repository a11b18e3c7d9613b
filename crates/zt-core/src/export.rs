//! Export of entries as a spreadsheet-friendly CSV file or as a report
//! document that a client renders to PDF.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::Serialize;

use crate::aggregate::{NO_PROJECT, Scope};
use crate::entry::EntryDetails;
use crate::error::{Result, TrackerError};
use crate::format;
use crate::period::DateRange;
use crate::store::{SortOrder, TimeEntryStore};
use crate::timestamp::Calendar;
use crate::types::OwnerId;

const BOM: &[u8] = b"\xEF\xBB\xBF";
const DELIMITER: char = ';';
const PLACEHOLDER: &str = "-";

const CSV_HEADER: [&str; 9] = [
    "Datum",
    "Startzeit",
    "Endzeit",
    "Dauer (hh:mm:ss)",
    "Dauer (Dezimal)",
    "Projekt",
    "Aufgabe",
    "Beschreibung",
    "Pause",
];

const DATE_FORMAT: &str = "%d.%m.%Y";
const TIME_FORMAT: &str = "%H:%M";

/// Supported export targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Pdf,
}

impl ExportFormat {
    /// Parses a format name. Absent means CSV.
    pub fn parse(name: Option<&str>) -> Result<Self> {
        match name.map(str::trim) {
            None | Some("" | "csv") => Ok(Self::Csv),
            Some("pdf") => Ok(Self::Pdf),
            Some(_) => Err(TrackerError::validation(
                "Ungültiges Format. Verwende csv oder pdf.",
            )),
        }
    }
}

/// Loads every entry in scope, running ones included, oldest first.
pub fn entries<S: TimeEntryStore>(
    store: &S,
    owner: &OwnerId,
    scope: &Scope,
    calendar: &Calendar,
) -> Result<Vec<EntryDetails>> {
    let query = scope.query(calendar).order(SortOrder::Ascending);
    store.list(owner, &query).map_err(TrackerError::storage)
}

/// Attachment name for a CSV export produced on `today`.
pub fn csv_filename(today: NaiveDate) -> String {
    format!("zeiterfassung_{}.csv", today.format("%Y-%m-%d"))
}

fn total_seconds(entries: &[EntryDetails]) -> i64 {
    entries
        .iter()
        .filter_map(|details| details.entry.duration_seconds)
        .sum()
}

fn or_placeholder(value: Option<&str>) -> &str {
    value.filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER)
}

fn end_label(details: &EntryDetails, calendar: &Calendar) -> String {
    details.entry.end_time.map_or_else(
        || PLACEHOLDER.to_string(),
        |end| calendar.render(end, TIME_FORMAT),
    )
}

/// Renders entries as semicolon-separated UTF-8 with a byte-order mark.
///
/// One row per entry in the given order, then a blank row and a totals row.
pub fn csv(entries: &[EntryDetails], calendar: &Calendar) -> Vec<u8> {
    let mut out = String::new();
    push_record(&mut out, &CSV_HEADER);

    for details in entries {
        let entry = &details.entry;
        let seconds = entry.duration_seconds.unwrap_or(0);
        let date = calendar.render(entry.start_time, DATE_FORMAT);
        let start = calendar.render(entry.start_time, TIME_FORMAT);
        let end = end_label(details, calendar);
        let duration = format::hh_mm_ss(seconds);
        let decimal = format::decimal_hours(seconds);
        push_record(
            &mut out,
            &[
                &date,
                &start,
                &end,
                &duration,
                &decimal,
                or_placeholder(details.project_name.as_deref()),
                or_placeholder(details.task_title.as_deref()),
                or_placeholder(Some(&entry.description)),
                if entry.is_break { "Ja" } else { "Nein" },
            ],
        );
    }

    let total = total_seconds(entries);
    out.push('\n');
    push_record(
        &mut out,
        &[
            "Gesamt:",
            "",
            "",
            &format::hh_mm_ss(total),
            &format::decimal_hours(total),
            "",
            "",
            "",
            "",
        ],
    );

    let mut bytes = BOM.to_vec();
    bytes.extend_from_slice(out.as_bytes());
    bytes
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    let needs_quotes = field
        .chars()
        .any(|c| matches!(c, ';' | '"' | '\\' | ' ' | '\t' | '\r' | '\n'));
    if needs_quotes {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

/// Data for a printable report, every value preformatted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportDocument {
    pub title: String,
    pub subtitle: String,
    pub user: String,
    pub generated: String,
    pub summary: DocumentSummary,
    pub by_project: Vec<DocumentProject>,
    pub by_date: Vec<DocumentDay>,
    pub entries: Vec<DocumentEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentSummary {
    pub total_entries: usize,
    pub total_duration: String,
    pub total_hours: String,
    pub days_worked: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentProject {
    pub name: String,
    pub duration: String,
    pub hours: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentDay {
    pub date: String,
    pub weekday: String,
    pub entries: usize,
    pub duration: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentEntry {
    pub date: String,
    pub start: String,
    pub end: String,
    pub duration: String,
    pub project: String,
    pub description: String,
    pub is_break: bool,
}

/// Builds the report document for entries already in ascending order.
pub fn document(
    entries: &[EntryDetails],
    range: DateRange,
    user: &str,
    generated_at: DateTime<Utc>,
    calendar: &Calendar,
) -> ReportDocument {
    let mut days: BTreeMap<NaiveDate, (usize, i64)> = BTreeMap::new();
    let mut projects: HashMap<&str, i64> = HashMap::new();
    for details in entries {
        let seconds = details.entry.duration_seconds.unwrap_or(0);
        let day = days
            .entry(calendar.date_of(details.entry.start_time))
            .or_default();
        day.0 += 1;
        day.1 += seconds;
        *projects
            .entry(details.project_name.as_deref().unwrap_or(NO_PROJECT))
            .or_default() += seconds;
    }

    let mut by_project: Vec<(&str, i64)> = projects.into_iter().collect();
    by_project.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let total = total_seconds(entries);
    ReportDocument {
        title: "Zeiterfassung".to_string(),
        subtitle: format!(
            "Bericht vom {} bis {}",
            range.from.format(DATE_FORMAT),
            range.to.format(DATE_FORMAT)
        ),
        user: user.to_string(),
        generated: calendar.render(generated_at, "%d.%m.%Y %H:%M"),
        summary: DocumentSummary {
            total_entries: entries.len(),
            total_duration: format::hh_mm_ss(total),
            total_hours: format::decimal_hours(total),
            days_worked: days.len(),
        },
        by_project: by_project
            .into_iter()
            .map(|(name, seconds)| DocumentProject {
                name: name.to_string(),
                duration: format::hh_mm_ss(seconds),
                hours: format::decimal_hours(seconds),
            })
            .collect(),
        by_date: days
            .into_iter()
            .map(|(date, (count, seconds))| DocumentDay {
                date: date.format(DATE_FORMAT).to_string(),
                weekday: calendar.locale.weekday_name(date.weekday()).to_string(),
                entries: count,
                duration: format::hh_mm_ss(seconds),
            })
            .collect(),
        entries: entries
            .iter()
            .map(|details| DocumentEntry {
                date: calendar.render(details.entry.start_time, DATE_FORMAT),
                start: calendar.render(details.entry.start_time, TIME_FORMAT),
                end: end_label(details, calendar),
                duration: format::hh_mm_ss(details.entry.duration_seconds.unwrap_or(0)),
                project: or_placeholder(details.project_name.as_deref()).to_string(),
                description: or_placeholder(Some(&details.entry.description)).to_string(),
                is_break: details.entry.is_break,
            })
            .collect(),
    }
}
