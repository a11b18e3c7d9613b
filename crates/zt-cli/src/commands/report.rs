//! `zt report` and `zt stats`.
//!
//! Both print either a human-readable summary or the JSON the HTTP API
//! returns for the same query.

use std::fmt::Write as _;
use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Datelike, Utc};
use zt_core::aggregate::{self, Report};
use zt_core::{Calendar, PeriodKind};
use zt_db::Database;

use super::util::scope;
use crate::cli::PeriodArgs;
use crate::config::Session;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    period: &PeriodArgs,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let calendar = &session.calendar;
    let scope = scope(period, PeriodKind::Week, calendar.today(now))?;
    let report = aggregate::report(db, &session.owner, &scope, calendar)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&report)?)?;
    } else {
        write!(writer, "{}", format_report(&report, calendar))?;
    }
    Ok(())
}

/// Renders a report for the terminal.
pub fn format_report(report: &Report, calendar: &Calendar) -> String {
    let mut out = String::new();
    let summary = &report.summary;
    writeln!(
        out,
        "Report {} ({} to {})",
        report.period.kind, report.period.from, report.period.to
    )
    .unwrap();
    writeln!(out).unwrap();

    if summary.total_entries == 0 {
        writeln!(out, "No completed entries.").unwrap();
        return out;
    }

    writeln!(
        out,
        "Total    {} ({}) in {} entries",
        summary.total_formatted, summary.total_long, summary.total_entries
    )
    .unwrap();
    writeln!(out, "Work     {}", summary.work_formatted).unwrap();
    writeln!(out, "Breaks   {}", summary.break_formatted).unwrap();
    writeln!(
        out,
        "Days     {} (avg {} per day, {} per entry)",
        summary.days_worked, summary.avg_per_day, summary.avg_entry_formatted
    )
    .unwrap();

    writeln!(out).unwrap();
    writeln!(out, "By project").unwrap();
    let name_width = report
        .by_project
        .iter()
        .map(|row| row.project_name.chars().count())
        .max()
        .unwrap_or(0);
    for row in &report.by_project {
        writeln!(
            out,
            "  {:<name_width$}  {}  ({})",
            row.project_name, row.total_formatted, row.entries
        )
        .unwrap();
    }

    writeln!(out).unwrap();
    writeln!(out, "By day").unwrap();
    for row in &report.daily {
        let weekday = calendar.locale.weekday_name(row.date.weekday());
        writeln!(
            out,
            "  {} {:<10}  work {}  break {}  ({})",
            row.date.format("%d.%m.%Y"),
            weekday,
            row.work_formatted,
            row.break_formatted,
            row.entries
        )
        .unwrap();
    }

    if !report.by_hour.is_empty() {
        writeln!(out).unwrap();
        writeln!(out, "By hour").unwrap();
        for row in &report.by_hour {
            writeln!(out, "  {}  {}  ({})", row.label, row.total_formatted, row.entries).unwrap();
        }
    }
    out
}

pub fn stats<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let stats = aggregate::stats(db, &session.owner, &session.calendar, now)?;
    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&stats)?)?;
    } else {
        writeln!(writer, "Today  {}", stats.today)?;
        writeln!(writer, "Week   {}", stats.week)?;
        writeln!(writer, "Month  {}", stats.month)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;
    use zt_core::{BoundsPolicy, NewEntry, OwnerId, ProjectId, manual};

    fn session() -> Session {
        Session {
            owner: OwnerId::new("sami").unwrap(),
            owner_name: None,
            calendar: Calendar::default(),
            bounds_policy: BoundsPolicy::default(),
        }
    }

    fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, day, hour, minute, 0).unwrap()
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let website = ProjectId::new("web").unwrap();
        db.upsert_project(&website, "Website", Some("#0d6efd"))
            .unwrap();
        let owner = session().owner;
        let entries = [
            (at(4, 9, 0), at(4, 10, 30), Some(website.clone()), false),
            (at(4, 12, 0), at(4, 12, 30), None, true),
            (at(5, 9, 15), at(5, 11, 15), Some(website), false),
        ];
        for (start, end, project_id, is_break) in entries {
            let input = NewEntry {
                project_id,
                is_break,
                ..NewEntry::between(start, end)
            };
            manual::create_at(&mut db, &owner, input, at(6, 8, 0)).unwrap();
        }
        db
    }

    #[test]
    fn test_report_human_output() {
        let db = seeded();
        let mut out = Vec::new();
        run(
            &mut out,
            &db,
            &session(),
            &PeriodArgs::default(),
            false,
            at(6, 12, 0),
        )
        .unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Report week (2024-03-04 to 2024-03-10)

        Total    04:00 (4 Std. 0 Min.) in 3 entries
        Work     03:30
        Breaks   00:30
        Days     2 (avg 02:00 per day, 01:20 per entry)

        By project
          Website       03:30  (2)
          Kein Projekt  00:30  (1)

        By day
          04.03.2024 Montag      work 01:30  break 00:30  (2)
          05.03.2024 Dienstag    work 02:00  break 00:00  (1)

        By hour
          09:00  03:30  (2)
          12:00  00:30  (1)
        ");
    }

    #[test]
    fn test_report_without_entries() {
        let db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        let period = PeriodArgs {
            period: Some("last_month".to_string()),
            ..PeriodArgs::default()
        };
        run(&mut out, &db, &session(), &period, false, at(6, 12, 0)).unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Report last_month (2024-02-01 to 2024-02-29)

        No completed entries.
        ");
    }

    #[test]
    fn test_report_json_matches_api_shape() {
        let db = seeded();
        let mut out = Vec::new();
        run(
            &mut out,
            &db,
            &session(),
            &PeriodArgs::default(),
            true,
            at(6, 12, 0),
        )
        .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["period"]["type"], "week");
        assert_eq!(json["summary"]["total_seconds"], 14_400);
        assert_eq!(json["by_weekday"].as_array().unwrap().len(), 7);
    }

    #[test]
    fn test_stats_output() {
        let db = seeded();
        let mut out = Vec::new();
        stats(&mut out, &db, &session(), false, at(5, 18, 0)).unwrap();
        assert_snapshot!(String::from_utf8(out).unwrap(), @r"
        Today  02:00
        Week   04:00
        Month  04:00
        ");
    }
}
