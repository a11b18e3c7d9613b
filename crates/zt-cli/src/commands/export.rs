//! `zt export`: CSV bytes, or the report document as JSON for PDF rendering.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use chrono::{DateTime, Utc};
use zt_core::export::{self, ExportFormat};
use zt_core::PeriodKind;
use zt_db::Database;

use super::util::scope;
use crate::cli::PeriodArgs;
use crate::config::Session;

pub fn run<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    period: &PeriodArgs,
    format: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let format = ExportFormat::parse(Some(format))?;
    let calendar = &session.calendar;
    let scope = scope(period, PeriodKind::Month, calendar.today(now))?;
    let entries = export::entries(db, &session.owner, &scope, calendar)?;
    tracing::debug!(?format, entries = entries.len(), "exporting");

    match format {
        ExportFormat::Csv => writer.write_all(&export::csv(&entries, calendar))?,
        ExportFormat::Pdf => {
            let document =
                export::document(&entries, scope.range, session.display_name(), now, calendar);
            writeln!(writer, "{}", serde_json::to_string_pretty(&document)?)?;
        }
    }
    Ok(())
}

/// Target of `zt export` without `--output`: CSV lands in
/// `zeiterfassung_<date>.csv` in the working directory, report data on stdout.
pub fn default_output(format: &str, session: &Session, now: DateTime<Utc>) -> Option<PathBuf> {
    match ExportFormat::parse(Some(format)) {
        Ok(ExportFormat::Csv) => Some(PathBuf::from(export::csv_filename(
            session.calendar.today(now),
        ))),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;
    use zt_core::{BoundsPolicy, Calendar, NewEntry, OwnerId, TaskId, manual};

    fn session() -> Session {
        Session {
            owner: OwnerId::new("sami").unwrap(),
            owner_name: Some("Sami".to_string()),
            calendar: Calendar::default(),
            bounds_policy: BoundsPolicy::default(),
        }
    }

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 20, 17, 5, 0).unwrap()
    }

    fn seeded() -> Database {
        let mut db = Database::open_in_memory().unwrap();
        let task = TaskId::new("42").unwrap();
        db.upsert_task(&task, "Newsletter").unwrap();
        let input = NewEntry {
            task_id: Some(task),
            description: Some("Entwurf; Teil 1".to_string()),
            ..NewEntry::between(
                Utc.with_ymd_and_hms(2024, 3, 4, 14, 0, 0).unwrap(),
                Utc.with_ymd_and_hms(2024, 3, 4, 14, 20, 0).unwrap(),
            )
        };
        manual::create_at(&mut db, &session().owner, input, now()).unwrap();
        db
    }

    #[test]
    fn test_csv_export_for_month() {
        let db = seeded();
        let mut out = Vec::new();
        run(&mut out, &db, &session(), &PeriodArgs::default(), "csv", now()).unwrap();

        assert!(out.starts_with(b"\xEF\xBB\xBF"));
        assert_snapshot!(String::from_utf8(out[3..].to_vec()).unwrap(), @r#"
        Datum;Startzeit;Endzeit;"Dauer (hh:mm:ss)";"Dauer (Dezimal)";Projekt;Aufgabe;Beschreibung;Pause
        04.03.2024;14:00;14:20;00:20:00;0.33;-;Newsletter;"Entwurf; Teil 1";Nein

        Gesamt:;;;00:20:00;0.33;;;;
        "#);
    }

    #[test]
    fn test_pdf_export_is_report_document() {
        let db = seeded();
        let mut out = Vec::new();
        run(&mut out, &db, &session(), &PeriodArgs::default(), "pdf", now()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["user"], "Sami");
        assert_eq!(json["generated"], "20.03.2024 17:05");
        assert_eq!(json["subtitle"], "Bericht vom 01.03.2024 bis 31.03.2024");
        assert_eq!(json["entries"][0]["description"], "Entwurf; Teil 1");
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let db = seeded();
        let err = run(&mut Vec::new(), &db, &session(), &PeriodArgs::default(), "xlsx", now())
            .unwrap_err();
        assert_eq!(err.to_string(), "Ungültiges Format. Verwende csv oder pdf.");
    }

    #[test]
    fn test_default_output() {
        assert_eq!(
            default_output("csv", &session(), now()),
            Some(PathBuf::from("zeiterfassung_2024-03-20.csv"))
        );
        assert_eq!(default_output("pdf", &session(), now()), None);
        assert_eq!(default_output("xlsx", &session(), now()), None);
    }
}
