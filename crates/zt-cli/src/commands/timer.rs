//! `zt start`, `zt stop` and `zt status`.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use zt_core::aggregate;
use zt_core::format::hh_mm_ss;
use zt_core::{EntryDetails, StartTimer, timer};
use zt_db::Database;

use super::util::{entry_id, project_id, task_id};
use crate::cli::RefArgs;
use crate::config::Session;

/// `Website: Deploy`, or whichever parts are set.
pub fn label(details: &EntryDetails) -> String {
    let project = details.project_name.as_deref().unwrap_or_default();
    let description = details.entry.description.as_str();
    let mut label = match (project.is_empty(), description.is_empty()) {
        (false, false) => format!("{project}: {description}"),
        (false, true) => project.to_string(),
        (true, false) => description.to_string(),
        (true, true) => "(no description)".to_string(),
    };
    if details.entry.is_break {
        label.push_str(" [break]");
    }
    label
}

pub fn start<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    refs: &RefArgs,
    description: Option<String>,
    is_break: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let input = StartTimer {
        project_id: project_id(refs.project.as_deref())?,
        task_id: task_id(refs.task.as_deref())?,
        description,
        is_break,
    };
    let details = timer::start_at(db, &session.owner, input, now)?;

    writeln!(
        writer,
        "{} started at {}: {}",
        if is_break { "Break" } else { "Timer" },
        session.calendar.render(details.entry.start_time, "%H:%M"),
        label(&details)
    )?;
    writeln!(writer, "id: {}", details.entry.id)?;
    Ok(())
}

/// Stops `id`, or the running timer when no id is given.
pub fn stop<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    id: Option<&str>,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Result<()> {
    let id = match id {
        Some(raw) => entry_id(raw)?,
        None => match timer::running(&*db, &session.owner)? {
            Some(details) => details.entry.id,
            None => anyhow::bail!("no timer is running"),
        },
    };
    let details = timer::stop_at(db, &session.owner, &id, description, now)?;

    writeln!(
        writer,
        "Stopped after {}: {}",
        hh_mm_ss(details.entry.duration_seconds.unwrap_or(0)),
        label(&details)
    )?;
    Ok(())
}

pub fn status<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    now: DateTime<Utc>,
) -> Result<()> {
    writeln!(writer, "Owner: {}", session.owner)?;

    match timer::running(db, &session.owner)? {
        Some(details) => {
            let calendar = &session.calendar;
            writeln!(
                writer,
                "Running since {} ({}): {}",
                calendar.render(details.entry.start_time, "%d.%m.%Y %H:%M"),
                hh_mm_ss(details.entry.elapsed_seconds(now)),
                label(&details)
            )?;
            writeln!(writer, "id: {}", details.entry.id)?;
        }
        None => writeln!(writer, "No timer running.")?,
    }

    let stats = aggregate::stats(db, &session.owner, &session.calendar, now)?;
    writeln!(
        writer,
        "Today {}  Week {}  Month {}",
        stats.today, stats.week, stats.month
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use chrono::TimeZone;
    use insta::assert_snapshot;
    use zt_core::{BoundsPolicy, Calendar, OwnerId, ProjectId};

    fn session() -> Session {
        Session {
            owner: OwnerId::new("sami").unwrap(),
            owner_name: None,
            calendar: Calendar::default(),
            bounds_policy: BoundsPolicy::default(),
        }
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 4, hour, minute, 0).unwrap()
    }

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    #[test]
    fn test_start_status_stop() {
        let mut db = Database::open_in_memory().unwrap();
        db.upsert_project(&ProjectId::new("web").unwrap(), "Website", None)
            .unwrap();
        let session = session();
        let refs = RefArgs {
            project: Some("web".to_string()),
            task: None,
        };

        let mut out = Vec::new();
        start(&mut out, &mut db, &session, &refs, Some("Deploy".into()), false, at(9, 0)).unwrap();
        let started = output(out);
        assert!(started.starts_with("Timer started at 09:00: Website: Deploy\nid: "));

        let mut out = Vec::new();
        status(&mut out, &db, &session, at(9, 45)).unwrap();
        let text = output(out);
        let text: Vec<&str> = text.lines().filter(|l| !l.starts_with("id: ")).collect();
        assert_snapshot!(text.join("\n"), @r"
        Owner: sami
        Running since 04.03.2024 09:00 (00:45:00): Website: Deploy
        Today 00:00  Week 00:00  Month 00:00
        ");

        let mut out = Vec::new();
        stop(&mut out, &mut db, &session, None, None, at(10, 30)).unwrap();
        assert_eq!(output(out), "Stopped after 01:30:00: Website: Deploy\n");

        let mut out = Vec::new();
        status(&mut out, &db, &session, at(11, 0)).unwrap();
        assert_snapshot!(output(out), @r"
        Owner: sami
        No timer running.
        Today 01:30  Week 01:30  Month 01:30
        ");
    }

    #[test]
    fn test_second_start_is_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let session = session();
        let refs = RefArgs::default();
        start(&mut Vec::new(), &mut db, &session, &refs, None, true, at(9, 0)).unwrap();
        let err = start(&mut Vec::new(), &mut db, &session, &refs, None, false, at(9, 5))
            .unwrap_err();
        assert_eq!(err.to_string(), "Es läuft bereits ein Timer");
    }

    #[test]
    fn test_stop_without_running_timer() {
        let mut db = Database::open_in_memory().unwrap();
        let err = stop(&mut Vec::new(), &mut db, &session(), None, None, at(9, 0)).unwrap_err();
        assert_eq!(err.to_string(), "no timer is running");
    }
}
