//! `zt add`, `zt edit`, `zt rm` and `zt list`.

use std::io::Write;

use anyhow::Result;
use chrono::{DateTime, Utc};
use zt_core::format::hh_mm_ss;
use zt_core::{Calendar, EntryPatch, EntryView, NewEntry, PeriodKind, manual};
use zt_db::Database;

use super::timer::label;
use super::util::{entry_id, parse_time, project_id, scope, task_id};
use crate::cli::{EditArgs, PeriodArgs, RefArgs};
use crate::config::Session;

/// Arguments of `zt add`.
#[derive(Debug, Clone)]
pub struct AddArgs<'a> {
    pub start: &'a str,
    pub end: &'a str,
    pub refs: &'a RefArgs,
    pub description: Option<String>,
    pub is_break: bool,
}

/// One list row: `04.03.2024 09:00-10:30  01:30:00  Website: Deploy  <id>`.
pub fn entry_line(view: &EntryView, calendar: &Calendar) -> String {
    let entry = &view.details.entry;
    let end = entry.end_time.map_or_else(
        || "running".to_string(),
        |end| calendar.render(end, "%H:%M"),
    );
    format!(
        "{} {}-{}  {}  {}  {}",
        calendar.render(entry.start_time, "%d.%m.%Y"),
        calendar.render(entry.start_time, "%H:%M"),
        end,
        view.elapsed_formatted,
        label(&view.details),
        entry.id
    )
}

pub fn add<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    args: AddArgs<'_>,
    now: DateTime<Utc>,
) -> Result<()> {
    let zone = session.calendar.zone;
    let input = NewEntry {
        project_id: project_id(args.refs.project.as_deref())?,
        task_id: task_id(args.refs.task.as_deref())?,
        description: args.description,
        start_time: parse_time(args.start, zone, now)?,
        end_time: parse_time(args.end, zone, now)?,
        is_break: args.is_break,
    };
    let details = manual::create_at(db, &session.owner, input, now)?;
    writeln!(
        writer,
        "Added: {}",
        entry_line(&details.into_view(now), &session.calendar)
    )?;
    Ok(())
}

pub fn edit<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    args: &EditArgs,
    now: DateTime<Utc>,
) -> Result<()> {
    let zone = session.calendar.zone;
    let id = entry_id(&args.id)?;
    let project = if args.clear_project {
        Some(None)
    } else {
        project_id(args.project.as_deref())?.map(Some)
    };
    let task = if args.clear_task {
        Some(None)
    } else {
        task_id(args.task.as_deref())?.map(Some)
    };
    let patch = EntryPatch {
        project_id: project,
        task_id: task,
        description: args.description.clone(),
        start_time: args
            .start
            .as_deref()
            .map(|raw| parse_time(raw, zone, now))
            .transpose()?,
        end_time: args
            .end
            .as_deref()
            .map(|raw| parse_time(raw, zone, now))
            .transpose()?,
        is_break: args.is_break,
    };
    if patch.is_empty() {
        tracing::debug!(entry = %id, "edit without changes");
    }

    let details =
        manual::update_at(db, &session.owner, &id, patch, session.bounds_policy, now)?;
    writeln!(
        writer,
        "Updated: {}",
        entry_line(&details.into_view(now), &session.calendar)
    )?;
    Ok(())
}

pub fn remove<W: Write>(
    writer: &mut W,
    db: &mut Database,
    session: &Session,
    id: &str,
) -> Result<()> {
    let id = entry_id(id)?;
    manual::delete(db, &session.owner, &id)?;
    writeln!(writer, "Deleted {id}")?;
    Ok(())
}

pub fn list<W: Write>(
    writer: &mut W,
    db: &Database,
    session: &Session,
    period: &PeriodArgs,
    json: bool,
    now: DateTime<Utc>,
) -> Result<()> {
    let calendar = &session.calendar;
    let scope = scope(period, PeriodKind::Today, calendar.today(now))?;
    let entries = manual::list_at(db, &session.owner, &scope.query(calendar), now)?;

    if json {
        writeln!(writer, "{}", serde_json::to_string_pretty(&entries)?)?;
        return Ok(());
    }

    if entries.is_empty() {
        writeln!(writer, "No entries from {} to {}.", scope.range.from, scope.range.to)?;
        return Ok(());
    }
    let total: i64 = entries.iter().map(|view| view.elapsed_seconds).sum();
    for view in &entries {
        writeln!(writer, "{}", entry_line(view, calendar))?;
    }
    writeln!(writer, "{} entries, {}", entries.len(), hh_mm_ss(total))?;
    Ok(())
}
