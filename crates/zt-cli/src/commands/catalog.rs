//! `zt project` and `zt task`: display names for referenced projects and tasks.

use std::io::Write;

use anyhow::{Context, Result};
use zt_core::{ProjectId, TaskId};
use zt_db::Database;

pub fn project<W: Write>(
    writer: &mut W,
    db: &mut Database,
    id: &str,
    name: &str,
    color: Option<&str>,
) -> Result<()> {
    let id = ProjectId::new(id).context("invalid project id")?;
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "project name cannot be empty");
    db.upsert_project(&id, name, color)
        .with_context(|| format!("failed to save project {id}"))?;
    writeln!(writer, "Project {id}: {name}")?;
    Ok(())
}

pub fn task<W: Write>(writer: &mut W, db: &mut Database, id: &str, title: &str) -> Result<()> {
    let id = TaskId::new(id).context("invalid task id")?;
    let title = title.trim();
    anyhow::ensure!(!title.is_empty(), "task title cannot be empty");
    db.upsert_task(&id, title)
        .with_context(|| format!("failed to save task {id}"))?;
    writeln!(writer, "Task {id}: {title}")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_rename_is_upsert() {
        let mut db = Database::open_in_memory().unwrap();
        let mut out = Vec::new();
        project(&mut out, &mut db, "web", "Website", None).unwrap();
        project(&mut out, &mut db, "web", "Webseite", Some("#198754")).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Project web: Website\nProject web: Webseite\n"
        );
    }

    #[test]
    fn test_blank_names_are_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        assert!(project(&mut Vec::new(), &mut db, "web", "  ", None).is_err());
        assert!(task(&mut Vec::new(), &mut db, "", "Newsletter").is_err());
    }
}
