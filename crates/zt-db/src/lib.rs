//! Storage layer for the time tracker.
//!
//! Provides persistence for time entries using `rusqlite`, plus the project and
//! task lookup tables used to show display names next to entries.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! This means a `Database` instance can be moved between threads but cannot be shared
//! across threads without external synchronization. The HTTP server keeps a single
//! instance behind a mutex.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC with whole seconds
//! (e.g., `2024-01-15T10:30:00Z`). Every value has the same width, so
//! lexicographic ordering matches chronological ordering and range filters can
//! compare strings.
//!
//! ## Running Timers
//!
//! A partial unique index on `owner_id WHERE end_time IS NULL` makes a second
//! running entry for the same owner impossible at the storage level. Starting a
//! timer is a single conditional insert, and stopping one is a conditional
//! update on `end_time IS NULL`.

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use thiserror::Error;
use zt_core::{
    EntryDetails, EntryId, EntryQuery, Finish, OwnerId, ProjectId, SortOrder, TaskId, TimeEntry,
    TimeEntryStore, UtcRange, ValidationError,
};

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored timestamp could not be parsed.
    #[error("invalid timestamp for entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A stored identifier is empty.
    #[error("invalid identifier in entry {entry_id}")]
    InvalidId {
        entry_id: String,
        #[source]
        source: ValidationError,
    },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

/// Columns selected for every entry read, joined with display names.
const ENTRY_COLUMNS: &str = "
    te.id, te.owner_id, te.project_id, te.task_id, te.description, te.start_time,
    te.end_time, te.duration_seconds, te.is_break, te.created_at, te.updated_at,
    p.name, p.color, t.title
";

const ENTRY_JOINS: &str = "
    FROM time_entries te
    LEFT JOIN projects p ON te.project_id = p.id
    LEFT JOIN tasks t ON te.task_id = t.id
";

/// An entry row as stored, before validation.
#[derive(Debug)]
struct EntryRow {
    id: String,
    owner_id: String,
    project_id: Option<String>,
    task_id: Option<String>,
    description: String,
    start_time: String,
    end_time: Option<String>,
    duration_seconds: Option<i64>,
    is_break: bool,
    created_at: String,
    updated_at: Option<String>,
    project_name: Option<String>,
    project_color: Option<String>,
    task_title: Option<String>,
}

impl EntryRow {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            owner_id: row.get(1)?,
            project_id: row.get(2)?,
            task_id: row.get(3)?,
            description: row.get(4)?,
            start_time: row.get(5)?,
            end_time: row.get(6)?,
            duration_seconds: row.get(7)?,
            is_break: row.get(8)?,
            created_at: row.get(9)?,
            updated_at: row.get(10)?,
            project_name: row.get(11)?,
            project_color: row.get(12)?,
            task_title: row.get(13)?,
        })
    }

    fn into_details(self) -> Result<EntryDetails, DbError> {
        let entry_id = self.id.clone();
        let invalid = |source| DbError::InvalidId {
            entry_id: entry_id.clone(),
            source,
        };
        let timestamp = |value: &str| parse_timestamp(value, &entry_id);
        let optional_timestamp = |value: Option<&str>| value.map(timestamp).transpose();

        let entry = TimeEntry {
            id: EntryId::new(self.id.as_str()).map_err(invalid)?,
            owner_id: OwnerId::new(self.owner_id).map_err(invalid)?,
            project_id: self
                .project_id
                .map(ProjectId::new)
                .transpose()
                .map_err(invalid)?,
            task_id: self.task_id.map(TaskId::new).transpose().map_err(invalid)?,
            description: self.description,
            start_time: timestamp(&self.start_time)?,
            end_time: optional_timestamp(self.end_time.as_deref())?,
            duration_seconds: self.duration_seconds,
            is_break: self.is_break,
            created_at: timestamp(&self.created_at)?,
            updated_at: optional_timestamp(self.updated_at.as_deref())?,
        };
        Ok(EntryDetails {
            entry,
            project_name: self.project_name,
            project_color: self.project_color,
            task_title: self.task_title,
        })
    }
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Display lookups; project and task management lives elsewhere
            CREATE TABLE IF NOT EXISTS projects (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                color TEXT
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL
            );

            -- end_time NULL: the entry is running and duration_seconds is NULL too
            CREATE TABLE IF NOT EXISTS time_entries (
                id TEXT PRIMARY KEY,
                owner_id TEXT NOT NULL,
                project_id TEXT,
                task_id TEXT,
                description TEXT NOT NULL DEFAULT '',
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration_seconds INTEGER,
                is_break INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_owner_start
                ON time_entries(owner_id, start_time);
            CREATE INDEX IF NOT EXISTS idx_time_entries_project ON time_entries(project_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_running
                ON time_entries(owner_id) WHERE end_time IS NULL;
            ",
        )?;
        Ok(())
    }

    /// Creates or renames a project used for display joins.
    pub fn upsert_project(
        &mut self,
        id: &ProjectId,
        name: &str,
        color: Option<&str>,
    ) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO projects (id, name, color) VALUES (?1, ?2, ?3)
            ON CONFLICT(id) DO UPDATE SET name = excluded.name, color = excluded.color
            ",
            params![id.as_str(), name, color],
        )?;
        Ok(())
    }

    /// Creates or renames a task used for display joins.
    pub fn upsert_task(&mut self, id: &TaskId, title: &str) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO tasks (id, title) VALUES (?1, ?2)
            ON CONFLICT(id) DO UPDATE SET title = excluded.title
            ",
            params![id.as_str(), title],
        )?;
        Ok(())
    }

    fn query_entries(&self, sql: &str, params: &[String]) -> Result<Vec<EntryDetails>, DbError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params_from_iter(params.iter()), EntryRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_details()?);
        }
        Ok(entries)
    }

    fn query_entry(&self, sql: &str, params: &[String]) -> Result<Option<EntryDetails>, DbError> {
        self.conn
            .query_row(sql, params_from_iter(params.iter()), EntryRow::from_row)
            .optional()?
            .map(EntryRow::into_details)
            .transpose()
    }
}

impl TimeEntryStore for Database {
    type Error = DbError;

    fn insert_running(&mut self, entry: &TimeEntry) -> Result<bool, DbError> {
        let result = self.conn.execute(
            "
            INSERT INTO time_entries (
                id, owner_id, project_id, task_id, description, start_time,
                end_time, duration_seconds, is_break, created_at, updated_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5, ?6, NULL, NULL, ?7, ?8, NULL
            WHERE NOT EXISTS (
                SELECT 1 FROM time_entries WHERE owner_id = ?2 AND end_time IS NULL
            )
            ",
            params![
                entry.id.as_str(),
                entry.owner_id.as_str(),
                entry.project_id.as_ref().map(ProjectId::as_str),
                entry.task_id.as_ref().map(TaskId::as_str),
                entry.description,
                format_timestamp(entry.start_time),
                entry.is_break,
                format_timestamp(entry.created_at),
            ],
        );
        match result {
            Ok(inserted) => Ok(inserted == 1),
            Err(err) if is_running_conflict(&err) => Ok(false),
            Err(err) => Err(err.into()),
        }
    }

    fn insert(&mut self, entry: &TimeEntry) -> Result<(), DbError> {
        self.conn.execute(
            "
            INSERT INTO time_entries (
                id, owner_id, project_id, task_id, description, start_time,
                end_time, duration_seconds, is_break, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            ",
            params![
                entry.id.as_str(),
                entry.owner_id.as_str(),
                entry.project_id.as_ref().map(ProjectId::as_str),
                entry.task_id.as_ref().map(TaskId::as_str),
                entry.description,
                format_timestamp(entry.start_time),
                entry.end_time.map(format_timestamp),
                entry.duration_seconds,
                entry.is_break,
                format_timestamp(entry.created_at),
                entry.updated_at.map(format_timestamp),
            ],
        )?;
        Ok(())
    }

    fn get(&self, owner: &OwnerId, id: &EntryId) -> Result<Option<EntryDetails>, DbError> {
        let sql = format!("SELECT {ENTRY_COLUMNS} {ENTRY_JOINS} WHERE te.id = ?1 AND te.owner_id = ?2");
        self.query_entry(&sql, &[id.to_string(), owner.to_string()])
    }

    fn running(&self, owner: &OwnerId) -> Result<Option<EntryDetails>, DbError> {
        let sql = format!(
            "SELECT {ENTRY_COLUMNS} {ENTRY_JOINS} WHERE te.owner_id = ?1 AND te.end_time IS NULL"
        );
        self.query_entry(&sql, &[owner.to_string()])
    }

    fn finish(&mut self, owner: &OwnerId, id: &EntryId, finish: &Finish) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "
            UPDATE time_entries
            SET end_time = ?3,
                duration_seconds = ?4,
                description = COALESCE(?5, description),
                updated_at = ?6
            WHERE id = ?1 AND owner_id = ?2 AND end_time IS NULL
            ",
            params![
                id.as_str(),
                owner.as_str(),
                format_timestamp(finish.end_time),
                finish.duration_seconds,
                finish.description,
                format_timestamp(finish.updated_at),
            ],
        )?;
        Ok(updated == 1)
    }

    fn replace(&mut self, entry: &TimeEntry) -> Result<bool, DbError> {
        let updated = self.conn.execute(
            "
            UPDATE time_entries
            SET project_id = ?3,
                task_id = ?4,
                description = ?5,
                start_time = ?6,
                end_time = ?7,
                duration_seconds = ?8,
                is_break = ?9,
                updated_at = ?10
            WHERE id = ?1 AND owner_id = ?2
            ",
            params![
                entry.id.as_str(),
                entry.owner_id.as_str(),
                entry.project_id.as_ref().map(ProjectId::as_str),
                entry.task_id.as_ref().map(TaskId::as_str),
                entry.description,
                format_timestamp(entry.start_time),
                entry.end_time.map(format_timestamp),
                entry.duration_seconds,
                entry.is_break,
                entry.updated_at.map(format_timestamp),
            ],
        )?;
        Ok(updated == 1)
    }

    fn delete(&mut self, owner: &OwnerId, id: &EntryId) -> Result<bool, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM time_entries WHERE id = ?1 AND owner_id = ?2",
            params![id.as_str(), owner.as_str()],
        )?;
        Ok(deleted == 1)
    }

    fn list(&self, owner: &OwnerId, query: &EntryQuery) -> Result<Vec<EntryDetails>, DbError> {
        let mut conditions = vec!["te.owner_id = ?", "te.start_time >= ?", "te.start_time < ?"];
        let mut values = vec![
            owner.to_string(),
            format_timestamp(query.range.start),
            format_timestamp(query.range.end),
        ];
        if let Some(project_id) = &query.project_id {
            conditions.push("te.project_id = ?");
            values.push(project_id.to_string());
        }
        if query.completed_only {
            conditions.push("te.duration_seconds IS NOT NULL");
        }

        let direction = match query.order {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        };
        let mut sql = format!(
            "SELECT {ENTRY_COLUMNS} {ENTRY_JOINS} WHERE {} ORDER BY te.start_time {direction}, te.id {direction}",
            conditions.join(" AND ")
        );
        if let Some(limit) = query.limit {
            sql.push_str(&format!(" LIMIT {limit}"));
        }
        self.query_entries(&sql, &values)
    }

    fn total_seconds(&self, owner: &OwnerId, range: UtcRange) -> Result<i64, DbError> {
        let total = self.conn.query_row(
            "
            SELECT COALESCE(SUM(duration_seconds), 0)
            FROM time_entries
            WHERE owner_id = ?1 AND start_time >= ?2 AND start_time < ?3
              AND duration_seconds IS NOT NULL
            ",
            params![
                owner.as_str(),
                format_timestamp(range.start),
                format_timestamp(range.end),
            ],
            |row| row.get(0),
        )?;
        Ok(total)
    }
}

/// Whether the error is the running-timer unique index firing.
fn is_running_conflict(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(code, Some(message))
            if code.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && message.contains("time_entries.owner_id")
    )
}

fn parse_timestamp(timestamp: &str, entry_id: &str) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            entry_id: entry_id.to_string(),
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Secs, true)
}
