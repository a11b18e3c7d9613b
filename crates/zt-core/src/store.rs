//! Persistence seam for time entries.
//!
//! Every method is scoped to an owner. The store is responsible for making
//! [`TimeEntryStore::insert_running`] and [`TimeEntryStore::finish`] atomic
//! conditional writes, so the single-running-timer rule holds even when two
//! requests race.

use chrono::{DateTime, Utc};

use crate::entry::{EntryDetails, TimeEntry};
use crate::period::UtcRange;
use crate::types::{EntryId, OwnerId, ProjectId};

/// Ordering of listed entries by start time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Filter for listing entries.
///
/// An entry matches when its start lies inside `range`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryQuery {
    pub range: UtcRange,
    pub project_id: Option<ProjectId>,
    /// Skip running entries.
    pub completed_only: bool,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl EntryQuery {
    /// All entries started inside `range`, newest first.
    pub const fn new(range: UtcRange) -> Self {
        Self {
            range,
            project_id: None,
            completed_only: false,
            order: SortOrder::Descending,
            limit: None,
        }
    }

    #[must_use]
    pub fn project(mut self, project_id: Option<ProjectId>) -> Self {
        self.project_id = project_id;
        self
    }

    #[must_use]
    pub const fn completed_only(mut self) -> Self {
        self.completed_only = true;
        self
    }

    #[must_use]
    pub const fn order(mut self, order: SortOrder) -> Self {
        self.order = order;
        self
    }

    #[must_use]
    pub const fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `entry` passes the filter, ignoring order and limit.
    pub fn matches(&self, entry: &TimeEntry) -> bool {
        self.range.contains(entry.start_time)
            && self
                .project_id
                .as_ref()
                .is_none_or(|project| entry.project_id.as_ref() == Some(project))
            && (!self.completed_only || entry.duration_seconds.is_some())
    }
}

/// Values written when a running entry is stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finish {
    pub end_time: DateTime<Utc>,
    pub duration_seconds: i64,
    /// Replacement description; `None` keeps the current one.
    pub description: Option<String>,
    pub updated_at: DateTime<Utc>,
}

/// Storage for time entries.
pub trait TimeEntryStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Inserts a running entry unless the owner already has one.
    ///
    /// Returns `false`, without writing, when a running entry exists.
    fn insert_running(&mut self, entry: &TimeEntry) -> Result<bool, Self::Error>;

    /// Inserts a completed entry.
    fn insert(&mut self, entry: &TimeEntry) -> Result<(), Self::Error>;

    /// Loads one entry with joined display names.
    fn get(&self, owner: &OwnerId, id: &EntryId) -> Result<Option<EntryDetails>, Self::Error>;

    /// The owner's running entry, if any.
    fn running(&self, owner: &OwnerId) -> Result<Option<EntryDetails>, Self::Error>;

    /// Stops the entry if it is still running.
    ///
    /// Returns `false` when no running entry with this id exists for the owner.
    fn finish(&mut self, owner: &OwnerId, id: &EntryId, finish: &Finish)
    -> Result<bool, Self::Error>;

    /// Overwrites the mutable fields of an existing entry.
    ///
    /// Returns `false` when the entry does not exist for `entry.owner_id`.
    fn replace(&mut self, entry: &TimeEntry) -> Result<bool, Self::Error>;

    /// Removes an entry. Returns `false` when nothing was deleted.
    fn delete(&mut self, owner: &OwnerId, id: &EntryId) -> Result<bool, Self::Error>;

    /// Lists matching entries with joined display names.
    fn list(&self, owner: &OwnerId, query: &EntryQuery) -> Result<Vec<EntryDetails>, Self::Error>;

    /// Sum of completed durations for entries started inside `range`.
    fn total_seconds(&self, owner: &OwnerId, range: UtcRange) -> Result<i64, Self::Error> {
        let query = EntryQuery::new(range).completed_only();
        Ok(self
            .list(owner, &query)?
            .iter()
            .filter_map(|details| details.entry.duration_seconds)
            .sum())
    }
}
