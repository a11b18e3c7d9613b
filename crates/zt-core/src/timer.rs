//! Timer lifecycle: `Idle → start → Running → stop → Idle`.
//!
//! An owner has at most one running entry. The running timer is never cached;
//! it is whatever entry the store holds without an end time.

use chrono::{DateTime, Utc};

use crate::entry::{EntryDetails, StartTimer, TimeEntry, duration_between, normalize_description};
use crate::error::{Result, TrackerError};
use crate::store::{Finish, TimeEntryStore};
use crate::timestamp;
use crate::types::{EntryId, OwnerId};

const TIMER_RUNNING: &str = "Es läuft bereits ein Timer";
const TIMER_NOT_FOUND: &str = "Timer nicht gefunden oder bereits gestoppt";

/// Starts a timer for `owner` at the current instant.
pub fn start<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    input: StartTimer,
) -> Result<EntryDetails> {
    start_at(store, owner, input, timestamp::now())
}

/// Starts a timer at `now`.
///
/// Fails with [`TrackerError::Conflict`] when the owner already has a running
/// entry; nothing is written in that case.
pub fn start_at<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    input: StartTimer,
    now: DateTime<Utc>,
) -> Result<EntryDetails> {
    let now = timestamp::whole_seconds(now);
    let entry = TimeEntry {
        id: EntryId::generate(),
        owner_id: owner.clone(),
        project_id: input.project_id,
        task_id: input.task_id,
        description: normalize_description(input.description.as_deref()),
        start_time: now,
        end_time: None,
        duration_seconds: None,
        is_break: input.is_break,
        created_at: now,
        updated_at: None,
    };

    let inserted = store
        .insert_running(&entry)
        .map_err(TrackerError::storage)?;
    if !inserted {
        tracing::info!(owner = %owner, "start rejected: timer already running");
        return Err(TrackerError::Conflict(TIMER_RUNNING.to_string()));
    }

    tracing::info!(owner = %owner, entry = %entry.id, is_break = entry.is_break, "timer started");
    reload(store, owner, &entry.id)
}

/// Stops the owner's running entry `id` at the current instant.
pub fn stop<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    id: &EntryId,
    description: Option<&str>,
) -> Result<EntryDetails> {
    stop_at(store, owner, id, description, timestamp::now())
}

/// Stops a running entry at `now`.
///
/// The duration is the whole seconds since start. A supplied description
/// replaces the current one. Stopping an entry that is not running (or not
/// owned by `owner`) fails with [`TrackerError::NotFound`] and writes nothing.
pub fn stop_at<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    id: &EntryId,
    description: Option<&str>,
    now: DateTime<Utc>,
) -> Result<EntryDetails> {
    let now = timestamp::whole_seconds(now);
    let current = store
        .get(owner, id)
        .map_err(TrackerError::storage)?
        .filter(|details| details.entry.is_running())
        .ok_or_else(|| TrackerError::NotFound(TIMER_NOT_FOUND.to_string()))?;

    let duration_seconds = duration_between(current.entry.start_time, now).max(0);
    let finish = Finish {
        end_time: now,
        duration_seconds,
        description: description.map(|d| normalize_description(Some(d))),
        updated_at: now,
    };

    // The conditional write loses if a concurrent stop got there first.
    if !store.finish(owner, id, &finish).map_err(TrackerError::storage)? {
        return Err(TrackerError::NotFound(TIMER_NOT_FOUND.to_string()));
    }

    tracing::info!(owner = %owner, entry = %id, duration_seconds, "timer stopped");
    reload(store, owner, id)
}

/// The owner's running entry, if any.
pub fn running<S: TimeEntryStore>(store: &S, owner: &OwnerId) -> Result<Option<EntryDetails>> {
    store.running(owner).map_err(TrackerError::storage)
}

fn reload<S: TimeEntryStore>(store: &S, owner: &OwnerId, id: &EntryId) -> Result<EntryDetails> {
    store
        .get(owner, id)
        .map_err(TrackerError::storage)?
        .ok_or_else(|| TrackerError::NotFound(format!("Eintrag {id} nicht gefunden")))
}
