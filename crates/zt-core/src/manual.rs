//! Manual entry management: create, patch, delete, and read entries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entry::{
    EntryDetails, EntryPatch, EntryView, NewEntry, TimeEntry, duration_between,
    normalize_description,
};
use crate::error::{Result, TrackerError};
use crate::store::{EntryQuery, TimeEntryStore};
use crate::timestamp;
use crate::types::{EntryId, OwnerId};

const ENTRY_NOT_FOUND: &str = "Eintrag nicht gefunden";
const END_BEFORE_START: &str = "Endzeit muss nach Startzeit liegen";

/// What an update does when the resulting bounds give a non-positive duration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsPolicy {
    /// Write the new bounds and leave the stored duration untouched.
    #[default]
    KeepDuration,
    /// Fail with a validation error and write nothing.
    Reject,
}

impl BoundsPolicy {
    pub const fn from_strict(strict: bool) -> Self {
        if strict { Self::Reject } else { Self::KeepDuration }
    }
}

/// Creates a completed entry.
pub fn create<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    input: NewEntry,
) -> Result<EntryDetails> {
    create_at(store, owner, input, timestamp::now())
}

/// Creates a completed entry, stamping `created_at` with `now`.
pub fn create_at<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    input: NewEntry,
    now: DateTime<Utc>,
) -> Result<EntryDetails> {
    let start_time = timestamp::whole_seconds(input.start_time);
    let end_time = timestamp::whole_seconds(input.end_time);
    let duration = duration_between(start_time, end_time);
    if duration <= 0 {
        return Err(TrackerError::validation(END_BEFORE_START));
    }

    let entry = TimeEntry {
        id: EntryId::generate(),
        owner_id: owner.clone(),
        project_id: input.project_id,
        task_id: input.task_id,
        description: normalize_description(input.description.as_deref()),
        start_time,
        end_time: Some(end_time),
        duration_seconds: Some(duration),
        is_break: input.is_break,
        created_at: timestamp::whole_seconds(now),
        updated_at: None,
    };
    store.insert(&entry).map_err(TrackerError::storage)?;

    tracing::info!(owner = %owner, entry = %entry.id, duration_seconds = duration, "entry created");
    get(store, owner, &entry.id)
}

/// Applies a partial update.
pub fn update<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    id: &EntryId,
    patch: EntryPatch,
    policy: BoundsPolicy,
) -> Result<EntryDetails> {
    update_at(store, owner, id, patch, policy, timestamp::now())
}

/// Applies a partial update at `now`.
///
/// When either bound is supplied and the resulting entry has an end, the
/// duration is recomputed from the resulting pair. A non-positive result is
/// handled according to `policy`.
pub fn update_at<S: TimeEntryStore>(
    store: &mut S,
    owner: &OwnerId,
    id: &EntryId,
    patch: EntryPatch,
    policy: BoundsPolicy,
    now: DateTime<Utc>,
) -> Result<EntryDetails> {
    let mut entry = get(store, owner, id)?.entry;
    let touches_bounds = patch.touches_bounds();

    if let Some(project_id) = patch.project_id {
        entry.project_id = project_id;
    }
    if let Some(task_id) = patch.task_id {
        entry.task_id = task_id;
    }
    if let Some(description) = patch.description {
        entry.description = normalize_description(Some(&description));
    }
    if let Some(start_time) = patch.start_time {
        entry.start_time = timestamp::whole_seconds(start_time);
    }
    if let Some(end_time) = patch.end_time {
        entry.end_time = Some(timestamp::whole_seconds(end_time));
    }
    if let Some(is_break) = patch.is_break {
        entry.is_break = is_break;
    }

    let resulting_end = entry.end_time.filter(|_| touches_bounds);
    if let Some(end_time) = resulting_end {
        let duration = duration_between(entry.start_time, end_time);
        if duration > 0 {
            entry.duration_seconds = Some(duration);
        } else {
            match policy {
                BoundsPolicy::KeepDuration => {
                    tracing::debug!(entry = %id, duration, "non-positive bounds, keeping stored duration");
                }
                BoundsPolicy::Reject => return Err(TrackerError::validation(END_BEFORE_START)),
            }
        }
    }
    entry.updated_at = Some(timestamp::whole_seconds(now));

    if !store.replace(&entry).map_err(TrackerError::storage)? {
        return Err(TrackerError::NotFound(ENTRY_NOT_FOUND.to_string()));
    }

    tracing::info!(owner = %owner, entry = %id, "entry updated");
    get(store, owner, id)
}

/// Deletes an entry owned by `owner`.
pub fn delete<S: TimeEntryStore>(store: &mut S, owner: &OwnerId, id: &EntryId) -> Result<()> {
    if !store.delete(owner, id).map_err(TrackerError::storage)? {
        return Err(TrackerError::NotFound(ENTRY_NOT_FOUND.to_string()));
    }
    tracing::info!(owner = %owner, entry = %id, "entry deleted");
    Ok(())
}

/// Loads one entry owned by `owner`.
pub fn get<S: TimeEntryStore>(store: &S, owner: &OwnerId, id: &EntryId) -> Result<EntryDetails> {
    store
        .get(owner, id)
        .map_err(TrackerError::storage)?
        .ok_or_else(|| TrackerError::NotFound(ENTRY_NOT_FOUND.to_string()))
}

/// Lists entries, running ones included, with live durations as of `now`.
pub fn list_at<S: TimeEntryStore>(
    store: &S,
    owner: &OwnerId,
    query: &EntryQuery,
    now: DateTime<Utc>,
) -> Result<Vec<EntryView>> {
    let entries = store.list(owner, query).map_err(TrackerError::storage)?;
    Ok(entries
        .into_iter()
        .map(|details| details.into_view(now))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::{self, Scope};
    use crate::entry::StartTimer;
    use crate::memory::MemoryStore;
    use crate::period::{DateRange, PeriodSelection};
    use crate::timer;
    use crate::timestamp::Calendar;
    use chrono::{NaiveDate, TimeZone};
    use chrono_tz::Tz;

    fn alice() -> OwnerId {
        OwnerId::new("alice").unwrap()
    }

    fn utc(day: u32, h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, h, m, 0).unwrap()
    }

    fn seeded(store: &mut MemoryStore) -> EntryDetails {
        let (start, end) =
            NewEntry::parse_bounds(Some("2024-01-01 08:00:00"), Some("2024-01-01 12:00:00"), Tz::UTC)
                .unwrap();
        create_at(store, &alice(), NewEntry::between(start, end), utc(1, 13, 0)).unwrap()
    }

    #[test]
    fn create_computes_duration() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        assert_eq!(created.entry.duration_seconds, Some(14_400));
        assert_eq!(created.entry.created_at, utc(1, 13, 0));
        assert!(!created.entry.is_running());
    }

    #[test]
    fn create_rejects_end_not_after_start() {
        let mut store = MemoryStore::default();
        for end in [utc(1, 8, 0), utc(1, 7, 0)] {
            let err = create_at(
                &mut store,
                &alice(),
                NewEntry::between(utc(1, 8, 0), end),
                utc(1, 13, 0),
            )
            .unwrap_err();
            assert!(matches!(err, TrackerError::Validation(ref m) if m == END_BEFORE_START));
        }
        assert!(store.entries.is_empty());
    }

    #[test]
    fn create_joins_project_name() {
        let mut store = MemoryStore::default();
        let project = store.add_project("p1", "Website", None);
        let input = NewEntry {
            project_id: Some(project),
            description: Some(" Deploy ".to_string()),
            ..NewEntry::between(utc(2, 9, 0), utc(2, 10, 0))
        };
        let created = create_at(&mut store, &alice(), input, utc(2, 11, 0)).unwrap();
        assert_eq!(created.project_name.as_deref(), Some("Website"));
        assert_eq!(created.entry.description, "Deploy");
    }

    #[test]
    fn update_end_recomputes_duration() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        let patch = EntryPatch {
            end_time: Some(utc(1, 11, 0)),
            ..EntryPatch::default()
        };

        let updated = update_at(
            &mut store,
            &alice(),
            &created.entry.id,
            patch,
            BoundsPolicy::KeepDuration,
            utc(1, 14, 0),
        )
        .unwrap();

        assert_eq!(updated.entry.duration_seconds, Some(10_800));
        assert_eq!(updated.entry.end_time, Some(utc(1, 11, 0)));
        assert_eq!(updated.entry.updated_at, Some(utc(1, 14, 0)));
    }

    #[test]
    fn update_start_uses_existing_end() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        let patch = EntryPatch {
            start_time: Some(utc(1, 10, 0)),
            ..EntryPatch::default()
        };
        let updated = update_at(
            &mut store,
            &alice(),
            &created.entry.id,
            patch,
            BoundsPolicy::KeepDuration,
            utc(1, 14, 0),
        )
        .unwrap();
        assert_eq!(updated.entry.duration_seconds, Some(7200));
    }

    #[test]
    fn lenient_update_keeps_duration_on_inverted_bounds() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        let patch = EntryPatch {
            end_time: Some(utc(1, 7, 0)),
            ..EntryPatch::default()
        };
        let updated = update_at(
            &mut store,
            &alice(),
            &created.entry.id,
            patch,
            BoundsPolicy::KeepDuration,
            utc(1, 14, 0),
        )
        .unwrap();
        assert_eq!(updated.entry.end_time, Some(utc(1, 7, 0)));
        assert_eq!(updated.entry.duration_seconds, Some(14_400));
    }

    #[test]
    fn strict_update_rejects_inverted_bounds() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        let patch = EntryPatch {
            end_time: Some(utc(1, 8, 0)),
            description: Some("changed".to_string()),
            ..EntryPatch::default()
        };
        let err = update_at(
            &mut store,
            &alice(),
            &created.entry.id,
            patch,
            BoundsPolicy::Reject,
            utc(1, 14, 0),
        )
        .unwrap_err();
        assert!(matches!(err, TrackerError::Validation(_)));
        assert_eq!(store.entries[0], created.entry);
    }

    #[test]
    fn update_without_bounds_leaves_duration() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        let project = store.add_project("p2", "Intern", None);
        let patch = EntryPatch {
            project_id: Some(Some(project.clone())),
            is_break: Some(true),
            ..EntryPatch::default()
        };
        let updated = update_at(
            &mut store,
            &alice(),
            &created.entry.id,
            patch,
            BoundsPolicy::Reject,
            utc(1, 14, 0),
        )
        .unwrap();
        assert_eq!(updated.entry.project_id, Some(project));
        assert!(updated.entry.is_break);
        assert_eq!(updated.entry.duration_seconds, Some(14_400));

        let cleared = update_at(
            &mut store,
            &alice(),
            &created.entry.id,
            EntryPatch {
                project_id: Some(None),
                ..EntryPatch::default()
            },
            BoundsPolicy::Reject,
            utc(1, 15, 0),
        )
        .unwrap();
        assert_eq!(cleared.entry.project_id, None);
        assert_eq!(cleared.project_name, None);
    }

    #[test]
    fn update_start_of_running_entry_keeps_it_running() {
        let mut store = MemoryStore::default();
        let started = timer::start_at(&mut store, &alice(), StartTimer::default(), utc(3, 9, 0)).unwrap();
        let patch = EntryPatch {
            start_time: Some(utc(3, 8, 30)),
            ..EntryPatch::default()
        };
        let updated = update_at(
            &mut store,
            &alice(),
            &started.entry.id,
            patch,
            BoundsPolicy::Reject,
            utc(3, 9, 5),
        )
        .unwrap();
        assert!(updated.entry.is_running());
        assert_eq!(updated.entry.duration_seconds, None);
        assert_eq!(updated.entry.start_time, utc(3, 8, 30));
    }

    /// An inverted end on a running entry closes it without a duration: it
    /// stops counting as running and stays out of every aggregate.
    #[test]
    fn lenient_inverted_end_on_running_entry_leaves_it_unmeasured() {
        let mut store = MemoryStore::default();
        let started = timer::start_at(&mut store, &alice(), StartTimer::default(), utc(3, 9, 0)).unwrap();
        let patch = EntryPatch {
            end_time: Some(utc(3, 8, 0)),
            ..EntryPatch::default()
        };
        let updated = update_at(
            &mut store,
            &alice(),
            &started.entry.id,
            patch,
            BoundsPolicy::KeepDuration,
            utc(3, 9, 5),
        )
        .unwrap();

        assert!(!updated.entry.is_running());
        assert_eq!(updated.entry.end_time, Some(utc(3, 8, 0)));
        assert_eq!(updated.entry.duration_seconds, None);
        assert!(timer::running(&store, &alice()).unwrap().is_none());

        let day = NaiveDate::from_ymd_opt(2024, 1, 3).unwrap();
        let scope = Scope::resolve(&PeriodSelection::custom(day, day), None, day);
        let report = aggregate::report(&store, &alice(), &scope, &Calendar::default()).unwrap();
        assert_eq!(report.summary.total_entries, 0);
        assert_eq!(report.summary.total_seconds, 0);

        timer::start_at(&mut store, &alice(), StartTimer::default(), utc(3, 9, 10)).unwrap();
    }

    #[test]
    fn foreign_entries_are_not_found() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        let bob = OwnerId::new("bob").unwrap();

        let err = update_at(
            &mut store,
            &bob,
            &created.entry.id,
            EntryPatch::default(),
            BoundsPolicy::KeepDuration,
            utc(1, 14, 0),
        )
        .unwrap_err();
        assert!(matches!(err, TrackerError::NotFound(ref m) if m == ENTRY_NOT_FOUND));
        assert!(matches!(
            delete(&mut store, &bob, &created.entry.id),
            Err(TrackerError::NotFound(_))
        ));
        assert!(matches!(
            get(&store, &bob, &created.entry.id),
            Err(TrackerError::NotFound(_))
        ));
        assert_eq!(store.entries.len(), 1);
    }

    #[test]
    fn delete_removes_entry_once() {
        let mut store = MemoryStore::default();
        let created = seeded(&mut store);
        delete(&mut store, &alice(), &created.entry.id).unwrap();
        assert!(store.entries.is_empty());
        assert!(matches!(
            delete(&mut store, &alice(), &created.entry.id),
            Err(TrackerError::NotFound(_))
        ));
    }

    #[test]
    fn list_includes_running_entry_with_live_duration() {
        let mut store = MemoryStore::default();
        seeded(&mut store);
        timer::start_at(&mut store, &alice(), StartTimer::default(), utc(1, 15, 0)).unwrap();

        let day = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let query = EntryQuery::new(DateRange::single(day).to_utc(Tz::UTC));
        let views = list_at(&store, &alice(), &query, utc(1, 15, 30)).unwrap();

        assert_eq!(views.len(), 2);
        assert!(views[0].is_running);
        assert_eq!(views[0].elapsed_seconds, 1800);
        assert_eq!(views[0].elapsed_formatted, "00:30:00");
        assert!(!views[1].is_running);
        assert_eq!(views[1].elapsed_seconds, 14_400);
    }

    #[test]
    fn policy_from_strict_flag() {
        assert_eq!(BoundsPolicy::from_strict(true), BoundsPolicy::Reject);
        assert_eq!(BoundsPolicy::from_strict(false), BoundsPolicy::KeepDuration);
    }
}
