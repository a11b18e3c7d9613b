//! Time entries and the inputs that create or change them.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::error::TrackerError;
use crate::format;
use crate::timestamp::parse_timestamp;
use crate::types::{EntryId, OwnerId, ProjectId, TaskId};

/// One tracked interval, or an interval still in progress.
///
/// `end_time == None` means the entry is running and `duration_seconds` is
/// `None` as well. Once both bounds are set, the duration equals
/// `end_time - start_time` in whole seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: EntryId,
    pub owner_id: OwnerId,
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration_seconds: Option<i64>,
    pub is_break: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl TimeEntry {
    pub const fn is_running(&self) -> bool {
        self.end_time.is_none()
    }

    /// Stored duration, or the live `now - start` for a running entry.
    pub fn elapsed_seconds(&self, now: DateTime<Utc>) -> i64 {
        self.duration_seconds
            .unwrap_or_else(|| duration_between(self.start_time, now).max(0))
    }
}

/// Whole seconds from `start` to `end`. Negative when `end` precedes `start`.
pub fn duration_between(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds()
}

/// Trims a free-text description; absent text becomes empty.
pub fn normalize_description(description: Option<&str>) -> String {
    description.map(str::trim).unwrap_or_default().to_string()
}

/// An entry joined with the display names of what it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryDetails {
    #[serde(flatten)]
    pub entry: TimeEntry,
    pub project_name: Option<String>,
    pub project_color: Option<String>,
    pub task_title: Option<String>,
}

impl EntryDetails {
    /// Details without any joined names.
    pub const fn bare(entry: TimeEntry) -> Self {
        Self {
            entry,
            project_name: None,
            project_color: None,
            task_title: None,
        }
    }

    /// Adds the live fields shown in list views.
    pub fn into_view(self, now: DateTime<Utc>) -> EntryView {
        let elapsed_seconds = self.entry.elapsed_seconds(now);
        EntryView {
            is_running: self.entry.is_running(),
            elapsed_seconds,
            elapsed_formatted: format::hh_mm_ss(elapsed_seconds),
            details: self,
        }
    }
}

/// An entry as shown in list and detail views.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    #[serde(flatten)]
    pub details: EntryDetails,
    pub is_running: bool,
    pub elapsed_seconds: i64,
    pub elapsed_formatted: String,
}

/// Input for starting a timer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StartTimer {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub description: Option<String>,
    pub is_break: bool,
}

/// Input for a manually created entry with both bounds known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub project_id: Option<ProjectId>,
    pub task_id: Option<TaskId>,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub is_break: bool,
}

impl NewEntry {
    /// An entry between two instants with no project or description.
    pub const fn between(start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        Self {
            project_id: None,
            task_id: None,
            description: None,
            start_time,
            end_time,
            is_break: false,
        }
    }

    /// Parses caller-supplied bounds. Both are required.
    pub fn parse_bounds(
        start_time: Option<&str>,
        end_time: Option<&str>,
        zone: Tz,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>), TrackerError> {
        let (Some(start), Some(end)) = (
            start_time.filter(|s| !s.trim().is_empty()),
            end_time.filter(|s| !s.trim().is_empty()),
        ) else {
            return Err(TrackerError::validation("Start- und Endzeit erforderlich"));
        };
        Ok((parse_timestamp(start, zone)?, parse_timestamp(end, zone)?))
    }
}

/// Partial update of an entry. `None` leaves a field untouched.
///
/// For the nullable references, `Some(None)` clears the reference.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryPatch {
    pub project_id: Option<Option<ProjectId>>,
    pub task_id: Option<Option<TaskId>>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub is_break: Option<bool>,
}

impl EntryPatch {
    pub const fn touches_bounds(&self) -> bool {
        self.start_time.is_some() || self.end_time.is_some()
    }

    pub const fn is_empty(&self) -> bool {
        self.project_id.is_none()
            && self.task_id.is_none()
            && self.description.is_none()
            && !self.touches_bounds()
            && self.is_break.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(end: Option<DateTime<Utc>>, duration: Option<i64>) -> TimeEntry {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 8, 0, 0).unwrap();
        TimeEntry {
            id: EntryId::new("e1").unwrap(),
            owner_id: OwnerId::new("u1").unwrap(),
            project_id: None,
            task_id: None,
            description: String::new(),
            start_time: start,
            end_time: end,
            duration_seconds: duration,
            is_break: false,
            created_at: start,
            updated_at: None,
        }
    }

    #[test]
    fn running_entry_elapsed_is_live() {
        let running = entry(None, None);
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 8, 30, 15).unwrap();
        assert!(running.is_running());
        assert_eq!(running.elapsed_seconds(now), 1815);
    }

    #[test]
    fn finished_entry_elapsed_is_stored_duration() {
        let end = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let finished = entry(Some(end), Some(14_400));
        let much_later = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(finished.elapsed_seconds(much_later), 14_400);
    }

    #[test]
    fn view_serializes_flat() {
        let details = EntryDetails {
            project_name: Some("Website".to_string()),
            ..EntryDetails::bare(entry(None, None))
        };
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        let json = serde_json::to_value(details.into_view(now)).unwrap();
        assert_eq!(json["id"], "e1");
        assert_eq!(json["project_name"], "Website");
        assert_eq!(json["is_running"], true);
        assert_eq!(json["elapsed_seconds"], 3600);
        assert_eq!(json["elapsed_formatted"], "01:00:00");
        assert_eq!(json["end_time"], serde_json::Value::Null);
    }

    #[test]
    fn parse_bounds_requires_both() {
        let err = NewEntry::parse_bounds(Some("2024-01-01 08:00:00"), None, Tz::UTC).unwrap_err();
        assert_eq!(err.to_string(), "Start- und Endzeit erforderlich");
        let err = NewEntry::parse_bounds(Some(""), Some("2024-01-01 08:00:00"), Tz::UTC).unwrap_err();
        assert_eq!(err.to_string(), "Start- und Endzeit erforderlich");
    }

    #[test]
    fn normalize_description_trims() {
        assert_eq!(normalize_description(Some("  Meeting ")), "Meeting");
        assert_eq!(normalize_description(None), "");
    }

    #[test]
    fn empty_patch() {
        assert!(EntryPatch::default().is_empty());
        let patch = EntryPatch {
            project_id: Some(None),
            ..EntryPatch::default()
        };
        assert!(!patch.is_empty());
        assert!(!patch.touches_bounds());
    }
}
