//! Core domain logic for the time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Timer lifecycle: starting and stopping the single running entry per owner
//! - Manual entries: creating, patching and deleting completed entries
//! - Periods: resolving named periods to calendar ranges
//! - Aggregation and export: report series, CSV and printable report data
//!
//! Storage is abstracted behind [`TimeEntryStore`].

pub mod aggregate;
pub mod entry;
mod error;
pub mod export;
pub mod format;
pub mod manual;
#[cfg(test)]
mod memory;
pub mod period;
mod store;
pub mod timer;
pub mod timestamp;
pub mod types;

pub use aggregate::{Report, Scope, Stats};
pub use entry::{EntryDetails, EntryPatch, EntryView, NewEntry, StartTimer, TimeEntry};
pub use error::{Result, StorageError, TrackerError};
pub use export::{ExportFormat, ReportDocument};
pub use format::Locale;
pub use manual::BoundsPolicy;
pub use period::{DateRange, PeriodKind, PeriodSelection, UtcRange};
pub use store::{EntryQuery, Finish, SortOrder, TimeEntryStore};
pub use timestamp::Calendar;
pub use types::{EntryId, OwnerId, ProjectId, TaskId, ValidationError};
