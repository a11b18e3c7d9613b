//! In-memory store used by unit tests.

use std::collections::HashMap;
use std::convert::Infallible;

use crate::entry::{EntryDetails, TimeEntry};
use crate::store::{EntryQuery, Finish, SortOrder, TimeEntryStore};
use crate::types::{EntryId, OwnerId, ProjectId};

#[derive(Debug, Default)]
pub struct MemoryStore {
    pub entries: Vec<TimeEntry>,
    projects: HashMap<ProjectId, (String, Option<String>)>,
}

impl MemoryStore {
    pub fn add_project(&mut self, id: &str, name: &str, color: Option<&str>) -> ProjectId {
        let project_id = ProjectId::new(id).unwrap();
        self.projects.insert(
            project_id.clone(),
            (name.to_string(), color.map(str::to_string)),
        );
        project_id
    }

    fn details(&self, entry: &TimeEntry) -> EntryDetails {
        let project = entry
            .project_id
            .as_ref()
            .and_then(|id| self.projects.get(id));
        EntryDetails {
            entry: entry.clone(),
            project_name: project.map(|(name, _)| name.clone()),
            project_color: project.and_then(|(_, color)| color.clone()),
            task_title: None,
        }
    }

    fn position(&self, owner: &OwnerId, id: &EntryId) -> Option<usize> {
        self.entries
            .iter()
            .position(|e| &e.owner_id == owner && &e.id == id)
    }
}

impl TimeEntryStore for MemoryStore {
    type Error = Infallible;

    fn insert_running(&mut self, entry: &TimeEntry) -> Result<bool, Self::Error> {
        if self.running(&entry.owner_id)?.is_some() {
            return Ok(false);
        }
        self.entries.push(entry.clone());
        Ok(true)
    }

    fn insert(&mut self, entry: &TimeEntry) -> Result<(), Self::Error> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn get(&self, owner: &OwnerId, id: &EntryId) -> Result<Option<EntryDetails>, Self::Error> {
        Ok(self.position(owner, id).map(|i| self.details(&self.entries[i])))
    }

    fn running(&self, owner: &OwnerId) -> Result<Option<EntryDetails>, Self::Error> {
        Ok(self
            .entries
            .iter()
            .find(|e| &e.owner_id == owner && e.is_running())
            .map(|e| self.details(e)))
    }

    fn finish(
        &mut self,
        owner: &OwnerId,
        id: &EntryId,
        finish: &Finish,
    ) -> Result<bool, Self::Error> {
        let Some(index) = self.position(owner, id) else {
            return Ok(false);
        };
        let entry = &mut self.entries[index];
        if !entry.is_running() {
            return Ok(false);
        }
        entry.end_time = Some(finish.end_time);
        entry.duration_seconds = Some(finish.duration_seconds);
        if let Some(description) = &finish.description {
            entry.description.clone_from(description);
        }
        entry.updated_at = Some(finish.updated_at);
        Ok(true)
    }

    fn replace(&mut self, entry: &TimeEntry) -> Result<bool, Self::Error> {
        let Some(index) = self.position(&entry.owner_id, &entry.id) else {
            return Ok(false);
        };
        self.entries[index] = entry.clone();
        Ok(true)
    }

    fn delete(&mut self, owner: &OwnerId, id: &EntryId) -> Result<bool, Self::Error> {
        let Some(index) = self.position(owner, id) else {
            return Ok(false);
        };
        self.entries.remove(index);
        Ok(true)
    }

    fn list(&self, owner: &OwnerId, query: &EntryQuery) -> Result<Vec<EntryDetails>, Self::Error> {
        let mut matching: Vec<&TimeEntry> = self
            .entries
            .iter()
            .filter(|e| &e.owner_id == owner && query.matches(e))
            .collect();
        matching.sort_by_key(|e| e.start_time);
        if query.order == SortOrder::Descending {
            matching.reverse();
        }
        let limit = query.limit.unwrap_or(usize::MAX);
        Ok(matching
            .into_iter()
            .take(limit)
            .map(|e| self.details(e))
            .collect())
    }
}
