//! Participation/comment repository.
//!
//! # Invariants
//! - All projects share one `participants` collection in insertion order.
//! - Bulk removals rewrite the collection once.

use crate::model::participant::{ParticipantRecord, RecordId};
use crate::model::project::ProjectId;
use crate::repo::kv_store::{load_json, store_json, KvStore, RepoResult, PARTICIPANTS_KEY};
use std::collections::HashSet;

/// Repository interface for participation records.
pub trait ParticipantRepository {
    /// Every record across projects, insertion order.
    fn list_records(&self) -> &[ParticipantRecord];
    fn get_record(&self, id: RecordId) -> Option<&ParticipantRecord>;
    fn insert_record(&mut self, record: ParticipantRecord) -> RepoResult<()>;
    /// Removes the listed ids; returns how many records were removed.
    fn remove_records(&mut self, ids: &HashSet<RecordId>) -> RepoResult<usize>;
    /// Removes all records of one project; returns how many were removed.
    fn remove_project_records(&mut self, project_id: ProjectId) -> RepoResult<usize>;
}

/// Key-value backed participation repository.
pub struct KvParticipantRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    records: Vec<ParticipantRecord>,
}

impl<'s, S: KvStore + ?Sized> KvParticipantRepository<'s, S> {
    pub fn load(store: &'s S) -> RepoResult<Self> {
        let records = load_json(store, PARTICIPANTS_KEY)?.unwrap_or_default();
        Ok(Self { store, records })
    }

    fn retain(&mut self, keep: impl Fn(&ParticipantRecord) -> bool) -> RepoResult<usize> {
        let before = self.records.len();
        let next: Vec<ParticipantRecord> = self
            .records
            .iter()
            .filter(|&record| keep(record))
            .cloned()
            .collect();
        let removed = before - next.len();
        if removed == 0 {
            return Ok(0);
        }
        store_json(self.store, PARTICIPANTS_KEY, &next)?;
        self.records = next;
        Ok(removed)
    }
}

impl<S: KvStore + ?Sized> ParticipantRepository for KvParticipantRepository<'_, S> {
    fn list_records(&self) -> &[ParticipantRecord] {
        &self.records
    }

    fn get_record(&self, id: RecordId) -> Option<&ParticipantRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    fn insert_record(&mut self, record: ParticipantRecord) -> RepoResult<()> {
        let mut next = self.records.clone();
        next.push(record);
        store_json(self.store, PARTICIPANTS_KEY, &next)?;
        self.records = next;
        Ok(())
    }

    fn remove_records(&mut self, ids: &HashSet<RecordId>) -> RepoResult<usize> {
        self.retain(|record| !ids.contains(&record.id))
    }

    fn remove_project_records(&mut self, project_id: ProjectId) -> RepoResult<usize> {
        self.retain(|record| record.project_id != project_id)
    }
}
