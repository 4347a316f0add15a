//! Participation and comment use-case service.
//!
//! # Responsibility
//! - Record joins, comments and replies on projects.
//! - Moderate records under the project owner/admin rule.
//!
//! # Invariants
//! - A reply's parent belongs to the same project.
//! - Deleting a record also deletes every transitive reply.
//! - Comment text is never logged.

use crate::model::now_epoch_ms;
use crate::model::participant::{JoinRequest, ParticipantRecord, RecordId};
use crate::model::project::{normalize_optional_text, Project, ProjectId};
use crate::model::user::{UserId, UserProfile};
use crate::repo::kv_store::RepoError;
use crate::repo::participant_repo::ParticipantRepository;
use crate::service::access::AccessPolicy;
use crate::service::comment_tree::{build_comment_tree, CommentNode};
use log::{info, warn};
use std::collections::{HashMap, HashSet};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from participation operations.
#[derive(Debug)]
pub enum ParticipationError {
    Unauthenticated,
    /// Actor is neither the project owner nor the admin.
    Forbidden(ProjectId),
    /// Unknown participation record.
    NotFound(RecordId),
    ProjectNotFound(ProjectId),
    /// Reply target missing from the project.
    ParentNotFound(RecordId),
    Repo(RepoError),
}

impl ParticipationError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) | Self::ProjectNotFound(_) => "not_found",
            Self::ParentNotFound(_) => "parent_not_found",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for ParticipationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "login required"),
            Self::Forbidden(id) => write!(f, "not allowed to moderate project {id}"),
            Self::NotFound(id) => write!(f, "participation record not found: {id}"),
            Self::ProjectNotFound(id) => write!(f, "project not found: {id}"),
            Self::ParentNotFound(id) => write!(f, "reply target not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ParticipationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ParticipationError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Participation service facade over a participant repository.
pub struct ParticipationService<R: ParticipantRepository> {
    repo: R,
    policy: AccessPolicy,
}

impl<R: ParticipantRepository> ParticipationService<R> {
    pub fn new(repo: R, policy: AccessPolicy) -> Self {
        Self { repo, policy }
    }

    /// Adds a join, comment or reply by `actor` on `project`.
    pub fn join(
        &mut self,
        actor: Option<&UserProfile>,
        project: &Project,
        request: JoinRequest,
    ) -> Result<ParticipantRecord, ParticipationError> {
        let actor = actor.ok_or(ParticipationError::Unauthenticated)?;
        if let Some(parent_id) = request.parent_id {
            let parent_in_project = self
                .repo
                .get_record(parent_id)
                .is_some_and(|parent| parent.project_id == project.id);
            if !parent_in_project {
                warn!(
                    "event=participant_join module=participation status=error project_id={} error_code=parent_not_found",
                    project.id
                );
                return Err(ParticipationError::ParentNotFound(parent_id));
            }
        }

        let record = ParticipantRecord {
            id: Uuid::now_v7(),
            project_id: project.id,
            user_id: actor.id,
            name: actor.name.clone(),
            surname: actor.surname.clone(),
            comment: normalize_optional_text(request.comment),
            parent_id: request.parent_id,
            created_at: now_epoch_ms(),
        };
        self.repo.insert_record(record.clone())?;
        info!(
            "event=participant_join module=participation status=ok project_id={} record_id={} user_id={} reply={}",
            project.id,
            record.id,
            actor.id,
            record.parent_id.is_some()
        );
        Ok(record)
    }

    /// Deletes a record and all of its transitive replies.
    ///
    /// `projects` resolves the record's project for the authority check;
    /// records of a missing project may only be removed by the admin.
    /// Returns the removed ids in collection order.
    pub fn delete_record(
        &mut self,
        actor: Option<&UserProfile>,
        record_id: RecordId,
        projects: &[Project],
    ) -> Result<Vec<RecordId>, ParticipationError> {
        let actor = actor.ok_or(ParticipationError::Unauthenticated)?;
        let record = self
            .repo
            .get_record(record_id)
            .ok_or(ParticipationError::NotFound(record_id))?;
        let project_id = record.project_id;
        let allowed = match projects.iter().find(|project| project.id == project_id) {
            Some(project) => self.policy.can_moderate(project, actor),
            None => self.policy.is_admin(actor),
        };
        if !allowed {
            warn!(
                "event=participant_delete module=participation status=error project_id={} record_id={} user_id={} error_code=forbidden",
                project_id, record_id, actor.id
            );
            return Err(ParticipationError::Forbidden(project_id));
        }

        let doomed = self.reply_closure(record_id, project_id);
        let removed: Vec<RecordId> = self
            .repo
            .list_records()
            .iter()
            .filter(|record| doomed.contains(&record.id))
            .map(|record| record.id)
            .collect();
        self.repo.remove_records(&doomed)?;
        info!(
            "event=participant_delete module=participation status=ok project_id={} record_id={} removed={}",
            project_id,
            record_id,
            removed.len()
        );
        Ok(removed)
    }

    /// Removes every record of `project` under the moderation rule.
    pub fn clear_project(
        &mut self,
        actor: Option<&UserProfile>,
        project: &Project,
    ) -> Result<usize, ParticipationError> {
        let actor = actor.ok_or(ParticipationError::Unauthenticated)?;
        if !self.policy.can_moderate(project, actor) {
            warn!(
                "event=participant_clear module=participation status=error project_id={} user_id={} error_code=forbidden",
                project.id, actor.id
            );
            return Err(ParticipationError::Forbidden(project.id));
        }
        let removed = self.repo.remove_project_records(project.id)?;
        info!(
            "event=participant_clear module=participation status=ok project_id={} removed={}",
            project.id, removed
        );
        Ok(removed)
    }

    /// Drops the records of a deleted project without an authority check.
    pub fn purge_project(&mut self, project_id: ProjectId) -> Result<usize, ParticipationError> {
        Ok(self.repo.remove_project_records(project_id)?)
    }

    pub fn get_record(&self, id: RecordId) -> Option<&ParticipantRecord> {
        self.repo.get_record(id)
    }

    /// All records of a project, insertion order.
    pub fn records_for_project(&self, project_id: ProjectId) -> Vec<&ParticipantRecord> {
        self.repo
            .list_records()
            .iter()
            .filter(|record| record.project_id == project_id)
            .collect()
    }

    /// Top-level joins and comments of a project.
    pub fn participants(&self, project_id: ProjectId) -> Vec<&ParticipantRecord> {
        self.repo
            .list_records()
            .iter()
            .filter(|record| record.project_id == project_id && record.is_top_level())
            .collect()
    }

    /// True when `user_id` has a top-level record in the project. Replies
    /// alone do not count as joining.
    pub fn has_joined(&self, project_id: ProjectId, user_id: UserId) -> bool {
        self.repo.list_records().iter().any(|record| {
            record.project_id == project_id && record.user_id == user_id && record.is_top_level()
        })
    }

    /// Count of all records of a project, replies included.
    pub fn participant_count(&self, project_id: ProjectId) -> usize {
        self.repo
            .list_records()
            .iter()
            .filter(|record| record.project_id == project_id)
            .count()
    }

    /// Timestamp of the newest record of a project.
    pub fn last_activity(&self, project_id: ProjectId) -> Option<i64> {
        self.repo
            .list_records()
            .iter()
            .filter(|record| record.project_id == project_id)
            .map(|record| record.created_at)
            .max()
    }

    /// Reply forest of a project.
    pub fn comment_thread(&self, project_id: ProjectId) -> Vec<CommentNode> {
        build_comment_tree(self.repo.list_records(), project_id)
    }

    /// `root` plus every record whose parent chain reaches it.
    fn reply_closure(&self, root: RecordId, project_id: ProjectId) -> HashSet<RecordId> {
        let mut children: HashMap<RecordId, Vec<RecordId>> = HashMap::new();
        for record in self.repo.list_records() {
            if record.project_id != project_id {
                continue;
            }
            if let Some(parent_id) = record.parent_id {
                children.entry(parent_id).or_default().push(record.id);
            }
        }

        let mut doomed = HashSet::from([root]);
        let mut pending = vec![root];
        while let Some(current) = pending.pop() {
            for &child in children.get(&current).into_iter().flatten() {
                if doomed.insert(child) {
                    pending.push(child);
                }
            }
        }
        doomed
    }
}
