//! Project use-case service.
//!
//! # Responsibility
//! - Create, update and delete projects under ownership rules.
//! - Serve filtered listings and catalog helpers (tags, featured project).
//!
//! # Invariants
//! - Only the owner edits; owner or admin deletes.
//! - Authentication is checked before existence, existence before authority.

use crate::model::now_epoch_ms;
use crate::model::project::{
    normalize_optional_text, normalize_tags, Project, ProjectDraft, ProjectId, ProjectPatch,
};
use crate::model::user::{UserId, UserProfile};
use crate::repo::kv_store::RepoError;
use crate::repo::project_repo::{ProjectRepoError, ProjectRepository};
use crate::service::access::AccessPolicy;
use crate::service::listing::{ProjectListing, ProjectQuery};
use log::{info, warn};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Errors from project operations.
#[derive(Debug)]
pub enum ProjectServiceError {
    Unauthenticated,
    /// Actor lacks authority over the project.
    Forbidden(ProjectId),
    NotFound(ProjectId),
    /// Named field is blank.
    MissingRequiredField(&'static str),
    Repo(RepoError),
}

impl ProjectServiceError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden(_) => "forbidden",
            Self::NotFound(_) => "not_found",
            Self::MissingRequiredField(_) => "missing_required_field",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for ProjectServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "login required"),
            Self::Forbidden(id) => write!(f, "not allowed to change project {id}"),
            Self::NotFound(id) => write!(f, "project not found: {id}"),
            Self::MissingRequiredField(field) => write!(f, "field `{field}` must not be blank"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ProjectServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound(id) => Self::NotFound(id),
            other => Self::Repo(other),
        }
    }
}

impl From<ProjectRepoError> for ProjectServiceError {
    fn from(value: ProjectRepoError) -> Self {
        match value {
            ProjectRepoError::Validation(err) => Self::MissingRequiredField(err.field()),
            ProjectRepoError::Repo(err) => err.into(),
        }
    }
}

/// Project service facade over a project repository.
pub struct ProjectService<R: ProjectRepository> {
    repo: R,
    policy: AccessPolicy,
}

impl<R: ProjectRepository> ProjectService<R> {
    pub fn new(repo: R, policy: AccessPolicy) -> Self {
        Self { repo, policy }
    }

    /// Creates a project owned by `actor`.
    pub fn create_project(
        &mut self,
        actor: Option<&UserProfile>,
        draft: ProjectDraft,
    ) -> Result<Project, ProjectServiceError> {
        let actor = actor.ok_or(ProjectServiceError::Unauthenticated)?;
        let project = Project {
            id: Uuid::new_v4(),
            title: draft.title.trim().to_string(),
            description: draft.description.trim().to_string(),
            status: draft.status.unwrap_or_default(),
            image_url: normalize_optional_text(draft.image_url),
            tags: normalize_tags(&draft.tags),
            owner_id: actor.id,
            created_at: now_epoch_ms(),
        };

        self.repo.insert_project(project.clone()).map_err(|err| {
            let err = ProjectServiceError::from(err);
            warn!(
                "event=project_create module=project status=error user_id={} error_code={}",
                actor.id,
                err.code()
            );
            err
        })?;
        info!(
            "event=project_create module=project status=ok project_id={} user_id={}",
            project.id, actor.id
        );
        Ok(project)
    }

    /// Applies `patch` to a project the actor owns.
    pub fn update_project(
        &mut self,
        actor: Option<&UserProfile>,
        id: ProjectId,
        patch: ProjectPatch,
    ) -> Result<Project, ProjectServiceError> {
        let actor = actor.ok_or(ProjectServiceError::Unauthenticated)?;
        let mut project = self
            .repo
            .get_project(id)
            .cloned()
            .ok_or(ProjectServiceError::NotFound(id))?;
        if !self.policy.can_edit(&project, actor) {
            warn!(
                "event=project_update module=project status=error project_id={} user_id={} error_code=forbidden",
                id, actor.id
            );
            return Err(ProjectServiceError::Forbidden(id));
        }

        patch.apply_to(&mut project);
        self.repo.update_project(&project)?;
        info!(
            "event=project_update module=project status=ok project_id={} user_id={}",
            id, actor.id
        );
        Ok(project)
    }

    /// Checks that `actor` may delete project `id` without changing anything.
    pub fn authorize_delete(
        &self,
        actor: Option<&UserProfile>,
        id: ProjectId,
    ) -> Result<&Project, ProjectServiceError> {
        let actor = actor.ok_or(ProjectServiceError::Unauthenticated)?;
        let project = self
            .repo
            .get_project(id)
            .ok_or(ProjectServiceError::NotFound(id))?;
        if !self.policy.can_moderate(project, actor) {
            warn!(
                "event=project_delete module=project status=error project_id={} user_id={} error_code=forbidden",
                id, actor.id
            );
            return Err(ProjectServiceError::Forbidden(id));
        }
        Ok(project)
    }

    /// Deletes a project when the actor is its owner or the admin.
    ///
    /// Dependent participation records and like counters are left to the
    /// caller.
    pub fn delete_project(
        &mut self,
        actor: Option<&UserProfile>,
        id: ProjectId,
    ) -> Result<Project, ProjectServiceError> {
        let actor = actor.ok_or(ProjectServiceError::Unauthenticated)?;
        self.authorize_delete(Some(actor), id)?;
        let removed = self.repo.delete_project(id)?;
        info!(
            "event=project_delete module=project status=ok project_id={} user_id={}",
            id, actor.id
        );
        Ok(removed)
    }

    pub fn get_project(&self, id: ProjectId) -> Option<&Project> {
        self.repo.get_project(id)
    }

    pub fn all_projects(&self) -> &[Project] {
        self.repo.list_projects()
    }

    /// Lazy listing of projects matching `query`.
    pub fn list_projects(&self, query: &ProjectQuery) -> ProjectListing<'_> {
        ProjectListing::new(self.repo.list_projects(), query)
    }

    /// Distinct tags across all projects, first-seen order.
    pub fn available_tags(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        self.repo
            .list_projects()
            .iter()
            .flat_map(|project| project.tags.iter())
            .filter(|tag| seen.insert(*tag))
            .cloned()
            .collect()
    }

    /// Projects owned by `owner_id`, collection order.
    pub fn projects_by_owner(&self, owner_id: UserId) -> Vec<&Project> {
        self.repo
            .list_projects()
            .iter()
            .filter(|project| project.owner_id == owner_id)
            .collect()
    }

    /// Deterministic "project of the day" pick for `seed`.
    pub fn featured_project(&self, seed: u64) -> Option<&Project> {
        let projects = self.repo.list_projects();
        if projects.is_empty() {
            return None;
        }
        let index = (seed % projects.len() as u64) as usize;
        projects.get(index)
    }
}
