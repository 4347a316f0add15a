//! Project repository.
//!
//! # Invariants
//! - Write paths call `Project::validate()` before touching storage.
//! - Collection order is insertion order; sorting belongs to queries.

use crate::model::project::{Project, ProjectId, ProjectValidationError};
use crate::repo::kv_store::{load_json, store_json, KvStore, RepoError, RepoResult, PROJECTS_KEY};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Repository interface for project records.
pub trait ProjectRepository {
    fn list_projects(&self) -> &[Project];
    fn get_project(&self, id: ProjectId) -> Option<&Project>;
    fn insert_project(&mut self, project: Project) -> ProjectRepoResult<()>;
    fn update_project(&mut self, project: &Project) -> ProjectRepoResult<()>;
    /// Removes and returns the project, `NotFound` when absent.
    fn delete_project(&mut self, id: ProjectId) -> ProjectRepoResult<Project>;
}

pub type ProjectRepoResult<T> = Result<T, ProjectRepoError>;

/// Project write failures: validation or storage.
#[derive(Debug)]
pub enum ProjectRepoError {
    Validation(ProjectValidationError),
    Repo(RepoError),
}

impl Display for ProjectRepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ProjectRepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<ProjectValidationError> for ProjectRepoError {
    fn from(value: ProjectValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ProjectRepoError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

/// Key-value backed project repository.
pub struct KvProjectRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    projects: Vec<Project>,
}

impl<'s, S: KvStore + ?Sized> KvProjectRepository<'s, S> {
    pub fn load(store: &'s S) -> RepoResult<Self> {
        let projects = load_json(store, PROJECTS_KEY)?.unwrap_or_default();
        Ok(Self { store, projects })
    }

    fn flush(&mut self, projects: Vec<Project>) -> RepoResult<()> {
        store_json(self.store, PROJECTS_KEY, &projects)?;
        self.projects = projects;
        Ok(())
    }
}

impl<S: KvStore + ?Sized> ProjectRepository for KvProjectRepository<'_, S> {
    fn list_projects(&self) -> &[Project] {
        &self.projects
    }

    fn get_project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.iter().find(|project| project.id == id)
    }

    fn insert_project(&mut self, project: Project) -> ProjectRepoResult<()> {
        project.validate()?;
        let mut next = self.projects.clone();
        next.push(project);
        self.flush(next)?;
        Ok(())
    }

    fn update_project(&mut self, project: &Project) -> ProjectRepoResult<()> {
        project.validate()?;
        let mut next = self.projects.clone();
        let slot = next
            .iter_mut()
            .find(|existing| existing.id == project.id)
            .ok_or(RepoError::NotFound(project.id))?;
        *slot = project.clone();
        self.flush(next)?;
        Ok(())
    }

    fn delete_project(&mut self, id: ProjectId) -> ProjectRepoResult<Project> {
        let mut next = self.projects.clone();
        let index = next
            .iter()
            .position(|project| project.id == id)
            .ok_or(RepoError::NotFound(id))?;
        let removed = next.remove(index);
        self.flush(next)?;
        Ok(removed)
    }
}
