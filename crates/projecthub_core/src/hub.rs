//! Presentation-facing facade over every store.
//!
//! # Responsibility
//! - Own the identity, project, participation and like services over one
//!   shared key-value backend.
//! - Use the persisted session user as the actor of every mutation.
//! - Keep cross-store effects together (project deletion cascades).

use crate::avatar::avatar_url;
use crate::config::HubConfig;
use crate::model::like::LikeState;
use crate::model::participant::{JoinRequest, ParticipantRecord, RecordId};
use crate::model::project::{Project, ProjectDraft, ProjectId, ProjectPatch};
use crate::model::user::{ChangePasswordRequest, RegisterRequest, User, UserId, UserProfile};
use crate::repo::kv_store::{KvStore, RepoError};
use crate::repo::like_repo::KvLikeRepository;
use crate::repo::participant_repo::KvParticipantRepository;
use crate::repo::project_repo::KvProjectRepository;
use crate::repo::user_repo::KvUserRepository;
use crate::service::access::AccessPolicy;
use crate::service::comment_tree::CommentNode;
use crate::service::identity_service::{IdentityError, IdentityService};
use crate::service::like_service::{LikeError, LikeService};
use crate::service::listing::{ProjectListing, ProjectQuery};
use crate::service::participation_service::{ParticipationError, ParticipationService};
use crate::service::password::CredentialError;
use crate::service::project_service::{ProjectService, ProjectServiceError};
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Any failure surfaced by the hub.
#[derive(Debug)]
pub enum HubError {
    Identity(IdentityError),
    Project(ProjectServiceError),
    Participation(ParticipationError),
    Like(LikeError),
    Credential(CredentialError),
    Repo(RepoError),
}

impl HubError {
    /// Stable code of the underlying failure.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Identity(err) => err.code(),
            Self::Project(err) => err.code(),
            Self::Participation(err) => err.code(),
            Self::Like(err) => err.code(),
            Self::Credential(_) => "credential_error",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for HubError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Identity(err) => write!(f, "{err}"),
            Self::Project(err) => write!(f, "{err}"),
            Self::Participation(err) => write!(f, "{err}"),
            Self::Like(err) => write!(f, "{err}"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for HubError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Identity(err) => Some(err),
            Self::Project(err) => Some(err),
            Self::Participation(err) => Some(err),
            Self::Like(err) => Some(err),
            Self::Credential(err) => Some(err),
            Self::Repo(err) => Some(err),
        }
    }
}

impl From<IdentityError> for HubError {
    fn from(value: IdentityError) -> Self {
        Self::Identity(value)
    }
}

impl From<ProjectServiceError> for HubError {
    fn from(value: ProjectServiceError) -> Self {
        Self::Project(value)
    }
}

impl From<ParticipationError> for HubError {
    fn from(value: ParticipationError) -> Self {
        Self::Participation(value)
    }
}

impl From<LikeError> for HubError {
    fn from(value: LikeError) -> Self {
        Self::Like(value)
    }
}

impl From<CredentialError> for HubError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

impl From<RepoError> for HubError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub type HubResult<T> = Result<T, HubError>;

/// Public profile page data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileView {
    pub profile: UserProfile,
    /// Uploaded image, if any.
    pub image: Option<String>,
    /// Generated fallback image.
    pub avatar_url: String,
    pub projects: Vec<Project>,
    pub project_count: usize,
}

/// Project page data.
#[derive(Debug)]
pub struct ProjectDetail<'a> {
    pub project: &'a Project,
    /// `None` when the owner account no longer exists.
    pub owner_username: Option<&'a str>,
    pub like_count: u64,
    /// Whether the session user likes the project.
    pub liked: bool,
    /// Top-level joins and comments.
    pub participants: Vec<&'a ParticipantRecord>,
    pub thread: Vec<CommentNode>,
    pub participant_count: usize,
    pub last_activity: Option<i64>,
}

/// Facade owning every store over the key-value backend `S`.
pub struct ProjectHub<'s, S: KvStore + ?Sized> {
    identity: IdentityService<KvUserRepository<'s, S>>,
    projects: ProjectService<KvProjectRepository<'s, S>>,
    participation: ParticipationService<KvParticipantRepository<'s, S>>,
    likes: LikeService<KvLikeRepository<'s, S>>,
}

impl<'s, S: KvStore + ?Sized> ProjectHub<'s, S> {
    /// Loads every collection from `store`, restoring the saved session.
    pub fn open(store: &'s S, config: &HubConfig) -> HubResult<Self> {
        let policy = AccessPolicy::new(config.admin_username.clone());
        let hub = Self {
            identity: IdentityService::new(
                KvUserRepository::load(store)?,
                config.credential_hasher()?,
            ),
            projects: ProjectService::new(KvProjectRepository::load(store)?, policy.clone()),
            participation: ParticipationService::new(
                KvParticipantRepository::load(store)?,
                policy,
            ),
            likes: LikeService::new(KvLikeRepository::load(store)?),
        };
        info!(
            "event=hub_open module=hub status=ok users={} projects={} session={}",
            hub.identity.list_users().len(),
            hub.projects.all_projects().len(),
            hub.identity.current_user().is_some()
        );
        Ok(hub)
    }

    // Identity

    pub fn register(&mut self, request: &RegisterRequest) -> HubResult<UserProfile> {
        Ok(self.identity.register(request)?)
    }

    pub fn login(&mut self, username_or_email: &str, password: &str) -> HubResult<UserProfile> {
        Ok(self.identity.authenticate(username_or_email, password)?)
    }

    pub fn logout(&mut self) -> HubResult<()> {
        Ok(self.identity.logout()?)
    }

    pub fn current_user(&self) -> Option<&UserProfile> {
        self.identity.current_user()
    }

    pub fn user(&self, id: UserId) -> Option<&User> {
        self.identity.get_user(id)
    }

    pub fn change_password(
        &mut self,
        user_id: UserId,
        request: &ChangePasswordRequest,
    ) -> HubResult<()> {
        let actor = self.identity.current_user().cloned();
        Ok(self
            .identity
            .change_password(actor.as_ref(), user_id, request)?)
    }

    pub fn update_profile_image(
        &mut self,
        user_id: UserId,
        image_data: impl Into<String>,
    ) -> HubResult<()> {
        let actor = self.identity.current_user().cloned();
        Ok(self
            .identity
            .update_profile_image(actor.as_ref(), user_id, image_data)?)
    }

    /// Profile page of `username` (case-insensitive).
    pub fn profile(&self, username: &str) -> HubResult<ProfileView> {
        let user = self
            .identity
            .find_by_username(username)
            .ok_or_else(|| IdentityError::UserNotFound(username.to_string()))?;
        let projects: Vec<Project> = self
            .projects
            .projects_by_owner(user.id)
            .into_iter()
            .cloned()
            .collect();
        Ok(ProfileView {
            profile: user.profile(),
            image: user.image.clone(),
            avatar_url: avatar_url(&user.name, &user.surname),
            project_count: projects.len(),
            projects,
        })
    }

    // Projects

    pub fn create_project(&mut self, draft: ProjectDraft) -> HubResult<Project> {
        let actor = self.identity.current_user();
        Ok(self.projects.create_project(actor, draft)?)
    }

    pub fn update_project(&mut self, id: ProjectId, patch: ProjectPatch) -> HubResult<Project> {
        let actor = self.identity.current_user();
        Ok(self.projects.update_project(actor, id, patch)?)
    }

    /// Deletes a project together with its participation records and like
    /// counter.
    pub fn delete_project(&mut self, id: ProjectId) -> HubResult<Project> {
        let actor = self.identity.current_user();
        self.projects.authorize_delete(actor, id)?;
        // Dependents are removed before the project itself. A failed write
        // leaves the project in place for a retry.
        let purged = self.participation.purge_project(id)?;
        self.likes.clear_project(id)?;
        let removed = self.projects.delete_project(actor, id)?;
        info!(
            "event=project_cascade module=hub status=ok project_id={} records_removed={}",
            id, purged
        );
        Ok(removed)
    }

    pub fn project(&self, id: ProjectId) -> Option<&Project> {
        self.projects.get_project(id)
    }

    pub fn projects(&self, query: &ProjectQuery) -> ProjectListing<'_> {
        self.projects.list_projects(query)
    }

    pub fn available_tags(&self) -> Vec<String> {
        self.projects.available_tags()
    }

    pub fn featured_project(&self, seed: u64) -> Option<&Project> {
        self.projects.featured_project(seed)
    }

    // Participation

    /// Joins, comments or replies on `project_id` as the session user.
    pub fn join(
        &mut self,
        project_id: ProjectId,
        request: JoinRequest,
    ) -> HubResult<ParticipantRecord> {
        let actor = self.identity.current_user();
        if actor.is_none() {
            return Err(ParticipationError::Unauthenticated.into());
        }
        let project = self
            .projects
            .get_project(project_id)
            .ok_or(ParticipationError::ProjectNotFound(project_id))?;
        Ok(self.participation.join(actor, project, request)?)
    }

    pub fn reply(
        &mut self,
        project_id: ProjectId,
        parent_id: RecordId,
        text: impl Into<String>,
    ) -> HubResult<ParticipantRecord> {
        self.join(project_id, JoinRequest::reply(parent_id, text))
    }

    /// Deletes a record and its replies; returns the removed ids.
    pub fn delete_participant(&mut self, record_id: RecordId) -> HubResult<Vec<RecordId>> {
        let actor = self.identity.current_user();
        Ok(self
            .participation
            .delete_record(actor, record_id, self.projects.all_projects())?)
    }

    pub fn clear_participants(&mut self, project_id: ProjectId) -> HubResult<usize> {
        let actor = self.identity.current_user();
        if actor.is_none() {
            return Err(ParticipationError::Unauthenticated.into());
        }
        let project = self
            .projects
            .get_project(project_id)
            .ok_or(ParticipationError::ProjectNotFound(project_id))?;
        Ok(self.participation.clear_project(actor, project)?)
    }

    pub fn has_joined(&self, project_id: ProjectId, user_id: UserId) -> bool {
        self.participation.has_joined(project_id, user_id)
    }

    // Likes

    pub fn toggle_like(&mut self, project_id: ProjectId) -> HubResult<LikeState> {
        let actor = self.identity.current_user();
        if actor.is_some() && self.projects.get_project(project_id).is_none() {
            warn!(
                "event=like_toggle module=hub status=error project_id={} error_code=not_found",
                project_id
            );
            return Err(ProjectServiceError::NotFound(project_id).into());
        }
        Ok(self.likes.toggle(actor, project_id)?)
    }

    pub fn like_count(&self, project_id: ProjectId) -> u64 {
        self.likes.like_count(project_id)
    }

    pub fn has_liked(&self, project_id: ProjectId, user_id: UserId) -> HubResult<bool> {
        Ok(self.likes.has_liked(project_id, user_id)?)
    }

    /// Existing projects liked by `user_id`, in like order.
    pub fn liked_projects(&self, user_id: UserId) -> HubResult<Vec<&Project>> {
        Ok(self
            .likes
            .liked_projects(user_id)?
            .into_iter()
            .filter_map(|id| self.projects.get_project(id))
            .collect())
    }

    /// Everything the project page shows.
    pub fn project_detail(&self, project_id: ProjectId) -> HubResult<ProjectDetail<'_>> {
        let project = self
            .projects
            .get_project(project_id)
            .ok_or(ProjectServiceError::NotFound(project_id))?;
        let liked = match self.identity.current_user() {
            Some(actor) => self.likes.has_liked(project_id, actor.id)?,
            None => false,
        };
        Ok(ProjectDetail {
            project,
            owner_username: self
                .identity
                .get_user(project.owner_id)
                .map(|owner| owner.username.as_str()),
            like_count: self.likes.like_count(project_id),
            liked,
            participants: self.participation.participants(project_id),
            thread: self.participation.comment_thread(project_id),
            participant_count: self.participation.participant_count(project_id),
            last_activity: self.participation.last_activity(project_id),
        })
    }
}
