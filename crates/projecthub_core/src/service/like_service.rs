//! Like toggling and counters.

use crate::model::like::LikeState;
use crate::model::project::ProjectId;
use crate::model::user::{UserId, UserProfile};
use crate::repo::kv_store::RepoError;
use crate::repo::like_repo::LikeRepository;
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Errors from like operations.
#[derive(Debug)]
pub enum LikeError {
    Unauthenticated,
    Repo(RepoError),
}

impl LikeError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for LikeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "login required"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for LikeError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            Self::Unauthenticated => None,
        }
    }
}

impl From<RepoError> for LikeError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

pub struct LikeService<R: LikeRepository> {
    repo: R,
}

impl<R: LikeRepository> LikeService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Flips the actor's like on `project_id` and returns the new state.
    ///
    /// The counter never drops below zero, even when the counter map and
    /// the user's like set disagree.
    pub fn toggle(
        &mut self,
        actor: Option<&UserProfile>,
        project_id: ProjectId,
    ) -> Result<LikeState, LikeError> {
        let actor = actor.ok_or(LikeError::Unauthenticated)?;
        let mut liked_projects = self.repo.user_likes(actor.id)?;
        let count = self.repo.like_count(project_id);

        let state = match liked_projects.iter().position(|id| *id == project_id) {
            Some(index) => {
                liked_projects.remove(index);
                LikeState {
                    liked: false,
                    count: count.saturating_sub(1),
                }
            }
            None => {
                liked_projects.push(project_id);
                LikeState {
                    liked: true,
                    count: count.saturating_add(1),
                }
            }
        };

        self.repo
            .save_toggle(project_id, state.count, actor.id, &liked_projects)?;
        info!(
            "event=like_toggle module=like status=ok project_id={} user_id={} liked={} count={}",
            project_id, actor.id, state.liked, state.count
        );
        Ok(state)
    }

    pub fn like_count(&self, project_id: ProjectId) -> u64 {
        self.repo.like_count(project_id)
    }

    pub fn has_liked(&self, project_id: ProjectId, user_id: UserId) -> Result<bool, LikeError> {
        Ok(self.repo.user_likes(user_id)?.contains(&project_id))
    }

    /// Projects liked by `user_id`, in like order.
    pub fn liked_projects(&self, user_id: UserId) -> Result<Vec<ProjectId>, LikeError> {
        Ok(self.repo.user_likes(user_id)?)
    }

    /// Drops the counter of a deleted project.
    ///
    /// Per-user like sets keep the stale id; they are only consulted
    /// together with an existing project.
    pub fn clear_project(&mut self, project_id: ProjectId) -> Result<(), LikeError> {
        Ok(self.repo.remove_counter(project_id)?)
    }
}
