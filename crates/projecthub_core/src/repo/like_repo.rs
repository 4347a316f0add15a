//! Like counter and per-user like-set repository.
//!
//! # Invariants
//! - `projectLikes` is cached in memory; `userLikes_<id>` sets are read on
//!   demand since only the acting user's set is ever needed.
//! - A toggle writes the counter map first, then the user's set.

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use crate::repo::kv_store::{
    load_json, store_json, user_likes_key, KvStore, RepoResult, PROJECT_LIKES_KEY,
};
use std::collections::BTreeMap;

/// Repository interface for like bookkeeping.
pub trait LikeRepository {
    fn like_count(&self, project_id: ProjectId) -> u64;
    /// Project ids liked by `user_id`, in like order.
    fn user_likes(&self, user_id: UserId) -> RepoResult<Vec<ProjectId>>;
    /// Persists a new counter value together with the user's like set.
    fn save_toggle(
        &mut self,
        project_id: ProjectId,
        count: u64,
        user_id: UserId,
        user_likes: &[ProjectId],
    ) -> RepoResult<()>;
    /// Drops the counter entry of a project.
    fn remove_counter(&mut self, project_id: ProjectId) -> RepoResult<()>;
}

/// Key-value backed like repository.
pub struct KvLikeRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    counts: BTreeMap<ProjectId, u64>,
}

impl<'s, S: KvStore + ?Sized> KvLikeRepository<'s, S> {
    pub fn load(store: &'s S) -> RepoResult<Self> {
        let counts = load_json(store, PROJECT_LIKES_KEY)?.unwrap_or_default();
        Ok(Self { store, counts })
    }
}

impl<S: KvStore + ?Sized> LikeRepository for KvLikeRepository<'_, S> {
    fn like_count(&self, project_id: ProjectId) -> u64 {
        self.counts.get(&project_id).copied().unwrap_or(0)
    }

    fn user_likes(&self, user_id: UserId) -> RepoResult<Vec<ProjectId>> {
        Ok(load_json(self.store, &user_likes_key(user_id))?.unwrap_or_default())
    }

    fn save_toggle(
        &mut self,
        project_id: ProjectId,
        count: u64,
        user_id: UserId,
        user_likes: &[ProjectId],
    ) -> RepoResult<()> {
        let mut counts = self.counts.clone();
        counts.insert(project_id, count);
        store_json(self.store, PROJECT_LIKES_KEY, &counts)?;
        self.counts = counts;
        store_json(self.store, &user_likes_key(user_id), user_likes)
    }

    fn remove_counter(&mut self, project_id: ProjectId) -> RepoResult<()> {
        if !self.counts.contains_key(&project_id) {
            return Ok(());
        }
        let mut counts = self.counts.clone();
        counts.remove(&project_id);
        store_json(self.store, PROJECT_LIKES_KEY, &counts)?;
        self.counts = counts;
        Ok(())
    }
}
