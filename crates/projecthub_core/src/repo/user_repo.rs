//! User and session repository.
//!
//! # Responsibility
//! - Hold the `users` collection in memory, loaded once from storage.
//! - Own the persisted logged-in session (`loggedInUser`).
//!
//! # Invariants
//! - Storage is written before the in-memory copy changes, so a failed write
//!   leaves both sides untouched.

use crate::model::user::{User, UserId, UserProfile};
use crate::repo::kv_store::{
    load_json, store_json, KvStore, RepoError, RepoResult, SESSION_KEY, USERS_KEY,
};

/// Repository interface for users and the active session.
pub trait UserRepository {
    /// All users in registration order.
    fn list_users(&self) -> &[User];
    fn get_user(&self, id: UserId) -> Option<&User>;
    fn insert_user(&mut self, user: User) -> RepoResult<()>;
    /// Replaces the stored user with the same id.
    fn update_user(&mut self, user: &User) -> RepoResult<()>;
    fn session(&self) -> Option<&UserProfile>;
    /// Stores `profile` as the session, or clears it on `None`.
    fn set_session(&mut self, profile: Option<UserProfile>) -> RepoResult<()>;
}

/// Key-value backed user repository.
pub struct KvUserRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    users: Vec<User>,
    session: Option<UserProfile>,
}

impl<'s, S: KvStore + ?Sized> KvUserRepository<'s, S> {
    /// Loads users and session from `store`.
    pub fn load(store: &'s S) -> RepoResult<Self> {
        let users = load_json(store, USERS_KEY)?.unwrap_or_default();
        let session = load_json(store, SESSION_KEY)?;
        Ok(Self {
            store,
            users,
            session,
        })
    }

    fn flush(&mut self, users: Vec<User>) -> RepoResult<()> {
        store_json(self.store, USERS_KEY, &users)?;
        self.users = users;
        Ok(())
    }
}

impl<S: KvStore + ?Sized> UserRepository for KvUserRepository<'_, S> {
    fn list_users(&self) -> &[User] {
        &self.users
    }

    fn get_user(&self, id: UserId) -> Option<&User> {
        self.users.iter().find(|user| user.id == id)
    }

    fn insert_user(&mut self, user: User) -> RepoResult<()> {
        let mut next = self.users.clone();
        next.push(user);
        self.flush(next)
    }

    fn update_user(&mut self, user: &User) -> RepoResult<()> {
        let mut next = self.users.clone();
        let slot = next
            .iter_mut()
            .find(|existing| existing.id == user.id)
            .ok_or(RepoError::NotFound(user.id))?;
        *slot = user.clone();
        self.flush(next)
    }

    fn session(&self) -> Option<&UserProfile> {
        self.session.as_ref()
    }

    fn set_session(&mut self, profile: Option<UserProfile>) -> RepoResult<()> {
        match profile.as_ref() {
            Some(profile) => store_json(self.store, SESSION_KEY, profile)?,
            None => self.store.remove(SESSION_KEY)?,
        }
        self.session = profile;
        Ok(())
    }
}
