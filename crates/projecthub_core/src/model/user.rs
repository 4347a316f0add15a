//! User identity records.
//!
//! # Invariants
//! - `username` and `email` are unique across all users.
//! - `password_hash` is an Argon2id PHC string, never plaintext.
//! - [`UserProfile`] never carries credential material.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type UserId = Uuid;

/// Stored user record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    /// Data URL or remote URL of the uploaded profile image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl User {
    /// Projects the public view of this user.
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            surname: self.surname.clone(),
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }

    /// Whether `identifier` names this user by username or email.
    pub fn matches_login(&self, identifier: &str) -> bool {
        self.username == identifier || self.email == identifier
    }
}

/// Public profile view, also persisted as the logged-in session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
}

/// Registration form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegisterRequest {
    pub name: String,
    pub surname: String,
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Password change form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
    pub confirm_new_password: String,
}
