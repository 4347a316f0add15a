//! Identity use-case service.
//!
//! # Responsibility
//! - Register and authenticate users; own the logged-in session.
//! - Guard password changes and profile image uploads to the profile owner.
//!
//! # Invariants
//! - Usernames and emails are unique (exact, case-sensitive comparison).
//! - Credentials are stored only as Argon2id hashes.
//! - Log lines carry ids and error codes, never passwords or hashes.

use crate::model::project::normalize_optional_text;
use crate::model::user::{ChangePasswordRequest, RegisterRequest, User, UserId, UserProfile};
use crate::repo::kv_store::RepoError;
use crate::repo::user_repo::UserRepository;
use crate::service::password::{CredentialError, CredentialHasher};
use log::{info, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Upper bound for an uploaded profile image, in decoded bytes.
pub const MAX_PROFILE_IMAGE_BYTES: usize = 2 * 1024 * 1024;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex"));

/// Errors from identity operations.
#[derive(Debug)]
pub enum IdentityError {
    /// No logged-in user.
    Unauthenticated,
    /// Caller is not the profile owner.
    Forbidden,
    /// Named field is blank.
    MissingFields(&'static str),
    InvalidEmail(String),
    /// Username or email already registered.
    DuplicateUser,
    InvalidCredentials,
    /// New password and its confirmation differ.
    Mismatch,
    IncorrectCurrentPassword,
    PayloadTooLarge { size: usize, limit: usize },
    /// No user with this username or id.
    UserNotFound(String),
    Credential(CredentialError),
    Repo(RepoError),
}

impl IdentityError {
    /// Stable code used in log lines and by presentation layers.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Forbidden => "forbidden",
            Self::MissingFields(_) => "missing_fields",
            Self::InvalidEmail(_) => "invalid_email",
            Self::DuplicateUser => "duplicate_user",
            Self::InvalidCredentials => "invalid_credentials",
            Self::Mismatch => "mismatch",
            Self::IncorrectCurrentPassword => "incorrect_current_password",
            Self::PayloadTooLarge { .. } => "payload_too_large",
            Self::UserNotFound(_) => "not_found",
            Self::Credential(_) => "credential_error",
            Self::Repo(_) => "storage_error",
        }
    }
}

impl Display for IdentityError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthenticated => write!(f, "login required"),
            Self::Forbidden => write!(f, "only the profile owner may do this"),
            Self::MissingFields(field) => write!(f, "field `{field}` must not be empty"),
            Self::InvalidEmail(email) => write!(f, "invalid email address: `{email}`"),
            Self::DuplicateUser => write!(f, "username or email is already registered"),
            Self::InvalidCredentials => write!(f, "username/email or password is incorrect"),
            Self::Mismatch => write!(f, "new passwords do not match"),
            Self::IncorrectCurrentPassword => write!(f, "current password is incorrect"),
            Self::PayloadTooLarge { size, limit } => {
                write!(f, "image payload of {size} bytes exceeds limit of {limit} bytes")
            }
            Self::UserNotFound(who) => write!(f, "user not found: {who}"),
            Self::Credential(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for IdentityError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Credential(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for IdentityError {
    fn from(value: RepoError) -> Self {
        Self::Repo(value)
    }
}

impl From<CredentialError> for IdentityError {
    fn from(value: CredentialError) -> Self {
        Self::Credential(value)
    }
}

/// Identity service facade over a user repository.
pub struct IdentityService<R: UserRepository> {
    repo: R,
    hasher: CredentialHasher,
}

impl<R: UserRepository> IdentityService<R> {
    pub fn new(repo: R, hasher: CredentialHasher) -> Self {
        Self { repo, hasher }
    }

    /// Registers a new user and returns its public profile.
    ///
    /// Does not log the new user in.
    pub fn register(&mut self, request: &RegisterRequest) -> Result<UserProfile, IdentityError> {
        let name = required(&request.name, "name")?;
        let surname = required(&request.surname, "surname")?;
        let username = required(&request.username, "username")?;
        let email = required(&request.email, "email")?;
        if request.password.is_empty() {
            return Err(IdentityError::MissingFields("password"));
        }
        if !EMAIL_RE.is_match(&email) {
            return Err(IdentityError::InvalidEmail(email));
        }

        let taken = self
            .repo
            .list_users()
            .iter()
            .any(|user| user.username == username || user.email == email);
        if taken {
            warn!("event=user_register module=identity status=error error_code=duplicate_user");
            return Err(IdentityError::DuplicateUser);
        }

        let user = User {
            id: Uuid::new_v4(),
            name,
            surname,
            username,
            email,
            password_hash: self.hasher.hash(&request.password)?,
            image: None,
        };
        let profile = user.profile();
        self.repo.insert_user(user)?;
        info!(
            "event=user_register module=identity status=ok user_id={}",
            profile.id
        );
        Ok(profile)
    }

    /// Verifies credentials and stores the profile as the active session.
    pub fn authenticate(
        &mut self,
        username_or_email: &str,
        password: &str,
    ) -> Result<UserProfile, IdentityError> {
        let mut matched = None;
        for user in self
            .repo
            .list_users()
            .iter()
            .filter(|user| user.matches_login(username_or_email))
        {
            if self.hasher.verify(password, &user.password_hash)? {
                matched = Some(user.profile());
                break;
            }
        }

        let Some(profile) = matched else {
            warn!("event=user_login module=identity status=error error_code=invalid_credentials");
            return Err(IdentityError::InvalidCredentials);
        };

        self.repo.set_session(Some(profile.clone()))?;
        info!(
            "event=user_login module=identity status=ok user_id={}",
            profile.id
        );
        Ok(profile)
    }

    /// Clears the active session; no-op when nobody is logged in.
    pub fn logout(&mut self) -> Result<(), IdentityError> {
        if let Some(profile) = self.repo.session() {
            info!(
                "event=user_logout module=identity status=ok user_id={}",
                profile.id
            );
        }
        self.repo.set_session(None)?;
        Ok(())
    }

    /// Profile of the logged-in user, restored from storage at startup.
    pub fn current_user(&self) -> Option<&UserProfile> {
        self.repo.session()
    }

    /// Changes the password of `user_id`; only that user may do so.
    pub fn change_password(
        &mut self,
        actor: Option<&UserProfile>,
        user_id: UserId,
        request: &ChangePasswordRequest,
    ) -> Result<(), IdentityError> {
        let mut user = self.owned_user(actor, user_id)?;
        if request.new_password != request.confirm_new_password {
            return Err(IdentityError::Mismatch);
        }
        if request.current_password.is_empty() {
            return Err(IdentityError::MissingFields("current_password"));
        }
        if request.new_password.is_empty() {
            return Err(IdentityError::MissingFields("new_password"));
        }
        if !self
            .hasher
            .verify(&request.current_password, &user.password_hash)?
        {
            warn!(
                "event=password_change module=identity status=error user_id={} error_code=incorrect_current_password",
                user_id
            );
            return Err(IdentityError::IncorrectCurrentPassword);
        }

        user.password_hash = self.hasher.hash(&request.new_password)?;
        self.repo.update_user(&user)?;
        info!(
            "event=password_change module=identity status=ok user_id={}",
            user_id
        );
        Ok(())
    }

    /// Replaces the profile image of `user_id` with `image_data`.
    pub fn update_profile_image(
        &mut self,
        actor: Option<&UserProfile>,
        user_id: UserId,
        image_data: impl Into<String>,
    ) -> Result<(), IdentityError> {
        let mut user = self.owned_user(actor, user_id)?;
        let image_data = normalize_optional_text(Some(image_data.into()))
            .ok_or(IdentityError::MissingFields("image"))?;
        let size = image_payload_bytes(&image_data);
        if size > MAX_PROFILE_IMAGE_BYTES {
            return Err(IdentityError::PayloadTooLarge {
                size,
                limit: MAX_PROFILE_IMAGE_BYTES,
            });
        }

        user.image = Some(image_data);
        self.repo.update_user(&user)?;
        info!(
            "event=profile_image_update module=identity status=ok user_id={}",
            user_id
        );
        Ok(())
    }

    pub fn get_user(&self, id: UserId) -> Option<&User> {
        self.repo.get_user(id)
    }

    /// Finds a user by username, ignoring case.
    pub fn find_by_username(&self, username: &str) -> Option<&User> {
        let needle = username.trim().to_lowercase();
        self.repo
            .list_users()
            .iter()
            .find(|user| user.username.to_lowercase() == needle)
    }

    pub fn list_users(&self) -> &[User] {
        self.repo.list_users()
    }

    fn owned_user(
        &self,
        actor: Option<&UserProfile>,
        user_id: UserId,
    ) -> Result<User, IdentityError> {
        let actor = actor.ok_or(IdentityError::Unauthenticated)?;
        if actor.id != user_id {
            return Err(IdentityError::Forbidden);
        }
        self.repo
            .get_user(user_id)
            .cloned()
            .ok_or_else(|| IdentityError::UserNotFound(user_id.to_string()))
    }
}

fn required(value: &str, field: &'static str) -> Result<String, IdentityError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(IdentityError::MissingFields(field));
    }
    Ok(trimmed.to_string())
}

/// Size of the image behind `data`: decoded bytes for a base64 data URL,
/// text length for anything else.
fn image_payload_bytes(data: &str) -> usize {
    let encoded = data
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(";base64,"))
        .map(|(_, encoded)| encoded.trim_end());
    match encoded {
        Some(encoded) => {
            let padding = encoded.bytes().rev().take_while(|b| *b == b'=').count().min(2);
            (encoded.len() * 3 / 4).saturating_sub(padding)
        }
        None => data.len(),
    }
}
