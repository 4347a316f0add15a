//! Ownership and moderation rules shared by project and participation use-cases.

use crate::model::project::Project;
use crate::model::user::UserProfile;

/// Username granted cross-project moderation rights when none is configured.
pub const DEFAULT_ADMIN_USERNAME: &str = "admin";

/// Authorization policy for project-scoped actions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessPolicy {
    admin_username: String,
}

impl Default for AccessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ADMIN_USERNAME)
    }
}

impl AccessPolicy {
    pub fn new(admin_username: impl Into<String>) -> Self {
        Self {
            admin_username: admin_username.into(),
        }
    }

    pub fn admin_username(&self) -> &str {
        &self.admin_username
    }

    pub fn is_admin(&self, actor: &UserProfile) -> bool {
        actor.username == self.admin_username
    }

    /// Only the owner may edit a project.
    pub fn can_edit(&self, project: &Project, actor: &UserProfile) -> bool {
        project.owner_id == actor.id
    }

    /// Owner or admin may delete a project and moderate its records.
    pub fn can_moderate(&self, project: &Project, actor: &UserProfile) -> bool {
        self.can_edit(project, actor) || self.is_admin(actor)
    }
}
