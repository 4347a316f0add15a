//! Project domain model.
//!
//! # Responsibility
//! - Define the canonical project record and its status lifecycle.
//! - Provide draft/patch input shapes and their normalization rules.
//!
//! # Invariants
//! - `title` and `description` are never blank.
//! - `tags` hold trimmed, non-empty, unique values in first-seen order.

use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ProjectId = Uuid;

/// Project progress state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    /// Idea stage; default for new projects.
    #[default]
    Planning,
    /// Work has started.
    InProgress,
    /// Finished.
    Completed,
}

impl ProjectStatus {
    /// Stable wire/display value.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
        }
    }

    /// Parses the wire value, accepting `_` as a separator too.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "planning" => Some(Self::Planning),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }
}

impl Display for ProjectStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored project record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub status: ProjectStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub owner_id: UserId,
    /// Creation time in epoch milliseconds.
    pub created_at: i64,
}

impl Project {
    /// Checks record-level invariants before persistence.
    pub fn validate(&self) -> Result<(), ProjectValidationError> {
        if self.title.trim().is_empty() {
            return Err(ProjectValidationError::BlankTitle);
        }
        if self.description.trim().is_empty() {
            return Err(ProjectValidationError::BlankDescription);
        }
        Ok(())
    }

    /// Whether every tag in `required` is present on this project.
    pub fn has_all_tags<S: AsRef<str>>(&self, required: &[S]) -> bool {
        required
            .iter()
            .all(|tag| self.tags.iter().any(|own| own == tag.as_ref()))
    }
}

/// Input for project creation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectDraft {
    pub title: String,
    pub description: String,
    /// Falls back to [`ProjectStatus::Planning`].
    pub status: Option<ProjectStatus>,
    pub image_url: Option<String>,
    pub tags: Vec<String>,
}

/// Partial update for an existing project; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<ProjectStatus>,
    /// `Some("")` clears the image.
    pub image_url: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl ProjectPatch {
    /// Applies this patch onto `project` in place.
    pub fn apply_to(self, project: &mut Project) {
        if let Some(title) = self.title {
            project.title = title.trim().to_string();
        }
        if let Some(description) = self.description {
            project.description = description.trim().to_string();
        }
        if let Some(status) = self.status {
            project.status = status;
        }
        if let Some(image_url) = self.image_url {
            project.image_url = normalize_optional_text(Some(image_url));
        }
        if let Some(tags) = self.tags {
            project.tags = normalize_tags(&tags);
        }
    }
}

/// Record-level validation failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectValidationError {
    BlankTitle,
    BlankDescription,
}

impl ProjectValidationError {
    /// Name of the offending field.
    pub fn field(self) -> &'static str {
        match self {
            Self::BlankTitle => "title",
            Self::BlankDescription => "description",
        }
    }
}

impl Display for ProjectValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "project {} must not be blank", self.field())
    }
}

impl Error for ProjectValidationError {}

/// Trims tags, drops blank ones and removes duplicates keeping first occurrence.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    tags.iter()
        .map(|tag| tag.as_ref().trim())
        .filter(|tag| !tag.is_empty())
        .filter(|tag| seen.insert(tag.to_string()))
        .map(str::to_string)
        .collect()
}

/// Trims optional free text; blank becomes `None`.
pub fn normalize_optional_text(value: Option<String>) -> Option<String> {
    value
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
}
