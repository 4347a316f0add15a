//! Participation/comment records.
//!
//! A record without `parent_id` is a top-level join or comment; a record with
//! `parent_id` is a reply inside the same project.

use crate::model::project::ProjectId;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Time-ordered (UUID v7) record identifier.
pub type RecordId = Uuid;

/// Stored participation/comment record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub id: RecordId,
    pub project_id: ProjectId,
    pub user_id: UserId,
    /// Author name at posting time.
    pub name: String,
    /// Author surname at posting time.
    pub surname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<RecordId>,
    /// Epoch milliseconds.
    pub created_at: i64,
}

impl ParticipantRecord {
    pub fn is_top_level(&self) -> bool {
        self.parent_id.is_none()
    }

    pub fn has_comment(&self) -> bool {
        self.comment.is_some()
    }
}

/// Join/comment/reply input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JoinRequest {
    /// Trimmed; blank text is stored as a plain join.
    pub comment: Option<String>,
    /// Record being replied to.
    pub parent_id: Option<RecordId>,
}

impl JoinRequest {
    /// Plain join without text.
    pub fn join() -> Self {
        Self::default()
    }

    /// Top-level comment.
    pub fn comment(text: impl Into<String>) -> Self {
        Self {
            comment: Some(text.into()),
            parent_id: None,
        }
    }

    /// Reply under `parent_id`.
    pub fn reply(parent_id: RecordId, text: impl Into<String>) -> Self {
        Self {
            comment: Some(text.into()),
            parent_id: Some(parent_id),
        }
    }
}
