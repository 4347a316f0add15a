//! Core domain logic for ProjectHub.
//! Identity, projects, participation and likes over a key-value store.

pub mod avatar;
pub mod config;
pub mod db;
pub mod hub;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use avatar::avatar_url;
pub use config::{ConfigError, HubConfig};
pub use db::{open_db, open_db_in_memory, DbError};
pub use hub::{HubError, HubResult, ProfileView, ProjectDetail, ProjectHub};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::like::LikeState;
pub use model::participant::{JoinRequest, ParticipantRecord, RecordId};
pub use model::project::{Project, ProjectDraft, ProjectId, ProjectPatch, ProjectStatus};
pub use model::user::{ChangePasswordRequest, RegisterRequest, User, UserId, UserProfile};
pub use repo::kv_store::{KvStore, MemoryKvStore, RepoError, RepoResult, SqliteKvStore};
pub use service::comment_tree::{build_comment_tree, CommentNode};
pub use service::listing::{ProjectListing, ProjectQuery, SortOrder};

/// Minimal health-check API for integration smoke tests.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
