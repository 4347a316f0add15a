//! Like toggle state.

use serde::{Deserialize, Serialize};

/// State of one (user, project) like pair after a toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    /// Whether the user currently likes the project.
    pub liked: bool,
    /// Shared like counter of the project.
    pub count: u64,
}
