//! Runtime configuration for a [`ProjectHub`](crate::hub::ProjectHub).
//!
//! | Env Var                          | Default                 |
//! |----------------------------------|-------------------------|
//! | `PROJECTHUB_ADMIN_USERNAME`      | `admin`                 |
//! | `PROJECTHUB_DB_PATH`             | `projecthub.sqlite3`    |
//! | `PROJECTHUB_LOG_LEVEL`           | build-mode default      |
//! | `PROJECTHUB_LOG_DIR`             | unset (no file logging) |
//! | `PROJECTHUB_PASSWORD_MEMORY_KIB` | `19456`                 |
//! | `PROJECTHUB_PASSWORD_ITERATIONS` | `2`                     |

use crate::logging::default_log_level;
use crate::service::access::DEFAULT_ADMIN_USERNAME;
use crate::service::password::{CredentialError, CredentialHasher};
use argon2::Params;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

const ENV_ADMIN_USERNAME: &str = "PROJECTHUB_ADMIN_USERNAME";
const ENV_DB_PATH: &str = "PROJECTHUB_DB_PATH";
const ENV_LOG_LEVEL: &str = "PROJECTHUB_LOG_LEVEL";
const ENV_LOG_DIR: &str = "PROJECTHUB_LOG_DIR";
const ENV_PASSWORD_MEMORY_KIB: &str = "PROJECTHUB_PASSWORD_MEMORY_KIB";
const ENV_PASSWORD_ITERATIONS: &str = "PROJECTHUB_PASSWORD_ITERATIONS";

/// Default database file, relative to the working directory.
pub const DEFAULT_DB_PATH: &str = "projecthub.sqlite3";

/// Configuration loading failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// Variable is set but cannot be parsed.
    InvalidValue { var: &'static str, value: String },
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidValue { var, value } => {
                write!(f, "invalid value `{value}` for {var}")
            }
        }
    }
}

impl Error for ConfigError {}

/// Hub settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HubConfig {
    /// Username with moderation rights over every project.
    pub admin_username: String,
    pub db_path: PathBuf,
    pub log_level: String,
    /// Absolute log directory; `None` leaves logging uninitialized.
    pub log_dir: Option<PathBuf>,
    /// Argon2 memory cost in KiB.
    pub password_memory_kib: u32,
    /// Argon2 time cost.
    pub password_iterations: u32,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            admin_username: DEFAULT_ADMIN_USERNAME.to_string(),
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            log_level: default_log_level().to_string(),
            log_dir: None,
            password_memory_kib: Params::DEFAULT_M_COST,
            password_iterations: Params::DEFAULT_T_COST,
        }
    }
}

impl HubConfig {
    /// Loads configuration from `PROJECTHUB_*` environment variables.
    ///
    /// Unset or blank variables keep their defaults.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |var: &str| {
            lookup(var)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let mut config = Self::default();

        if let Some(admin) = read(ENV_ADMIN_USERNAME) {
            config.admin_username = admin;
        }
        if let Some(path) = read(ENV_DB_PATH) {
            config.db_path = PathBuf::from(path);
        }
        if let Some(level) = read(ENV_LOG_LEVEL) {
            config.log_level = level;
        }
        config.log_dir = read(ENV_LOG_DIR).map(PathBuf::from);
        if let Some(value) = read(ENV_PASSWORD_MEMORY_KIB) {
            config.password_memory_kib = parse_u32(ENV_PASSWORD_MEMORY_KIB, value)?;
        }
        if let Some(value) = read(ENV_PASSWORD_ITERATIONS) {
            config.password_iterations = parse_u32(ENV_PASSWORD_ITERATIONS, value)?;
        }
        Ok(config)
    }

    /// Builds the credential hasher for the configured cost.
    pub fn credential_hasher(&self) -> Result<CredentialHasher, CredentialError> {
        CredentialHasher::new(self.password_memory_kib, self.password_iterations)
    }
}

fn parse_u32(var: &'static str, value: String) -> Result<u32, ConfigError> {
    value
        .parse()
        .map_err(|_| ConfigError::InvalidValue { var, value })
}
