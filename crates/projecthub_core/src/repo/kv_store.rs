//! Key-value persistence contract and its SQLite/in-memory backends.
//!
//! # Responsibility
//! - Provide synchronous `get/set/remove` by string key.
//! - Own JSON encoding/decoding of stored values.
//!
//! # Invariants
//! - Values are JSON text; a key holding undecodable JSON is reported as
//!   `RepoError::Decode`, never silently reset.
//! - Writes are last-write-wins per key; there is no cross-key transaction.

use crate::db::migrations::{latest_version, schema_version};
use crate::db::DbError;
use crate::model::user::UserId;
use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Key holding the user collection.
pub const USERS_KEY: &str = "users";
/// Key holding the project collection.
pub const PROJECTS_KEY: &str = "projects";
/// Key holding every participation/comment record.
pub const PARTICIPANTS_KEY: &str = "participants";
/// Key holding the project id -> like count map.
pub const PROJECT_LIKES_KEY: &str = "projectLikes";
/// Key holding the logged-in user's public profile.
pub const SESSION_KEY: &str = "loggedInUser";

const USER_LIKES_KEY_PREFIX: &str = "userLikes_";

/// Key holding the liked project ids of one user.
pub fn user_likes_key(user_id: UserId) -> String {
    format!("{USER_LIKES_KEY_PREFIX}{user_id}")
}

pub type RepoResult<T> = Result<T, RepoError>;

/// Persistence error shared by every repository.
#[derive(Debug)]
pub enum RepoError {
    Db(DbError),
    /// Stored value under `key` is not valid JSON for its record type.
    Decode {
        key: String,
        source: serde_json::Error,
    },
    Encode {
        key: String,
        source: serde_json::Error,
    },
    NotFound(Uuid),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::Decode { key, source } => {
                write!(f, "invalid persisted value under `{key}`: {source}")
            }
            Self::Encode { key, source } => {
                write!(f, "failed to encode value for `{key}`: {source}")
            }
            Self::NotFound(id) => write!(f, "record not found: {id}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "key-value store requires schema version {expected_version}, got {actual_version}"
            ),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::Decode { source, .. } | Self::Encode { source, .. } => Some(source),
            Self::NotFound(_) | Self::UninitializedConnection { .. } => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Synchronous string-keyed storage.
pub trait KvStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> RepoResult<()>;
    fn remove(&self, key: &str) -> RepoResult<()>;
}

/// Reads and decodes the JSON value under `key`.
pub fn load_json<T, S>(store: &S, key: &str) -> RepoResult<Option<T>>
where
    T: DeserializeOwned,
    S: KvStore + ?Sized,
{
    match store.get(key)? {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|source| RepoError::Decode {
                key: key.to_string(),
                source,
            }),
        None => Ok(None),
    }
}

/// Encodes `value` as JSON and writes it under `key`.
pub fn store_json<T, S>(store: &S, key: &str, value: &T) -> RepoResult<()>
where
    T: Serialize + ?Sized,
    S: KvStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(|source| RepoError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &raw)
}

/// SQLite-backed key-value store over the `kv_entries` table.
pub struct SqliteKvStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteKvStore<'conn> {
    /// Wraps a connection returned by [`crate::db::open_db`].
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        let expected_version = latest_version();
        let actual_version = schema_version(conn)?;
        if actual_version != expected_version {
            return Err(RepoError::UninitializedConnection {
                expected_version,
                actual_version,
            });
        }
        Ok(Self { conn })
    }

    /// Lists stored keys in ascending order.
    pub fn keys(&self) -> RepoResult<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT key FROM kv_entries ORDER BY key ASC;")?;
        let mut rows = stmt.query([])?;
        let mut keys = Vec::new();
        while let Some(row) = rows.next()? {
            keys.push(row.get(0)?);
        }
        Ok(keys)
    }
}

impl KvStore for SqliteKvStore<'_> {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM kv_entries WHERE key = ?1;",
                [key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.conn.execute(
            "INSERT INTO kv_entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = (strftime('%s', 'now') * 1000);",
            params![key, value],
        )?;
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.conn
            .execute("DELETE FROM kv_entries WHERE key = ?1;", [key])?;
        Ok(())
    }
}

/// Process-local store; contents vanish with the value.
#[derive(Debug, Default)]
pub struct MemoryKvStore {
    entries: RefCell<BTreeMap<String, String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> RepoResult<Option<String>> {
        Ok(self.entries.borrow().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> RepoResult<()> {
        self.entries
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> RepoResult<()> {
        self.entries.borrow_mut().remove(key);
        Ok(())
    }
}
