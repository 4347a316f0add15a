//! Repository layer over the key-value backend.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per store.
//! - Keep key naming and JSON encoding out of the service layer.
//!
//! # Invariants
//! - Each repository loads its collection once and flushes it on every
//!   mutation (last write wins per key).
//! - Repository APIs return semantic errors (`NotFound`) in addition to
//!   storage errors.

pub mod kv_store;
pub mod like_repo;
pub mod participant_repo;
pub mod project_repo;
pub mod user_repo;
