//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs.
//! - Enforce authentication and ownership rules before any write.

pub mod access;
pub mod comment_tree;
pub mod identity_service;
pub mod like_service;
pub mod listing;
pub mod participation_service;
pub mod password;
pub mod project_service;
