//! # Relgraph - labeled property graph over SQLite
//!
//! Persists a directed, labeled property graph inside a relational store.
//!
//! Relgraph provides:
//! - Nodes with a unique name and opaque JSON attributes
//! - An interned vocabulary of relation labels (keywords)
//! - Relations unique per (from, to, label), updated in place on re-save
//! - Transaction scopes that gate all further work on the first failure
//! - Walk queries that rebuild relations together with both endpoints

pub mod config;
pub mod graph;
pub mod node;
pub mod relation;
pub mod storage;

use std::sync::Arc;

// Re-exports for convenient access
pub use graph::{Graph, GraphItem};
pub use node::{Node, NodeId};
pub use relation::{Keyword, KeywordId, Relation};
pub use storage::{Repo, RepoStats, Scope};

/// Result type alias for Relgraph operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for Relgraph operations
///
/// Storage errors are shared behind an `Arc` so a scope can hand the same
/// failure back to every call that follows it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Rejected before any statement was issued
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    /// Uniqueness, foreign key or attribute check violated by storage
    #[error("constraint violation: {0}")]
    Constraint(#[source] Arc<rusqlite::Error>),

    #[error("storage error: {0}")]
    Storage(#[source] Arc<rusqlite::Error>),
}

impl Error {
    /// Check if this error is a point lookup that found nothing
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Error::Constraint(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        if matches!(err, rusqlite::Error::QueryReturnedNoRows) {
            return Error::NotFound("no rows".to_string());
        }
        let constraint = matches!(
            &err,
            rusqlite::Error::SqliteFailure(code, _) if code.code == rusqlite::ErrorCode::ConstraintViolation
        );
        if constraint {
            Error::Constraint(Arc::new(err))
        } else {
            Error::Storage(Arc::new(err))
        }
    }
}
