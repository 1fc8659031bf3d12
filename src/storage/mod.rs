//! Storage Layer - SQLite-backed persistence
//!
//! System of record is SQLite with tables:
//! - nodes(gid, name, attributes)
//! - keywords(kid, name)
//! - relations(from_, to_, field, attributes)
//!
//! `mapper`, `keyword` and `fetch` are generic over [`Gateway`], so they run
//! the same against the ambient connection or an open [`Scope`].

pub mod fetch;
pub mod gateway;
pub mod keyword;
pub mod mapper;
pub mod schema;
pub mod scope;
pub mod sqlite;

pub use gateway::Gateway;
pub use scope::Scope;
pub use sqlite::{Repo, RepoStats};
