//! SQLite repository handle

use std::cell::RefCell;
use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, DropBehavior, TransactionBehavior};

use super::gateway::Gateway;
use super::scope::Scope;
use super::{fetch, keyword, schema};
use crate::config::RepoConfig;
use crate::node::{Node, NodeId};
use crate::relation::{Keyword, KeywordId, Relation};
use crate::{Error, Result};

/// SQLite-backed repository for the graph.
///
/// Reads on the handle itself run against the ambient connection. Writes
/// run inside a [`Scope`], opened explicitly with [`Repo::begin`] or
/// implicitly by the one-shot `save_*` helpers.
///
/// [`Repo::last_error`] holds the outcome of the last scope or maintenance
/// operation, or the last read on the handle that failed for any reason
/// other than a missing row.
///
/// The handle is not reentrant: callers sharing one across threads must
/// synchronize it themselves.
pub struct Repo {
    conn: Connection,
    behavior: TransactionBehavior,
    last_error: RefCell<Option<Error>>,
}

impl Repo {
    /// Open a database file (creates if doesn't exist)
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        Self::with_connection(conn, &RepoConfig::default())
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        Self::with_connection(conn, &RepoConfig::default())
    }

    /// Open the database described by `config`
    pub fn open_with(config: &RepoConfig) -> Result<Self> {
        let conn = match &config.database {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };
        Self::with_connection(conn, config)
    }

    fn with_connection(conn: Connection, config: &RepoConfig) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms))?;
        }

        let behavior = if config.immediate_transactions {
            TransactionBehavior::Immediate
        } else {
            TransactionBehavior::Deferred
        };

        let mut repo = Self {
            conn,
            behavior,
            last_error: RefCell::new(None),
        };
        if config.create_schema {
            repo.create()?;
        }
        Ok(repo)
    }

    /// The ambient connection, usable wherever a [`Gateway`] is expected
    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// The last error recorded on this handle
    pub fn last_error(&self) -> Option<Error> {
        self.last_error.borrow().clone()
    }

    // ========== Transactions ==========

    /// Open a transaction scope.
    ///
    /// Starting a scope is a fresh operation: it clears the handle's last
    /// recorded error.
    pub fn begin(&mut self) -> Result<Scope<'_>> {
        *self.last_error.get_mut() = None;
        let mut tx = match self.conn.transaction_with_behavior(self.behavior) {
            Ok(tx) => tx,
            Err(e) => {
                let err = Error::from(e);
                *self.last_error.get_mut() = Some(err.clone());
                return Err(err);
            }
        };
        tx.set_drop_behavior(DropBehavior::Rollback);
        tracing::debug!("Scope opened");
        Ok(Scope::new(tx, self.last_error.get_mut()))
    }

    /// Run `f` inside a new scope and finish it.
    ///
    /// The scope commits only if nothing inside it failed.
    pub fn in_scope<T>(&mut self, f: impl FnOnce(&mut Scope<'_>) -> Result<T>) -> Result<T> {
        let mut scope = self.begin()?;
        let value = f(&mut scope);
        scope.end()?;
        value
    }

    /// Save a node in its own scope
    pub fn save_node(&mut self, node: &mut Node) -> Result<()> {
        self.in_scope(|scope| scope.save_node(node))
    }

    /// Intern a keyword in its own scope
    pub fn save_keyword(&mut self, kw: &mut Keyword) -> Result<()> {
        self.in_scope(|scope| scope.save_keyword(kw))
    }

    /// Save a relation in its own scope
    pub fn save_relation(&mut self, rel: &mut Relation) -> Result<()> {
        self.in_scope(|scope| scope.save_relation(rel))
    }

    // ========== Reads ==========
    //
    // A missing row is an answer, not a failure; anything else is recorded.

    /// Fetch a node by id, or by name when `id` is unset
    pub fn fetch_node(&self, id: NodeId, name: &str) -> Result<Node> {
        self.record_read(fetch::node(&self.conn, id, name))
    }

    pub fn keyword_by_name(&self, name: &str) -> Result<Keyword> {
        self.record_read(keyword::by_name(&self.conn, name))
    }

    pub fn keyword_by_id(&self, id: KeywordId) -> Result<Keyword> {
        self.record_read(keyword::by_id(&self.conn, id))
    }

    pub fn fetch_relation(&self, from: NodeId, to: NodeId, label: &str) -> Result<Relation> {
        self.record_read(fetch::relation(&self.conn, from, to, label))
    }

    /// All relations leaving `from` under `label`
    pub fn walk(&self, from: NodeId, label: &str) -> Result<Vec<Relation>> {
        self.record_read(fetch::walk(&self.conn, from, label))
    }

    fn record_read<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if !err.is_not_found() {
                tracing::warn!("Read failed: {}", err);
                self.last_error.replace(Some(err.clone()));
            }
        }
        result
    }

    // ========== Maintenance ==========
    //
    // Best effort: every statement runs, the first error is kept.

    /// Create the schema if absent
    pub fn create(&mut self) -> Result<()> {
        let first = self.run_all(&schema::all_schema_statements());
        if first.is_none() {
            tracing::info!("Schema ready");
        }
        self.finish_maintenance(first)
    }

    /// Drop every table, then recreate an empty schema
    pub fn drop_all(&mut self) -> Result<()> {
        let mut first = self.run_all(schema::DROP_TABLES);
        if first.is_none() {
            tracing::info!("Dropped all tables");
            first = self.run_all(&schema::all_schema_statements());
        }
        self.finish_maintenance(first)
    }

    /// Delete every node and relation; keywords are kept
    pub fn delete_all(&mut self) -> Result<()> {
        let mut first = self.run_all(schema::DELETE_GRAPH);
        if first.is_none() {
            tracing::info!("Deleted all nodes and relations");
            first = self.run_all(&schema::all_schema_statements());
        }
        self.finish_maintenance(first)
    }

    fn run_all(&self, statements: &[&str]) -> Option<Error> {
        let mut first = None;
        for stmt in statements {
            if let Err(e) = self.conn.execute(stmt, []) {
                tracing::warn!("Maintenance statement failed: {}", e);
                // continue but keep the first error
                first.get_or_insert(Error::from(e));
            }
        }
        first
    }

    fn finish_maintenance(&mut self, first: Option<Error>) -> Result<()> {
        *self.last_error.get_mut() = first.clone();
        match first {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Get database statistics
    pub fn stats(&self) -> Result<RepoStats> {
        Ok(RepoStats {
            nodes: self.count(schema::COUNT_NODES)?,
            keywords: self.count(schema::COUNT_KEYWORDS)?,
            relations: self.count(schema::COUNT_RELATIONS)?,
        })
    }

    fn count(&self, sql: &str) -> Result<usize> {
        let count: i64 = self.conn.query_one(sql, [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Release the underlying connection
    pub fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, e)| Error::from(e))
    }
}

/// Database statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RepoStats {
    pub nodes: usize,
    pub keywords: usize,
    pub relations: usize,
}

impl std::fmt::Display for RepoStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Database Statistics:")?;
        writeln!(f, "  Nodes: {}", self.nodes)?;
        writeln!(f, "  Keywords: {}", self.keywords)?;
        writeln!(f, "  Relations: {}", self.relations)
    }
}
