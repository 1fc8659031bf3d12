//! Transaction scopes
//!
//! A [`Scope`] owns the repository's single open transaction. It keeps the
//! first failure raised inside it; once a failure is recorded every later
//! call returns that same error without issuing a statement, and
//! [`Scope::end`] rolls the whole unit of work back.
//!
//! A scope mutably borrows its [`Repo`](super::Repo), so a handle can never
//! have two transactions open.

use rusqlite::Transaction;

use super::{fetch, keyword, mapper};
use crate::node::{Node, NodeId};
use crate::relation::{Keyword, KeywordId, Relation};
use crate::{Error, Result};

/// An open transaction plus the first failure seen inside it
pub struct Scope<'r> {
    tx: Transaction<'r>,
    failure: FailureSlot<'r>,
}

/// First failure of a scope. Dropping the slot hands it to the repository,
/// so a scope dropped without `end` still reports it.
struct FailureSlot<'r> {
    first: Option<Error>,
    /// The repository's last recorded error
    outcome: &'r mut Option<Error>,
}

impl Drop for FailureSlot<'_> {
    fn drop(&mut self) {
        if let Some(err) = self.first.take() {
            *self.outcome = Some(err);
        }
    }
}

impl<'r> Scope<'r> {
    pub(crate) fn new(tx: Transaction<'r>, outcome: &'r mut Option<Error>) -> Self {
        Self {
            tx,
            failure: FailureSlot { first: None, outcome },
        }
    }

    /// The failure recorded in this scope, if any
    pub fn error(&self) -> Option<&Error> {
        self.failure.first.as_ref()
    }

    pub fn is_failed(&self) -> bool {
        self.failure.first.is_some()
    }

    // ========== Writes ==========

    /// Insert or update a node inside this scope
    pub fn save_node(&mut self, node: &mut Node) -> Result<()> {
        self.guard()?;
        let result = mapper::save_node(&self.tx, node);
        self.record(result)
    }

    /// Intern a keyword, writing the resolved id back
    pub fn save_keyword(&mut self, kw: &mut Keyword) -> Result<()> {
        self.guard()?;
        let result = keyword::intern(&self.tx, &kw.name).map(|resolved| *kw = resolved);
        self.record(result)
    }

    /// Insert or update a relation inside this scope
    pub fn save_relation(&mut self, rel: &mut Relation) -> Result<()> {
        self.guard()?;
        let result = mapper::save_relation(&self.tx, rel);
        self.record(result)
    }

    // ========== Reads ==========
    //
    // Reads see this scope's uncommitted writes. A not-found read is
    // returned to the caller but does not fail the scope.

    pub fn fetch_node(&mut self, id: NodeId, name: &str) -> Result<Node> {
        self.guard()?;
        let result = fetch::node(&self.tx, id, name);
        self.record_read(result)
    }

    pub fn keyword_by_name(&mut self, name: &str) -> Result<Keyword> {
        self.guard()?;
        let result = keyword::by_name(&self.tx, name);
        self.record_read(result)
    }

    pub fn keyword_by_id(&mut self, id: KeywordId) -> Result<Keyword> {
        self.guard()?;
        let result = keyword::by_id(&self.tx, id);
        self.record_read(result)
    }

    pub fn fetch_relation(&mut self, from: NodeId, to: NodeId, label: &str) -> Result<Relation> {
        self.guard()?;
        let result = fetch::relation(&self.tx, from, to, label);
        self.record_read(result)
    }

    pub fn walk(&mut self, from: NodeId, label: &str) -> Result<Vec<Relation>> {
        self.guard()?;
        let result = fetch::walk(&self.tx, from, label);
        self.record_read(result)
    }

    // ========== Completion ==========

    /// Finish the scope: commit if nothing failed, otherwise roll back.
    ///
    /// After a rollback the recorded failure is returned; a rollback error
    /// does not replace it.
    pub fn end(self) -> Result<()> {
        let Scope { tx, mut failure } = self;
        match failure.first.take() {
            None => {
                let committed = tx.commit().map_err(Error::from);
                match &committed {
                    Ok(()) => tracing::debug!("Scope committed"),
                    Err(e) => {
                        tracing::warn!("Commit failed: {}", e);
                        *failure.outcome = Some(e.clone());
                    }
                }
                committed
            }
            Some(err) => {
                match tx.rollback() {
                    Ok(()) => tracing::debug!("Scope rolled back after: {}", err),
                    Err(e) => tracing::warn!("Rollback after {} failed: {}", err, e),
                }
                *failure.outcome = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Roll the scope back regardless of its state.
    ///
    /// Returns the rollback's own result. The rollback error is recorded on
    /// the repository only when no earlier failure exists.
    pub fn abort(self) -> Result<()> {
        let Scope { tx, mut failure } = self;
        let rolled_back = tx.rollback().map_err(Error::from);
        if let Err(e) = &rolled_back {
            tracing::warn!("Rollback failed: {}", e);
        }
        *failure.outcome = failure.first.take().or_else(|| rolled_back.as_ref().err().cloned());
        tracing::debug!("Scope aborted");
        rolled_back
    }

    fn guard(&self) -> Result<()> {
        match &self.failure.first {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn record<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            if self.failure.first.is_none() {
                tracing::warn!("Scope failed: {}", err);
                self.failure.first = Some(err.clone());
            }
        }
        result
    }

    fn record_read<T>(&mut self, result: Result<T>) -> Result<T> {
        match result {
            Err(err) if err.is_not_found() => Err(err),
            other => self.record(other),
        }
    }
}
