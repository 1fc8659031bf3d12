//! Keyword interner - resolves relation labels to stable ids
//!
//! Labels are few and heavily reused, so each one is stored once and
//! relation rows join on its id.
//!
//! Lookup-then-insert is not serialized: two first uses of the same label
//! racing in separate transactions can both insert. Lookups by name always
//! pick the lowest id, so duplicate rows never split a reader's view.

use super::gateway::Gateway;
use super::schema;
use crate::relation::{Keyword, KeywordId};
use crate::{Error, Result};

/// Resolve `name`, inserting a new keyword on first use
pub fn intern<G: Gateway>(db: &G, name: &str) -> Result<Keyword> {
    if name.is_empty() {
        return Err(Error::Validation("cannot save an empty keyword".to_string()));
    }

    match by_name(db, name) {
        Ok(keyword) => Ok(keyword),
        Err(Error::NotFound(_)) => {
            let id: KeywordId = db.query_one(schema::INSERT_KEYWORD, [name], |row| row.get(0))?;
            tracing::debug!("Interned keyword {:?} as {}", name, id);
            Ok(Keyword {
                id,
                name: name.to_string(),
            })
        }
        Err(e) => Err(e),
    }
}

/// Look a keyword up by name
pub fn by_name<G: Gateway>(db: &G, name: &str) -> Result<Keyword> {
    db.query_one(schema::SELECT_KEYWORD_BY_NAME, [name], row_to_keyword)
        .map_err(|e| not_found_as(e, || format!("keyword {:?}", name)))
}

/// Look a keyword up by id
pub fn by_id<G: Gateway>(db: &G, id: KeywordId) -> Result<Keyword> {
    db.query_one(schema::SELECT_KEYWORD_BY_ID, [id], row_to_keyword)
        .map_err(|e| not_found_as(e, || format!("keyword #{}", id)))
}

fn row_to_keyword(row: &rusqlite::Row) -> rusqlite::Result<Keyword> {
    Ok(Keyword {
        id: row.get(0)?,
        name: row.get(1)?,
    })
}

/// Give a bare "no rows" error the name of what was looked up
pub(crate) fn not_found_as(err: Error, what: impl FnOnce() -> String) -> Error {
    match err {
        Error::NotFound(_) => Error::NotFound(what()),
        other => other,
    }
}
