//! Walk/fetch engine - point lookups and label walks
//!
//! Relation reads join the relation row with its keyword and both endpoint
//! nodes, so every returned [`Relation`] carries full endpoint snapshots.

use rusqlite::params;

use super::gateway::Gateway;
use super::keyword::{self, not_found_as};
use super::schema;
use crate::node::{Node, NodeId, EMPTY_ATTRIBUTES};
use crate::relation::{Keyword, Relation};
use crate::Result;

/// Fetch a node by id, or by name when `id` is unset.
///
/// The id wins when both are given.
pub fn node<G: Gateway>(db: &G, id: NodeId, name: &str) -> Result<Node> {
    if !id.is_unset() {
        db.query_one(schema::SELECT_NODE_BY_ID, [id], row_to_node)
            .map_err(|e| not_found_as(e, || format!("node #{}", id)))
    } else {
        db.query_one(schema::SELECT_NODE_BY_NAME, [name], row_to_node)
            .map_err(|e| not_found_as(e, || format!("node {:?}", name)))
    }
}

/// Fetch the relation `from -[label]-> to`.
///
/// An unknown label fails with its own not-found error before the
/// relation is queried.
pub fn relation<G: Gateway>(db: &G, from: NodeId, to: NodeId, label: &str) -> Result<Relation> {
    let kw = keyword::by_name(db, label)?;
    db.query_one(schema::SELECT_RELATION, params![from, to, kw.id], row_to_relation)
        .map_err(|e| not_found_as(e, || format!("relation {} -[{}]-> {}", from, label, to)))
}

/// All relations leaving `from` under `label`.
///
/// Order is whatever storage yields. An unknown label is an error, not an
/// empty walk.
pub fn walk<G: Gateway>(db: &G, from: NodeId, label: &str) -> Result<Vec<Relation>> {
    let kw = keyword::by_name(db, label)?;
    let relations = db.query_all(
        schema::SELECT_RELATION_WALK,
        params![from, kw.id],
        row_to_relation,
    )?;
    tracing::debug!("Walked {} relation(s) from {} via {:?}", relations.len(), from, label);
    Ok(relations)
}

fn row_to_node(row: &rusqlite::Row) -> rusqlite::Result<Node> {
    Ok(Node {
        id: row.get(0)?,
        name: row.get(1)?,
        attributes: attributes_at(row, 2)?,
    })
}

/// Decode the nine-column relation projection shared by fetch and walk
fn row_to_relation(row: &rusqlite::Row) -> rusqlite::Result<Relation> {
    Ok(Relation {
        from: Node {
            id: row.get(0)?,
            name: row.get(1)?,
            attributes: attributes_at(row, 2)?,
        },
        to: Node {
            id: row.get(3)?,
            name: row.get(4)?,
            attributes: attributes_at(row, 5)?,
        },
        label: Keyword {
            id: row.get(6)?,
            name: row.get(7)?,
        },
        attributes: attributes_at(row, 8)?,
    })
}

/// NULL attributes read back as the empty object
fn attributes_at(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<String> {
    let attributes: Option<String> = row.get(idx)?;
    Ok(attributes.unwrap_or_else(|| EMPTY_ATTRIBUTES.to_string()))
}
