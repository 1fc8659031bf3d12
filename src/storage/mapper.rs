//! Entity mapper - upserts for nodes and relations

use rusqlite::params;

use super::gateway::Gateway;
use super::keyword;
use super::schema;
use crate::node::{normalize_attributes, validate_attributes, Node, NodeId};
use crate::relation::Relation;
use crate::{Error, Result};

/// Insert a new node or update an existing node's attributes.
///
/// A node without an id is inserted and receives the store-assigned id.
/// A node with an id only has its attributes rewritten; updating an id
/// that does not exist touches no rows and is not an error.
pub fn save_node<G: Gateway>(db: &G, node: &mut Node) -> Result<()> {
    normalize_attributes(&mut node.attributes);
    validate_attributes(&node.attributes)?;

    if node.id.is_unset() {
        let id: NodeId = db.query_one(
            schema::INSERT_NODE,
            params![node.name, node.attributes],
            |row| row.get(0),
        )?;
        node.id = id;
        tracing::debug!("Inserted node {:?} as {}", node.name, id);
    } else {
        let updated = db.exec(schema::UPDATE_NODE, params![node.id, node.attributes])?;
        if updated == 0 {
            tracing::debug!("Update of node {} touched no rows", node.id);
        }
    }
    Ok(())
}

/// Insert or update a relation by its `(from, to, label)` key.
///
/// The label is interned first and the resolved keyword is written back
/// onto `rel`. The update-then-insert sequence is not atomic against a
/// concurrent save of the same triple: the losing insert fails with
/// `Error::Constraint` and is not retried.
pub fn save_relation<G: Gateway>(db: &G, rel: &mut Relation) -> Result<()> {
    if rel.from.id.is_unset() {
        return Err(Error::Validation("from is required".to_string()));
    }
    if rel.to.id.is_unset() {
        return Err(Error::Validation("to is required".to_string()));
    }
    normalize_attributes(&mut rel.attributes);
    validate_attributes(&rel.attributes)?;

    rel.label = keyword::intern(db, &rel.label.name)?;

    let updated = db.exec(
        schema::UPDATE_RELATION,
        params![rel.from.id, rel.to.id, rel.label.id, rel.attributes],
    )?;
    if updated > 0 {
        tracing::debug!("Updated relation {}", rel);
        return Ok(());
    }

    insert_relation(db, rel)?;
    tracing::debug!("Inserted relation {}", rel);
    Ok(())
}

fn insert_relation<G: Gateway>(db: &G, rel: &Relation) -> Result<()> {
    db.exec(
        schema::INSERT_RELATION,
        params![rel.from.id, rel.to.id, rel.label.id, rel.attributes],
    )?;
    Ok(())
}
