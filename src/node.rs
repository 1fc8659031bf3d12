//! Node types - persisted graph vertices
//!
//! A node has a store-assigned identifier, a globally unique name and an
//! attributes payload that is stored as an opaque JSON document.

use crate::relation::Relation;
use crate::{Error, Result};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Attributes written when a node or relation carries none
pub const EMPTY_ATTRIBUTES: &str = "{}";

/// Store-assigned identifier of a node.
///
/// Zero is never assigned by the store and means "not saved yet".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct NodeId(pub u64);

impl NodeId {
    /// Sentinel for a node that has not been inserted
    pub const UNSET: NodeId = NodeId(0);

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for NodeId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        let raw = i64::try_from(self.0)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        Ok(ToSqlOutput::from(raw))
    }
}

impl FromSql for NodeId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        u64::try_from(raw)
            .map(NodeId)
            .map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// A vertex of the graph.
///
/// The name is fixed once the node is inserted; saving an existing node
/// only rewrites its attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    /// Store-assigned identifier, `NodeId::UNSET` until first save
    pub id: NodeId,
    /// Unique name across all nodes
    pub name: String,
    /// JSON-encoded attributes
    pub attributes: String,
}

impl Node {
    /// Create an unsaved node with empty attributes
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId::UNSET,
            name: name.into(),
            attributes: EMPTY_ATTRIBUTES.to_string(),
        }
    }

    /// Create an unsaved node carrying an already encoded attributes document
    pub fn with_attributes(name: impl Into<String>, attributes: impl Into<String>) -> Self {
        Self {
            id: NodeId::UNSET,
            name: name.into(),
            attributes: attributes.into(),
        }
    }

    /// Check if the store has assigned an identifier
    pub fn is_persisted(&self) -> bool {
        !self.id.is_unset()
    }

    /// Encode `value` as the node's attributes
    pub fn set_attributes<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.attributes = encode_attributes(value)?;
        Ok(())
    }

    /// Decode the attributes document
    pub fn attributes_value(&self) -> Result<serde_json::Value> {
        decode_attributes(&self.attributes)
    }

    /// Build a relation from this node to `to`, labeled `label`.
    ///
    /// Both endpoints are copied as they are now.
    pub fn rel(&self, label: impl Into<String>, to: &Node) -> Relation {
        Relation::new(self, label, to)
    }
}

/// Replace an empty attributes payload with the empty JSON object
pub(crate) fn normalize_attributes(attributes: &mut String) {
    if attributes.is_empty() {
        attributes.push_str(EMPTY_ATTRIBUTES);
    }
}

/// Reject attributes that are not a JSON document
pub(crate) fn validate_attributes(attributes: &str) -> Result<()> {
    serde_json::from_str::<serde::de::IgnoredAny>(attributes)
        .map(|_| ())
        .map_err(|e| Error::Validation(format!("attributes must be a JSON document: {}", e)))
}

pub(crate) fn encode_attributes<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value)
        .map_err(|e| Error::Validation(format!("cannot encode attributes: {}", e)))
}

pub(crate) fn decode_attributes(attributes: &str) -> Result<serde_json::Value> {
    if attributes.is_empty() {
        return Ok(serde_json::Value::Object(Default::default()));
    }
    serde_json::from_str(attributes)
        .map_err(|e| Error::Validation(format!("attributes must be a JSON document: {}", e)))
}
