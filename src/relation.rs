//! Relation types - labeled edges between nodes
//!
//! Every relation label is interned as a [`Keyword`], so relation rows carry
//! a fixed-width label id instead of the label text.
//!
//! A relation embeds value snapshots of both endpoints. A snapshot reflects
//! the endpoint as it was when the relation was built, written or read, and
//! is never refreshed on its own.

use crate::node::{decode_attributes, encode_attributes, Node, NodeId, EMPTY_ATTRIBUTES};
use crate::Result;
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// Store-assigned identifier of a keyword. Zero means "unresolved".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct KeywordId(pub u32);

impl KeywordId {
    /// Sentinel for a keyword that has not been resolved against the store
    pub const UNSET: KeywordId = KeywordId(0);

    pub fn is_unset(self) -> bool {
        self == Self::UNSET
    }
}

impl std::fmt::Display for KeywordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl ToSql for KeywordId {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(i64::from(self.0)))
    }
}

impl FromSql for KeywordId {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let raw = i64::column_result(value)?;
        u32::try_from(raw)
            .map(KeywordId)
            .map_err(|_| FromSqlError::OutOfRange(raw))
    }
}

/// An interned relation label
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Keyword {
    pub id: KeywordId,
    pub name: String,
}

impl Keyword {
    /// Create an unresolved keyword
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            id: KeywordId::UNSET,
            name: name.into(),
        }
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// A labeled, attributed edge between two nodes.
///
/// At most one relation exists per `(from, to, label)`; saving the same
/// triple again updates its attributes in place.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relation {
    /// Source node snapshot
    pub from: Node,
    /// Target node snapshot
    pub to: Node,
    /// Relation label
    pub label: Keyword,
    /// JSON-encoded attributes
    pub attributes: String,
}

impl Relation {
    /// Create a relation with empty attributes, copying both endpoints
    pub fn new(from: &Node, label: impl Into<String>, to: &Node) -> Self {
        Self {
            from: from.clone(),
            to: to.clone(),
            label: Keyword::named(label),
            attributes: EMPTY_ATTRIBUTES.to_string(),
        }
    }

    pub fn with_attributes(mut self, attributes: impl Into<String>) -> Self {
        self.attributes = attributes.into();
        self
    }

    /// Natural key of the relation
    pub fn key(&self) -> (NodeId, NodeId, KeywordId) {
        (self.from.id, self.to.id, self.label.id)
    }

    /// Replace the source snapshot
    pub fn set_from(&mut self, node: &Node) {
        self.from = node.clone();
    }

    /// Replace the target snapshot
    pub fn set_to(&mut self, node: &Node) {
        self.to = node.clone();
    }

    /// Encode `value` as the relation's attributes
    pub fn set_attributes<T: Serialize>(&mut self, value: &T) -> Result<()> {
        self.attributes = encode_attributes(value)?;
        Ok(())
    }

    pub fn attributes_value(&self) -> Result<serde_json::Value> {
        decode_attributes(&self.attributes)
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -[{}]-> {}", self.from.name, self.label, self.to.name)
    }
}
