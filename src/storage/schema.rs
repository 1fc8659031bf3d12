//! Database schema and statement definitions

/// SQL to create the nodes table
pub const CREATE_NODES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS nodes (
    gid INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL CONSTRAINT unq_name_cannot_repeat UNIQUE,
    attributes TEXT CHECK (attributes IS NULL OR json_valid(attributes))
)
"#;

/// SQL to create the keywords table
///
/// Names are not unique: concurrent first uses of a label may both insert.
pub const CREATE_KEYWORDS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS keywords (
    kid INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
"#;

/// SQL to create the relations table
pub const CREATE_RELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relations (
    field INTEGER NOT NULL REFERENCES keywords(kid),
    attributes TEXT CHECK (attributes IS NULL OR json_valid(attributes)),
    from_ INTEGER NOT NULL REFERENCES nodes(gid),
    to_ INTEGER NOT NULL REFERENCES nodes(gid),
    PRIMARY KEY (from_, to_, field)
)
"#;

/// Drop order respects the foreign keys
pub const DROP_TABLES: &[&str] = &[
    "DROP TABLE IF EXISTS relations",
    "DROP TABLE IF EXISTS nodes",
    "DROP TABLE IF EXISTS keywords",
];

/// Remove every node and relation, keep keywords
pub const DELETE_GRAPH: &[&str] = &["DELETE FROM relations", "DELETE FROM nodes"];

pub const SELECT_KEYWORD_BY_ID: &str = "SELECT kid, name FROM keywords WHERE kid = ?1";
/// Duplicate names resolve to the oldest keyword
pub const SELECT_KEYWORD_BY_NAME: &str =
    "SELECT kid, name FROM keywords WHERE name = ?1 ORDER BY kid LIMIT 1";
pub const INSERT_KEYWORD: &str = "INSERT INTO keywords (name) VALUES (?1) RETURNING kid";

pub const SELECT_NODE_BY_ID: &str = "SELECT gid, name, attributes FROM nodes WHERE gid = ?1";
pub const SELECT_NODE_BY_NAME: &str = "SELECT gid, name, attributes FROM nodes WHERE name = ?1";
pub const INSERT_NODE: &str = "INSERT INTO nodes (name, attributes) VALUES (?1, ?2) RETURNING gid";
pub const UPDATE_NODE: &str = "UPDATE nodes SET attributes = ?2 WHERE gid = ?1";

pub const INSERT_RELATION: &str =
    "INSERT INTO relations (from_, to_, field, attributes) VALUES (?1, ?2, ?3, ?4)";
pub const UPDATE_RELATION: &str =
    "UPDATE relations SET attributes = ?4 WHERE from_ = ?1 AND to_ = ?2 AND field = ?3";

/// Relation by natural key, joined with its label and both endpoints
pub const SELECT_RELATION: &str = r#"
SELECT f.gid, f.name, f.attributes,
       t.gid, t.name, t.attributes,
       r.field, kw.name, r.attributes
FROM relations r
    INNER JOIN keywords kw ON kw.kid = ?3 AND r.field = kw.kid
    INNER JOIN nodes f ON f.gid = ?1 AND r.from_ = f.gid
    INNER JOIN nodes t ON t.gid = ?2 AND r.to_ = t.gid
"#;

/// Every relation leaving a node under one label, in storage order
pub const SELECT_RELATION_WALK: &str = r#"
SELECT f.gid, f.name, f.attributes,
       t.gid, t.name, t.attributes,
       r.field, kw.name, r.attributes
FROM relations r
    INNER JOIN nodes f ON f.gid = ?1 AND r.from_ = f.gid
    INNER JOIN keywords kw ON kw.kid = ?2 AND r.field = kw.kid
    INNER JOIN nodes t ON r.to_ = t.gid
"#;

pub const COUNT_NODES: &str = "SELECT COUNT(*) FROM nodes";
pub const COUNT_KEYWORDS: &str = "SELECT COUNT(*) FROM keywords";
pub const COUNT_RELATIONS: &str = "SELECT COUNT(*) FROM relations";

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    vec![
        CREATE_NODES_TABLE,
        CREATE_KEYWORDS_TABLE,
        CREATE_RELATIONS_TABLE,
    ]
}
