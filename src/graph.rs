//! Graph façade - batch saves and walks over a [`Repo`]
//!
//! The façade routes values through the repository without the repository
//! knowing about them: a [`GraphItem`] is either a node or a relation, and
//! [`Graph::save_all`] persists a batch of them in one scope.

use std::collections::{HashMap, HashSet};

use crate::node::{Node, NodeId};
use crate::relation::Relation;
use crate::storage::Repo;
use crate::Result;

/// Something the graph can save
#[derive(Debug)]
pub enum GraphItem<'a> {
    Node(&'a mut Node),
    Relation(&'a mut Relation),
}

impl<'a> From<&'a mut Node> for GraphItem<'a> {
    fn from(node: &'a mut Node) -> Self {
        GraphItem::Node(node)
    }
}

impl<'a> From<&'a mut Relation> for GraphItem<'a> {
    fn from(rel: &'a mut Relation) -> Self {
        GraphItem::Relation(rel)
    }
}

/// Object graph backed by a repository
pub struct Graph {
    repo: Repo,
}

impl Graph {
    pub fn new(repo: Repo) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &Repo {
        &self.repo
    }

    /// Save every item in order inside one scope.
    ///
    /// A relation built before its endpoints were saved gets their
    /// snapshots from nodes saved earlier in the same batch, matched by
    /// name. The first failure stops the batch and rolls the scope back.
    pub fn save_all(&mut self, items: Vec<GraphItem<'_>>) -> Result<()> {
        self.repo.in_scope(|scope| {
            let mut saved: HashMap<String, Node> = HashMap::new();
            for item in items {
                match item {
                    GraphItem::Node(node) => {
                        scope.save_node(node)?;
                        saved.insert(node.name.clone(), node.clone());
                    }
                    GraphItem::Relation(rel) => {
                        refresh_endpoints(rel, &saved);
                        scope.save_relation(rel)?;
                    }
                }
            }
            Ok(())
        })
    }

    /// Fetch a node by id, or by name when `id` is unset
    pub fn node(&self, id: NodeId, name: &str) -> Result<Node> {
        self.repo.fetch_node(id, name)
    }

    /// All relations leaving `from` under `label`
    pub fn walk(&self, from: &Node, label: &str) -> Result<Vec<Relation>> {
        self.repo.walk(from.id, label)
    }

    /// Distinct targets reachable from `from` under `label`, in walk order
    pub fn neighbors(&self, from: &Node, label: &str) -> Result<Vec<Node>> {
        let mut seen = HashSet::new();
        let nodes = self
            .walk(from, label)?
            .into_iter()
            .filter(|rel| seen.insert(rel.to.id))
            .map(|rel| rel.to)
            .collect();
        Ok(nodes)
    }

    pub fn close(self) -> Result<()> {
        self.repo.close()
    }
}

/// Fill unsaved endpoint snapshots from nodes saved in the current batch
fn refresh_endpoints(rel: &mut Relation, saved: &HashMap<String, Node>) {
    if rel.from.id.is_unset() {
        if let Some(node) = saved.get(&rel.from.name) {
            rel.set_from(node);
        }
    }
    if rel.to.id.is_unset() {
        if let Some(node) = saved.get(&rel.to.name) {
            rel.set_to(node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> Graph {
        Graph::new(Repo::open_in_memory().unwrap())
    }

    #[test]
    fn test_save_and_fetch_node() {
        let mut g = graph();
        let mut neo = Node::new("neo");
        g.save_all(vec![(&mut neo).into()]).unwrap();

        assert!(neo.is_persisted());
        assert_eq!(g.node(neo.id, "").unwrap(), neo);
    }

    #[test]
    fn test_relation_built_before_nodes_were_saved() {
        let mut g = graph();
        let mut neo = Node::new("neo");
        let mut morpheus = Node::new("morpheus");
        let mut rel = neo.rel("knows", &morpheus);

        g.save_all(vec![
            (&mut neo).into(),
            (&mut morpheus).into(),
            (&mut rel).into(),
        ])
        .unwrap();

        assert_eq!(rel.from, neo);
        assert_eq!(rel.to, morpheus);
        let walked = g.walk(&neo, "knows").unwrap();
        assert_eq!(walked, vec![rel]);
    }

    #[test]
    fn test_failed_batch_rolls_back() {
        let mut g = graph();
        let mut neo = Node::new("neo");
        let stranger = Node::new("stranger");
        let mut rel = neo.rel("knows", &stranger);

        let err = g
            .save_all(vec![(&mut neo).into(), (&mut rel).into()])
            .unwrap_err();
        assert!(err.is_validation());
        assert!(g.node(NodeId::UNSET, "neo").unwrap_err().is_not_found());
        assert!(g.repo().last_error().is_some());
    }

    #[test]
    fn test_neighbors_are_distinct_targets() {
        let mut g = graph();
        let mut neo = Node::new("neo");
        let mut trinity = Node::new("trinity");
        let mut tank = Node::new("tank");
        let mut r1 = neo.rel("crew", &trinity);
        let mut r2 = neo.rel("crew", &tank);

        g.save_all(vec![
            (&mut neo).into(),
            (&mut trinity).into(),
            (&mut tank).into(),
            (&mut r1).into(),
            (&mut r2).into(),
        ])
        .unwrap();

        let mut names: Vec<String> = g
            .neighbors(&neo, "crew")
            .unwrap()
            .into_iter()
            .map(|n| n.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["tank".to_string(), "trinity".to_string()]);

        g.close().unwrap();
    }
}
