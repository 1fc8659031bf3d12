//! End-to-end behavior of the repository against real SQLite databases

use relgraph::{Error, Keyword, Node, NodeId, Relation, Repo};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn fresh_repo() -> Repo {
    init_tracing();
    let mut repo = Repo::open_in_memory().unwrap();
    repo.drop_all().unwrap();
    repo.create().unwrap();
    repo
}

#[test]
fn saved_node_reads_back_equal() {
    let mut repo = fresh_repo();
    let mut node = Node::new("node-a");

    let mut scope = repo.begin().unwrap();
    scope.save_node(&mut node).unwrap();
    scope.end().unwrap();

    assert!(!node.id.is_unset());
    let fetched = repo.fetch_node(NodeId::UNSET, &node.name).unwrap();
    assert_eq!(fetched, node);
}

#[test]
fn duplicate_node_name_is_constraint_failure() {
    let mut repo = fresh_repo();
    repo.save_node(&mut Node::new("neo")).unwrap();

    let err = repo.save_node(&mut Node::new("neo")).unwrap_err();
    assert!(matches!(err, Error::Constraint(_)), "unexpected error: {err}");
}

#[test]
fn keyword_is_idempotent_by_name() {
    let mut repo = fresh_repo();
    let mut kw = Keyword::named("knows");
    repo.save_keyword(&mut kw).unwrap();
    assert!(!kw.id.is_unset());

    let mut same = Keyword::named("knows");
    repo.save_keyword(&mut same).unwrap();
    assert_eq!(same, kw);

    assert_eq!(repo.keyword_by_name("knows").unwrap(), kw);
    assert_eq!(repo.keyword_by_id(kw.id).unwrap(), kw);
}

#[test]
fn neo_knows_morpheus() {
    let mut repo = fresh_repo();
    let mut neo = Node::new("neo");
    let mut morpheus = Node::new("morpheus");
    repo.save_node(&mut neo).unwrap();
    repo.save_node(&mut morpheus).unwrap();
    assert_eq!(neo.id, NodeId(1));
    assert_eq!(morpheus.id, NodeId(2));

    let mut rel = Relation::new(&neo, "knows", &morpheus).with_attributes("{}");
    repo.save_relation(&mut rel).unwrap();

    let fetched = repo.fetch_relation(NodeId(1), NodeId(2), "knows").unwrap();
    assert_eq!(fetched.from, Node { id: NodeId(1), name: "neo".into(), attributes: "{}".into() });
    assert_eq!(fetched.to, Node { id: NodeId(2), name: "morpheus".into(), attributes: "{}".into() });
    assert_eq!(fetched.label.name, "knows");
    assert_eq!(fetched.attributes, "{}");
    assert_eq!(fetched, rel);
}

#[test]
fn empty_relation_attributes_read_back_as_empty_object() {
    let mut repo = fresh_repo();
    let mut a = Node::new("a");
    let mut b = Node::new("b");
    repo.save_node(&mut a).unwrap();
    repo.save_node(&mut b).unwrap();

    let mut rel = a.rel("points-to", &b).with_attributes("");
    repo.save_relation(&mut rel).unwrap();
    assert_eq!(rel.attributes, "{}");

    let fetched = repo.fetch_relation(a.id, b.id, "points-to").unwrap();
    assert_eq!(fetched.attributes, "{}");
}

#[test]
fn resaving_a_triple_updates_in_place() {
    let mut repo = fresh_repo();
    let mut neo = Node::new("neo");
    let mut trinity = Node::new("trinity");
    repo.save_node(&mut neo).unwrap();
    repo.save_node(&mut trinity).unwrap();

    repo.save_relation(&mut neo.rel("loves", &trinity).with_attributes(r#"{"v":1}"#))
        .unwrap();
    repo.save_relation(&mut neo.rel("loves", &trinity).with_attributes(r#"{"v":2}"#))
        .unwrap();

    assert_eq!(repo.stats().unwrap().relations, 1);
    let fetched = repo.fetch_relation(neo.id, trinity.id, "loves").unwrap();
    assert_eq!(fetched.attributes, r#"{"v":2}"#);
}

#[test]
fn walk_returns_both_targets_in_any_order() {
    let mut repo = fresh_repo();
    let mut a = Node::new("a");
    let mut b = Node::new("b");
    let mut c = Node::new("c");
    repo.in_scope(|scope| {
        scope.save_node(&mut a)?;
        scope.save_node(&mut b)?;
        scope.save_node(&mut c)
    })
    .unwrap();

    let mut ab = a.rel("L", &b);
    let mut ac = a.rel("L", &c);
    repo.save_relation(&mut ab).unwrap();
    repo.save_relation(&mut ac).unwrap();

    let walked = repo.walk(a.id, "L").unwrap();
    assert_eq!(walked.len(), 2);
    for rel in &walked {
        assert_eq!(rel.from, a);
        assert!(rel.to == b || rel.to == c, "unexpected target {}", rel.to.name);
        assert!(*rel == ab || *rel == ac);
    }
    assert_ne!(walked[0].to, walked[1].to);
}

#[test]
fn unknown_label_is_not_found() {
    let mut repo = fresh_repo();
    let mut a = Node::new("a");
    let mut b = Node::new("b");
    repo.save_node(&mut a).unwrap();
    repo.save_node(&mut b).unwrap();

    assert!(repo.walk(a.id, "never-used").unwrap_err().is_not_found());
    assert!(repo.fetch_relation(a.id, b.id, "never-used").unwrap_err().is_not_found());
}

#[test]
fn validation_failure_rolls_back_whole_scope() {
    let mut repo = fresh_repo();
    let mut first = Node::new("first");

    let mut scope = repo.begin().unwrap();
    scope.save_node(&mut first).unwrap();
    let mut dangling = first.rel("knows", &Node::new("never-saved"));
    assert!(scope.save_relation(&mut dangling).unwrap_err().is_validation());
    assert!(scope.end().is_err());

    assert!(repo.fetch_node(NodeId::UNSET, "first").unwrap_err().is_not_found());
    assert_eq!(repo.stats().unwrap().nodes, 0);
}

#[test]
fn data_survives_reopen() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.db");

    let (neo, rel) = {
        let mut repo = Repo::open(&path).unwrap();
        let mut neo = Node::with_attributes("neo", r#"{"chosen":true}"#);
        let mut smith = Node::new("smith");
        repo.save_node(&mut neo).unwrap();
        repo.save_node(&mut smith).unwrap();
        let mut rel = neo.rel("fights", &smith);
        repo.save_relation(&mut rel).unwrap();
        repo.close().unwrap();
        (neo, rel)
    };

    let repo = Repo::open(&path).unwrap();
    assert_eq!(repo.fetch_node(neo.id, "").unwrap(), neo);
    assert_eq!(repo.walk(neo.id, "fights").unwrap(), vec![rel]);
}

#[test]
fn second_handle_sees_only_committed_work() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.db");
    let mut writer = Repo::open(&path).unwrap();
    let reader = Repo::open(&path).unwrap();

    let mut neo = Node::new("neo");
    let mut scope = writer.begin().unwrap();
    scope.save_node(&mut neo).unwrap();
    assert!(reader.fetch_node(NodeId::UNSET, "neo").unwrap_err().is_not_found());
    scope.end().unwrap();

    assert_eq!(reader.fetch_node(NodeId::UNSET, "neo").unwrap(), neo);
}
