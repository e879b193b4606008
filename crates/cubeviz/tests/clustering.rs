//! Integration tests for subtree clustering and re-expansion.

mod common;

use common::{edge, node};
use cubeviz::cluster::ClusterManager;
use cubeviz::domain::{EdgeId, GraphModel, NodeId};
use std::collections::{BTreeMap, HashSet};

fn model(nodes: Vec<cubeviz::domain::Node>, edges: Vec<cubeviz::domain::Edge>) -> GraphModel {
    let count = nodes.len();
    GraphModel::new(
        nodes,
        edges,
        BTreeMap::new(),
        vec![],
        String::new(),
        5,
        count,
    )
}

/// A depth-3 subtree: 1 -> 2 -> {3, 4}, 4 -> 5.
fn deep_tree() -> GraphModel {
    model(
        vec![
            node("1", 1, "PRODUCT"),
            node("2", 2, "RISK"),
            node("3", 3, "RISK"),
            node("4", 3, "RISK"),
            node("5", 4, "COVERAGE"),
        ],
        vec![
            edge("e12", "1", "2", 2),
            edge("e23", "2", "3", 3),
            edge("e24", "2", "4", 3),
            edge("e45", "4", "5", 4),
        ],
    )
}

fn id_set(ids: &[NodeId]) -> HashSet<NodeId> {
    ids.iter().cloned().collect()
}

#[test]
fn cluster_then_expand_restores_exact_sets() {
    let m = deep_tree();
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("1"), false);

    let cluster = manager.clusters()[0].clone();
    assert_eq!(cluster.nodes.len(), 5, "no omissions");
    assert_eq!(id_set(&cluster.nodes).len(), 5, "no duplicates");
    assert_eq!(cluster.edges.len(), 4);

    let expanded = manager.expand(&cluster.id).expect("cluster exists");
    assert_eq!(id_set(&expanded.nodes), id_set(&cluster.nodes));
    assert_eq!(
        expanded.edges.iter().collect::<HashSet<_>>(),
        cluster.edges.iter().collect::<HashSet<_>>()
    );
    assert!(manager.clusters().is_empty());
}

#[test]
fn clustering_same_root_twice_leaves_membership_unchanged() {
    let m = deep_tree();
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("2"), false);
    let before: Vec<_> = manager.clusters().to_vec();

    manager.cluster(&m, &NodeId::from("2"), false);
    assert_eq!(manager.clusters(), before.as_slice());
}

#[test]
fn expanded_members_are_not_reclustered_on_recompute() {
    let m = deep_tree();
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("2"), false);
    manager.cluster(&m, &NodeId::from("1"), false);

    // Expanding 2's cluster removes its members from the root list, so a
    // recompute only rebuilds 1's cluster.
    let cluster2_id = manager.clusters()[0].id.clone();
    manager.expand(&cluster2_id).expect("cluster of 2 exists");
    manager.recompute(&m);

    let roots: Vec<_> = manager.roots().cloned().collect();
    assert_eq!(roots, vec![NodeId::from("1")]);
    // With 2 no longer a separate cluster, 1 absorbs the whole tree.
    assert_eq!(manager.clusters().len(), 1);
    assert_eq!(manager.clusters()[0].nodes.len(), 5);
}

#[test]
fn synthesized_label_invites_expansion() {
    let m = deep_tree();
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("4"), false);

    let cluster = &manager.clusters()[0];
    assert_eq!(cluster.label, "label-4 cluster (double-click to expand)");
    assert!(cluster.title.contains("(double-click to expand)"));
}

#[test]
fn diamond_edges_are_absorbed_once() {
    // 1 -> 2, 1 -> 3, 2 -> 4, 3 -> 4: two paths into 4.
    let m = model(
        vec![
            node("1", 1, "PRODUCT"),
            node("2", 2, "RISK"),
            node("3", 2, "RISK"),
            node("4", 3, "COVERAGE"),
        ],
        vec![
            edge("e12", "1", "2", 2),
            edge("e13", "1", "3", 2),
            edge("e24", "2", "4", 3),
            edge("e34", "3", "4", 3),
        ],
    );
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("1"), false);

    let cluster = &manager.clusters()[0];
    assert_eq!(cluster.nodes.len(), 4, "4 absorbed once");
    assert_eq!(cluster.edges.len(), 4, "both edges into 4 absorbed");
}

#[test]
fn bidirectional_pair_terminates() {
    let m = model(
        vec![node("1", 1, "PRODUCT"), node("2", 2, "RISK")],
        vec![edge("e12", "1", "2", 2), edge("e21", "2", "1", 2)],
    );
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("1"), false);

    let cluster = &manager.clusters()[0];
    assert_eq!(id_set(&cluster.nodes).len(), 2);
    assert_eq!(
        cluster.edges.iter().collect::<HashSet<_>>().len(),
        2,
        "back edge absorbed exactly once"
    );
}

#[test]
fn long_cycle_terminates_with_full_membership() {
    // 1 -> 2 -> 3 -> 4 -> 1.
    let m = model(
        vec![
            node("1", 1, "PRODUCT"),
            node("2", 2, "RISK"),
            node("3", 3, "RISK"),
            node("4", 4, "RISK"),
        ],
        vec![
            edge("e12", "1", "2", 2),
            edge("e23", "2", "3", 3),
            edge("e34", "3", "4", 4),
            edge("e41", "4", "1", 4),
        ],
    );
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("1"), false);

    let cluster = &manager.clusters()[0];
    assert_eq!(cluster.nodes.len(), 4);
    assert_eq!(cluster.edges.len(), 4);
}

#[test]
fn immediate_only_excludes_grandchildren() {
    let m = deep_tree();
    let mut manager = ClusterManager::new();
    manager.cluster(&m, &NodeId::from("2"), true);

    let cluster = &manager.clusters()[0];
    assert_eq!(
        id_set(&cluster.nodes),
        id_set(&[NodeId::from("2"), NodeId::from("3"), NodeId::from("4")])
    );
    assert!(!cluster.edges.contains(&EdgeId::from("e45")));
}
