//! Collapsing and re-expanding descendant subtrees.
//!
//! The manager keeps the ordered list of registered cluster roots and
//! recomputes every cluster's absorbed node/edge sets from the graph on each
//! change. Absorbed membership is derived state, never stored
//! authoritatively, so re-expansion always restores exactly what was
//! collapsed.

use crate::domain::{ClusterId, EdgeId, GraphModel, NodeId};
use std::collections::{HashSet, VecDeque};

/// Suffix appended to a collapsed node's label.
const CLUSTER_LABEL_SUFFIX: &str = " cluster (double-click to expand)";

/// A collapsed aggregate of a root node and its absorbed descendants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cluster {
    /// Synthesized identifier handed to the rendering collaborator.
    pub id: ClusterId,

    /// The registered root node.
    pub root: NodeId,

    /// Display label for the collapsed representation.
    pub label: String,

    /// Tooltip for the collapsed representation.
    pub title: String,

    /// Absorbed node IDs, root first, then discovery order.
    pub nodes: Vec<NodeId>,

    /// Absorbed edge IDs in discovery order.
    pub edges: Vec<EdgeId>,
}

/// Maintains the set of currently clustered subtrees.
///
/// Reset to empty whenever the graph model is replaced; mutated only via
/// explicit cluster/expand actions.
#[derive(Debug, Clone, Default)]
pub struct ClusterManager {
    /// Registered roots in registration order, with the descendant policy
    /// chosen at registration (immediate children only, or full subtree).
    roots: Vec<(NodeId, bool)>,

    /// Active clusters, recomputed from `roots` in registration order.
    clusters: Vec<Cluster>,

    /// Derived: every node ID absorbed into some active cluster.
    absorbed: HashSet<NodeId>,
}

impl ClusterManager {
    /// Create an empty manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `root` as a cluster root and recompute all clusters.
    ///
    /// Registering an already-registered root is a no-op: the recomputed
    /// membership is unchanged. `immediate_only` restricts the cluster to
    /// the root's direct children instead of the full subtree.
    ///
    /// # Panics
    ///
    /// Panics if `root` does not exist in `model`. Requesting a cluster for
    /// an unknown node is a usage defect; callers must validate existence
    /// first.
    pub fn cluster(&mut self, model: &GraphModel, root: &NodeId, immediate_only: bool) {
        assert!(
            model.contains_node(root),
            "node {root} given to cluster() does not exist"
        );
        if !self.roots.iter().any(|(id, _)| id == root) {
            self.roots.push((root.clone(), immediate_only));
            tracing::debug!(%root, immediate_only, "registered cluster root");
        }
        self.recompute(model);
    }

    /// Rebuild every registered cluster against the current model.
    ///
    /// Clusters are processed in registration order against a shared
    /// absorbed set, so a root swallowed by an earlier cluster produces no
    /// cluster of its own and regions never overlap.
    pub fn recompute(&mut self, model: &GraphModel) {
        self.clusters.clear();
        self.absorbed.clear();
        let mut absorbed_edges: HashSet<EdgeId> = HashSet::new();

        let roots = self.roots.clone();
        for (root, immediate_only) in &roots {
            if self.absorbed.contains(root) || !model.contains_node(root) {
                continue;
            }
            let cluster = collect_descendants(
                model,
                root,
                *immediate_only,
                &self.absorbed,
                &absorbed_edges,
            );
            for id in &cluster.nodes {
                self.absorbed.insert(id.clone());
            }
            for id in &cluster.edges {
                absorbed_edges.insert(id.clone());
            }
            self.clusters.push(cluster);
        }
    }

    /// Expand the cluster with the given ID.
    ///
    /// Removes the cluster, deregisters any of its member nodes from the
    /// root list (so they stop being re-clustered on the next recompute),
    /// and returns the absorbed member sets so the rendering collaborator
    /// can restore the original nodes and edges. Returns `None` for an
    /// unknown cluster ID.
    pub fn expand(&mut self, id: &ClusterId) -> Option<Cluster> {
        let pos = self.clusters.iter().position(|c| &c.id == id)?;
        let cluster = self.clusters.remove(pos);
        self.roots
            .retain(|(root, _)| !cluster.nodes.contains(root));
        for node in &cluster.nodes {
            self.absorbed.remove(node);
        }
        tracing::debug!(root = %cluster.root, members = cluster.nodes.len(), "expanded cluster");
        Some(cluster)
    }

    /// Active clusters in registration order.
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    /// Registered root IDs in registration order.
    pub fn roots(&self) -> impl Iterator<Item = &NodeId> {
        self.roots.iter().map(|(id, _)| id)
    }

    /// Whether the given ID names an active cluster.
    pub fn is_cluster(&self, id: &ClusterId) -> bool {
        self.clusters.iter().any(|c| &c.id == id)
    }

    /// Whether a node is currently absorbed into some cluster.
    pub fn is_absorbed(&self, id: &NodeId) -> bool {
        self.absorbed.contains(id)
    }

    /// Member node IDs of an active cluster.
    pub fn members(&self, id: &ClusterId) -> Option<&[NodeId]> {
        self.clusters
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.nodes.as_slice())
    }

    /// Drop all registered roots and active clusters.
    ///
    /// Called whenever the graph model is replaced.
    pub fn reset(&mut self) {
        self.roots.clear();
        self.clusters.clear();
        self.absorbed.clear();
    }
}

/// Synthesize the cluster ID for a root node.
fn cluster_id_for(root: &NodeId) -> ClusterId {
    ClusterId::new(format!("cluster:{root}"))
}

/// Collect the descendant region absorbed by one root.
///
/// Breadth-first walk over outgoing edges. An edge is skipped when a
/// previously processed cluster already absorbed it; a self-referencing edge
/// absorbs the edge only, not a new node; a child already absorbed by an
/// earlier cluster is left alone. Traversal is bounded by a visited set
/// keyed by node ID, so cycles of any length terminate.
fn collect_descendants(
    model: &GraphModel,
    root: &NodeId,
    immediate_only: bool,
    absorbed_elsewhere: &HashSet<NodeId>,
    edges_elsewhere: &HashSet<EdgeId>,
) -> Cluster {
    let mut nodes = vec![root.clone()];
    let mut edges: Vec<EdgeId> = Vec::new();
    let mut visited: HashSet<NodeId> = HashSet::from([root.clone()]);
    let mut taken_edges: HashSet<EdgeId> = HashSet::new();
    let mut pending: VecDeque<NodeId> = VecDeque::from([root.clone()]);

    while let Some(current) = pending.pop_front() {
        for edge in model.outgoing(&current) {
            if edges_elsewhere.contains(&edge.id) || taken_edges.contains(&edge.id) {
                continue;
            }
            if edge.to == edge.from {
                // Swallow the edge if it is self-referencing.
                taken_edges.insert(edge.id.clone());
                edges.push(edge.id.clone());
                continue;
            }
            if absorbed_elsewhere.contains(&edge.to) {
                continue;
            }
            taken_edges.insert(edge.id.clone());
            edges.push(edge.id.clone());
            if visited.insert(edge.to.clone()) {
                nodes.push(edge.to.clone());
                if !immediate_only {
                    pending.push_back(edge.to.clone());
                }
            }
        }
    }

    let (label, title) = match model.node(root) {
        Some(node) => (
            format!("{}{CLUSTER_LABEL_SUFFIX}", node.label),
            format!("{}\n\n(double-click to expand)", node.title),
        ),
        None => (
            format!("{root}{CLUSTER_LABEL_SUFFIX}"),
            "(double-click to expand)".to_string(),
        ),
    };

    Cluster {
        id: cluster_id_for(root),
        root: root.clone(),
        label,
        title,
        nodes,
        edges,
    }
}
