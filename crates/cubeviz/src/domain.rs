//! Domain types for cube dependency graphs.
//!
//! A loaded graph is a flat list of nodes and edges with per-element `level`
//! and `group` attributes. [`GraphModel`] owns one such snapshot together
//! with a petgraph adjacency index used by the cluster walk. The model is
//! replaced wholesale on every load; it is never merged.

use crate::scope::Scope;
use petgraph::graph::{DiGraph, NodeIndex};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Unique identifier for a graph node.
///
/// Stable across reloads within a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub String);

impl NodeId {
    /// Create a new node ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for NodeId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for NodeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Unique identifier for a graph edge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeId(pub String);

impl EdgeId {
    /// Create a new edge ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for EdgeId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier for a collapsed cluster, synthesized by the cluster manager.
///
/// Cluster IDs share the textual space of node IDs: a double-click event on a
/// collapsed cluster reports the cluster ID where a node ID would otherwise
/// appear.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClusterId(pub String);

impl ClusterId {
    /// Create a new cluster ID.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClusterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClusterId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A rendered graph node backed by a cube.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Unique identifier.
    pub id: NodeId,

    /// Display label.
    pub label: String,

    /// Tooltip text.
    #[serde(default)]
    pub title: String,

    /// Free-text description.
    #[serde(default)]
    pub desc: String,

    /// Depth from the visualization root. The root is level 1; levels are
    /// non-decreasing along any edge.
    pub level: u32,

    /// Entity group, carrying the group-suffix token to disambiguate group
    /// keys from value-level identifiers. Strip the suffix before comparing.
    pub group: String,

    /// Backing cube name, used for cross-navigation.
    pub name: String,

    /// Scope snapshot to carry forward if this node is re-visualized.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<Scope>,

    /// Enriched trait payload, present after an on-demand trait fetch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traits: Option<serde_json::Value>,
}

/// A directed edge between two nodes.
///
/// The edge level is inherited from the deeper endpoint and participates in
/// depth filtering independently of node exclusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    /// Unique identifier.
    pub id: EdgeId,

    /// Source node ID.
    pub from: NodeId,

    /// Target node ID.
    pub to: NodeId,

    /// Depth of the deeper endpoint.
    pub level: u32,
}

/// Strip the group-suffix token from a group key.
///
/// Checkbox identifiers and server-side group names append the suffix to
/// avoid collisions with value literals, so every group comparison works on
/// the prefix.
pub fn group_key_prefix<'a>(group: &'a str, suffix: &str) -> &'a str {
    if suffix.is_empty() {
        return group;
    }
    match group.find(suffix) {
        Some(pos) => &group[..pos],
        None => group,
    }
}

/// Compare two group identifiers after stripping the group-suffix token.
pub fn group_ids_equal(a: &str, b: &str, suffix: &str) -> bool {
    group_key_prefix(a, suffix) == group_key_prefix(b, suffix)
}

/// One loaded graph snapshot.
///
/// Holds the full node and edge sets independent of current visibility,
/// plus a directed adjacency index for descendant traversal. Node and edge
/// order is the order of receipt.
#[derive(Debug, Clone)]
pub struct GraphModel {
    nodes: Vec<Node>,
    edges: Vec<Edge>,

    /// Adjacency over node IDs; edge weights index into `edges`.
    graph: DiGraph<NodeId, usize>,

    /// Mapping from node ID to graph index. Every node in `nodes` has an
    /// entry here.
    node_map: HashMap<NodeId, NodeIndex>,

    /// Full group catalog: group key to human-readable label.
    pub all_groups: BTreeMap<String, String>,

    /// Groups present anywhere in the loaded graph.
    pub available_groups_all_levels: Vec<String>,

    /// Token appended to group keys; stripped before any group comparison.
    pub group_suffix: String,

    /// Deepest level present in the graph.
    pub max_level: u32,

    /// Total node count as reported by the backend.
    pub node_count: usize,
}

impl GraphModel {
    /// Build a model from a fetch payload.
    ///
    /// Edges referencing unknown node IDs are kept in the edge list (they
    /// still participate in level filtering) but skipped in the adjacency
    /// index, with a warning.
    pub fn new(
        nodes: Vec<Node>,
        edges: Vec<Edge>,
        all_groups: BTreeMap<String, String>,
        available_groups_all_levels: Vec<String>,
        group_suffix: String,
        max_level: u32,
        node_count: usize,
    ) -> Self {
        let mut graph = DiGraph::new();
        let mut node_map = HashMap::with_capacity(nodes.len());
        for node in &nodes {
            let index = graph.add_node(node.id.clone());
            node_map.insert(node.id.clone(), index);
        }
        for (edge_index, edge) in edges.iter().enumerate() {
            match (node_map.get(&edge.from), node_map.get(&edge.to)) {
                (Some(&from), Some(&to)) => {
                    graph.add_edge(from, to, edge_index);
                }
                _ => {
                    tracing::warn!(edge = %edge.id, "edge references unknown node, skipping in adjacency");
                }
            }
        }

        Self {
            nodes,
            edges,
            graph,
            node_map,
            all_groups,
            available_groups_all_levels,
            group_suffix,
            max_level,
            node_count,
        }
    }

    /// All nodes in receipt order.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// All edges in receipt order.
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Look up a node by ID.
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.node_map
            .get(id)
            .map(|&index| &self.nodes[index.index()])
    }

    /// Whether a node with the given ID exists.
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.node_map.contains_key(id)
    }

    /// Replace a node in place, matched by ID.
    ///
    /// Used after a trait fetch returns an enriched copy of the node.
    /// Returns `false` if no node with the ID exists; the model is then
    /// unchanged.
    pub fn replace_node(&mut self, new_node: Node) -> bool {
        match self.node_map.get(&new_node.id) {
            Some(&index) => {
                self.nodes[index.index()] = new_node;
                true
            }
            None => false,
        }
    }

    /// Outgoing edges of a node, in no particular order.
    ///
    /// Returns an empty iterator for unknown IDs.
    pub fn outgoing(&self, id: &NodeId) -> impl Iterator<Item = &Edge> + '_ {
        self.node_map
            .get(id)
            .into_iter()
            .flat_map(|&index| self.graph.edges(index))
            .map(|edge| &self.edges[*edge.weight()])
    }
}
