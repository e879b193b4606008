//! Depth and group visibility filtering.
//!
//! Given the selected depth and the selected groups, derives the excluded
//! node and edge ID sets along with the groups actually present at the
//! current depth. Pure: the graph model is never mutated.

use crate::domain::{group_ids_equal, group_key_prefix, EdgeId, GraphModel, NodeId};

/// Result of one visibility computation.
#[derive(Debug, Clone, Default)]
pub struct Visibility {
    /// Node IDs hidden at the current depth/group selection, in model order.
    pub excluded_nodes: Vec<NodeId>,

    /// Edge IDs whose own level exceeds the selected depth, in model order.
    pub excluded_edges: Vec<EdgeId>,

    /// Suffix-stripped groups appearing within the visible depth, first-seen
    /// order, deduplicated. Drives which group checkboxes are meaningful.
    pub available_groups_at_level: Vec<String>,

    /// The requested groups that were actually matched by at least one
    /// visible node. Groups that vanish from the visible depth are dropped
    /// silently.
    pub selected_groups: Vec<String>,
}

impl Visibility {
    /// Whether a node survived the filter.
    pub fn is_node_visible(&self, id: &NodeId) -> bool {
        !self.excluded_nodes.contains(id)
    }

    /// Whether an edge survived the filter on its own level. An edge with
    /// an excluded endpoint is disconnected regardless.
    pub fn is_edge_visible(&self, id: &EdgeId) -> bool {
        !self.excluded_edges.contains(id)
    }
}

/// Partition the model into visible and excluded subsets.
///
/// A node is excluded when its level exceeds `selected_level`, or when its
/// suffix-stripped group is not in `selected_groups` (groups gate visibility
/// independently of depth). Every node within the depth contributes its
/// group to `available_groups_at_level` regardless of selection. Edges are
/// excluded solely on their own level; the check is independent of endpoint
/// visibility for robustness.
///
/// An empty model is valid and yields empty sets.
pub fn compute_visibility(
    model: &GraphModel,
    selected_level: u32,
    selected_groups: &[String],
) -> Visibility {
    let suffix = &model.group_suffix;
    let mut excluded_nodes = Vec::new();
    let mut available_groups_at_level: Vec<String> = Vec::new();
    let mut effective_groups: Vec<String> = Vec::new();

    for node in model.nodes() {
        let selected = selected_groups
            .iter()
            .any(|group| group_ids_equal(&node.group, group, suffix));

        if node.level > selected_level {
            excluded_nodes.push(node.id.clone());
            continue;
        }

        let prefix = group_key_prefix(&node.group, suffix);
        if selected {
            if !effective_groups.iter().any(|g| g == prefix) {
                effective_groups.push(prefix.to_string());
            }
        } else {
            excluded_nodes.push(node.id.clone());
        }
        if !available_groups_at_level.iter().any(|g| g == prefix) {
            available_groups_at_level.push(prefix.to_string());
        }
    }

    let mut excluded_edges = Vec::new();
    for edge in model.edges() {
        if edge.level > selected_level {
            excluded_edges.push(edge.id.clone());
        }
    }

    tracing::debug!(
        level = selected_level,
        excluded_nodes = excluded_nodes.len(),
        excluded_edges = excluded_edges.len(),
        "computed visibility"
    );

    Visibility {
        excluded_nodes,
        excluded_edges,
        available_groups_at_level,
        selected_groups: effective_groups,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Edge, Node};
    use std::collections::BTreeMap;

    fn node(id: &str, level: u32, group: &str) -> Node {
        Node {
            id: NodeId::from(id),
            label: id.to_string(),
            title: String::new(),
            desc: String::new(),
            level,
            group: group.to_string(),
            name: id.to_string(),
            scope: None,
            traits: None,
        }
    }

    fn edge(id: &str, from: &str, to: &str, level: u32) -> Edge {
        Edge {
            id: EdgeId::from(id),
            from: NodeId::from(from),
            to: NodeId::from(to),
            level,
        }
    }

    fn model(nodes: Vec<Node>, edges: Vec<Edge>) -> GraphModel {
        let count = nodes.len();
        GraphModel::new(
            nodes,
            edges,
            BTreeMap::new(),
            vec![],
            "_GROUP".to_string(),
            3,
            count,
        )
    }

    fn groups(names: &[&str]) -> Vec<String> {
        names.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn excludes_nodes_and_edges_beyond_level() {
        let m = model(
            vec![
                node("1", 1, "PRODUCT"),
                node("2", 2, "RISK"),
                node("3", 3, "RISK"),
            ],
            vec![edge("e1", "1", "2", 2), edge("e2", "2", "3", 3)],
        );
        let vis = compute_visibility(&m, 2, &groups(&["PRODUCT", "RISK"]));
        assert_eq!(vis.excluded_nodes, vec![NodeId::from("3")]);
        assert_eq!(vis.excluded_edges, vec![EdgeId::from("e2")]);
    }

    #[test]
    fn unselected_group_is_excluded_within_level() {
        let m = model(
            vec![node("1", 1, "PRODUCT"), node("2", 2, "RISK")],
            vec![],
        );
        let vis = compute_visibility(&m, 2, &groups(&["PRODUCT"]));
        assert_eq!(vis.excluded_nodes, vec![NodeId::from("2")]);
        // The unselected group still counts as available at this depth.
        assert_eq!(vis.available_groups_at_level, groups(&["PRODUCT", "RISK"]));
    }

    #[test]
    fn vanished_groups_dropped_from_selection() {
        let m = model(
            vec![node("1", 1, "PRODUCT"), node("2", 3, "RISK")],
            vec![],
        );
        let vis = compute_visibility(&m, 1, &groups(&["PRODUCT", "RISK"]));
        assert_eq!(vis.selected_groups, groups(&["PRODUCT"]));
    }

    #[test]
    fn group_suffix_is_stripped_for_comparison() {
        let m = model(vec![node("1", 1, "PRODUCT_GROUP")], vec![]);
        let vis = compute_visibility(&m, 1, &groups(&["PRODUCT"]));
        assert!(vis.excluded_nodes.is_empty());
        assert_eq!(vis.selected_groups, groups(&["PRODUCT"]));
        assert_eq!(vis.available_groups_at_level, groups(&["PRODUCT"]));
    }

    #[test]
    fn empty_graph_is_valid() {
        let m = model(vec![], vec![]);
        let vis = compute_visibility(&m, 5, &groups(&["PRODUCT"]));
        assert!(vis.excluded_nodes.is_empty());
        assert!(vis.excluded_edges.is_empty());
        assert!(vis.available_groups_at_level.is_empty());
        assert!(vis.selected_groups.is_empty());
    }
}
