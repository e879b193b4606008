//! Rendering collaborator contract.
//!
//! The visual engine is a black box consuming a nodes/edges list and a
//! per-group styling configuration, and exposing removal, collapse, and
//! expansion primitives. Re-rendering fully replaces the prior graph; there
//! is no incremental patching. [`HeadlessRenderer`] is a complete in-process
//! implementation used by the CLI and by tests.

use crate::cluster::Cluster;
use crate::domain::{ClusterId, Edge, EdgeId, Node, NodeId};
use std::collections::BTreeMap;

/// Node shape drawn for a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Rectangular box.
    Box,

    /// Star marker.
    Star,

    /// Ellipse.
    Ellipse,

    /// Filled circle.
    Circle,

    /// Small dot, used for enum groups.
    Dot,
}

/// Render style for one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupStyle {
    /// Shape for the group's nodes.
    pub shape: Shape,

    /// Fill color.
    pub color: &'static str,

    /// Label color override for dark fills.
    pub font_color: Option<&'static str>,
}

impl GroupStyle {
    const fn new(shape: Shape, color: &'static str) -> Self {
        Self {
            shape,
            color,
            font_color: None,
        }
    }

    const fn with_font(shape: Shape, color: &'static str, font_color: &'static str) -> Self {
        Self {
            shape,
            color,
            font_color: Some(font_color),
        }
    }
}

/// The default style catalog, keyed by suffix-stripped group name.
///
/// Every entity group has a dot-shaped `_ENUM` counterpart for the relay
/// cubes between entities.
pub fn default_group_styles() -> BTreeMap<String, GroupStyle> {
    let entity_styles = [
        ("PRODUCT", GroupStyle::new(Shape::Box, "#DAE4FA")),
        ("RISK", GroupStyle::new(Shape::Box, "#759BEC")),
        (
            "COVERAGE",
            GroupStyle::with_font(Shape::Box, "#113275", "#D8D8D8"),
        ),
        ("CONTAINER", GroupStyle::new(Shape::Star, "#731d1d")),
        ("LIMIT", GroupStyle::new(Shape::Ellipse, "#FFFF99")),
        ("DEDUCTIBLE", GroupStyle::new(Shape::Ellipse, "#FFFF99")),
        (
            "PREMIUM",
            GroupStyle::with_font(Shape::Circle, "#0B930B", "#D8D8D8"),
        ),
        ("RATE", GroupStyle::new(Shape::Ellipse, "#EAC259")),
        ("RATEFACTOR", GroupStyle::new(Shape::Ellipse, "#EAC259")),
        ("ROLE", GroupStyle::new(Shape::Box, "#F59D56")),
        ("ROLEPLAYER", GroupStyle::new(Shape::Box, "#F2F2F2")),
        ("PARTY", GroupStyle::new(Shape::Box, "#004000")),
        ("PLACE", GroupStyle::new(Shape::Box, "#481849")),
    ];

    let mut styles = BTreeMap::new();
    for (name, style) in entity_styles {
        styles.insert(name.to_string(), style);
        styles.insert(
            format!("{name}_ENUM"),
            GroupStyle::new(Shape::Dot, "gray"),
        );
    }
    styles
}

/// Configuration handed to the renderer on every draw.
#[derive(Debug, Clone)]
pub struct RenderOptions {
    /// Hierarchical layout toggle.
    pub hierarchical: bool,

    /// Per-group styling, keyed by suffix-stripped group name.
    pub group_styles: BTreeMap<String, GroupStyle>,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            hierarchical: false,
            group_styles: default_group_styles(),
        }
    }
}

/// Interaction events emitted by the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererEvent {
    /// A single node was selected.
    Select(NodeId),

    /// Nodes were double-clicked. A collapsed cluster reports its cluster
    /// ID in node-ID position.
    DoubleClick(Vec<NodeId>),
}

/// Graph-drawing collaborator.
pub trait GraphRenderer {
    /// Replace the rendered graph with the given nodes and edges. The prior
    /// instance is torn down; no partial-render states are observable.
    fn draw(&mut self, nodes: &[Node], edges: &[Edge], options: &RenderOptions);

    /// Remove nodes by ID from the rendered graph.
    fn remove_nodes(&mut self, ids: &[NodeId]);

    /// Remove edges by ID from the rendered graph.
    fn remove_edges(&mut self, ids: &[EdgeId]);

    /// Collapse the given cluster's members into a single representation.
    fn collapse(&mut self, cluster: &Cluster);

    /// Member node IDs of a collapsed cluster. Empty for unknown IDs.
    fn nodes_in_cluster(&self, id: &ClusterId) -> Vec<NodeId>;

    /// Restore a collapsed cluster's original nodes and edges.
    fn open_cluster(&mut self, id: &ClusterId);
}

/// A collapsed cluster held by the headless renderer, with the display
/// elements it swallowed.
#[derive(Debug, Clone)]
struct CollapsedCluster {
    cluster: Cluster,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
}

/// In-process renderer tracking displayed state without drawing anything.
///
/// Backs the CLI output and controller tests: after any sequence of draw,
/// removal, collapse, and expand calls, it can report exactly which nodes
/// and edges are displayed.
#[derive(Debug, Default)]
pub struct HeadlessRenderer {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    collapsed: Vec<CollapsedCluster>,
    options: Option<RenderOptions>,
    draw_count: usize,
}

impl HeadlessRenderer {
    /// Create an empty renderer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently displayed nodes (post-removal, post-collapse).
    pub fn displayed_nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Currently displayed edges.
    pub fn displayed_edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Currently collapsed cluster IDs, in collapse order.
    pub fn collapsed_clusters(&self) -> Vec<ClusterId> {
        self.collapsed.iter().map(|c| c.cluster.id.clone()).collect()
    }

    /// Options from the latest draw.
    pub fn options(&self) -> Option<&RenderOptions> {
        self.options.as_ref()
    }

    /// Number of full redraws so far.
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }
}

impl GraphRenderer for HeadlessRenderer {
    fn draw(&mut self, nodes: &[Node], edges: &[Edge], options: &RenderOptions) {
        self.nodes = nodes.to_vec();
        self.edges = edges.to_vec();
        self.collapsed.clear();
        self.options = Some(options.clone());
        self.draw_count += 1;
    }

    fn remove_nodes(&mut self, ids: &[NodeId]) {
        self.nodes.retain(|node| !ids.contains(&node.id));
    }

    fn remove_edges(&mut self, ids: &[EdgeId]) {
        self.edges.retain(|edge| !ids.contains(&edge.id));
    }

    fn collapse(&mut self, cluster: &Cluster) {
        let (absorbed_nodes, kept_nodes) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|node| cluster.nodes.contains(&node.id));
        let (absorbed_edges, kept_edges) = std::mem::take(&mut self.edges)
            .into_iter()
            .partition(|edge: &Edge| cluster.edges.contains(&edge.id));
        self.nodes = kept_nodes;
        self.edges = kept_edges;
        self.collapsed.push(CollapsedCluster {
            cluster: cluster.clone(),
            nodes: absorbed_nodes,
            edges: absorbed_edges,
        });
    }

    fn nodes_in_cluster(&self, id: &ClusterId) -> Vec<NodeId> {
        self.collapsed
            .iter()
            .find(|c| &c.cluster.id == id)
            .map(|c| c.cluster.nodes.clone())
            .unwrap_or_default()
    }

    fn open_cluster(&mut self, id: &ClusterId) {
        if let Some(pos) = self.collapsed.iter().position(|c| &c.cluster.id == id) {
            let collapsed = self.collapsed.remove(pos);
            self.nodes.extend(collapsed.nodes);
            self.edges.extend(collapsed.edges);
        }
    }
}
