//! Typed request/response schemas for the remote graph boundary.
//!
//! The backend is consumed through [`GraphFetcher`]. Responses are a tagged
//! enum validated at the boundary: success carries the full visualization
//! payload, missing-start-scope carries scope only, and anything else is a
//! domain failure with a message and optional diagnostic trace.

use crate::domain::{Edge, Node};
use crate::error::Result;
use crate::scope::Scope;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Full visualization payload for one graph instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisualizerInfo {
    /// Full group catalog: group key to human-readable label.
    pub all_groups: BTreeMap<String, String>,

    /// Groups appearing anywhere in the loaded graph.
    pub available_groups_all_levels: Vec<String>,

    /// Groups the backend selected for initial display.
    pub selected_groups: Vec<String>,

    /// Depth the backend selected for initial display.
    pub selected_level: u32,

    /// Token appended to group keys to disambiguate them from value-level
    /// identifiers.
    pub group_suffix: String,

    /// Total node count.
    pub node_count: usize,

    /// Deepest level present in the graph.
    pub max_level: u32,

    /// Node list with level/group attributes.
    pub nodes: Vec<Node>,

    /// Edge list with level attributes.
    pub edges: Vec<Edge>,

    /// Scope the graph was resolved against. May still carry backend
    /// envelope keys; strip before use.
    pub scope: Scope,

    /// Scope keys the backend knows about.
    pub available_scope_keys: Vec<String>,

    /// Known values per scope key.
    #[serde(default)]
    pub available_scope_values: BTreeMap<String, Vec<String>>,
}

/// Request for a full graph instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphRequest {
    /// Cube to start the visualization from.
    pub start_cube_name: String,

    /// Resolved scope for this load.
    pub scope: Scope,

    /// Previously selected depth, if any; `None` lets the backend choose.
    pub selected_level: Option<u32>,

    /// Previously selected groups, if any; `None` lets the backend choose.
    pub selected_groups: Option<Vec<String>>,

    /// Scope keys known from prior responses.
    pub available_scope_keys: Vec<String>,

    /// Scope values known from prior responses.
    pub available_scope_values: BTreeMap<String, Vec<String>>,

    /// Whether per-node traits should be loaded eagerly.
    pub load_traits: bool,
}

/// Request for enriched trait data for one node.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraitRequest {
    /// The node to enrich.
    pub node: Node,

    /// Current scope.
    pub scope: Scope,

    /// Scope keys known from prior responses.
    pub available_scope_keys: Vec<String>,

    /// Scope values known from prior responses.
    pub available_scope_values: BTreeMap<String, Vec<String>>,
}

/// Outcome of a graph or trait fetch that reached the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum GraphResponse {
    /// The fetch produced a graph (or, for a trait fetch, the enriched
    /// node as the sole entry of the payload's node list).
    #[serde(rename_all = "camelCase")]
    Success {
        /// Informational message to surface, if any.
        message: Option<String>,

        /// The visualization payload.
        vis_info: Box<VisualizerInfo>,
    },

    /// The backend needs scope before it can build a graph. Not an error: a
    /// guided state prompting the user to supply scope.
    #[serde(rename_all = "camelCase")]
    MissingStartScope {
        /// Prompt to surface, if any.
        message: Option<String>,

        /// Scope skeleton to present for editing.
        scope: Scope,

        /// Scope keys the backend knows about.
        #[serde(default)]
        available_scope_keys: Vec<String>,

        /// Known values per scope key.
        #[serde(default)]
        available_scope_values: BTreeMap<String, Vec<String>>,
    },

    /// The fetch reached the backend but failed at the domain level.
    #[serde(rename_all = "camelCase")]
    Failure {
        /// Failure message.
        message: String,

        /// Optional diagnostic trace.
        stack_trace: Option<String>,
    },
}

/// Remote boundary producing graph instances and per-node traits.
///
/// Calls are synchronous-style request/response: one round trip per user
/// action, no cancellation, no overlap guard. A transport-level failure is
/// an `Err`; a domain-level failure is `Ok(GraphResponse::Failure)`.
#[async_trait]
pub trait GraphFetcher: Send + Sync {
    /// Fetch a full graph instance for the given request.
    async fn fetch_graph(&self, request: GraphRequest) -> Result<GraphResponse>;

    /// Fetch enriched trait data for a single node.
    async fn fetch_traits(&self, request: TraitRequest) -> Result<GraphResponse>;
}
