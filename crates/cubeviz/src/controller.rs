//! View orchestration: one controller instance per visualization view.
//!
//! The controller owns the scope, the loaded graph model, the cluster
//! manager, and the current visibility, and reduces explicit [`Action`]
//! values against that state. All state transitions happen on discrete user
//! or fetch-completion events; there is no cross-view sharing. A new load is
//! not guarded against overlapping a prior in-flight one: last response
//! wins.

use crate::cluster::ClusterManager;
use crate::domain::{group_ids_equal, ClusterId, GraphModel, Node, NodeId};
use crate::error::{Error, Result};
use crate::fetch::{GraphFetcher, GraphRequest, GraphResponse, TraitRequest, VisualizerInfo};
use crate::render::{GraphRenderer, RenderOptions, RendererEvent};
use crate::scope::{storage_key, Scope, ScopeStorage};
use crate::visibility::{compute_visibility, Visibility};
use std::collections::BTreeMap;

/// Lifecycle state of a visualization view.
///
/// Clustering and level/group interaction are enabled only in `Loaded`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewState {
    /// Nothing fetched yet.
    #[default]
    Unloaded,

    /// A graph is loaded and rendered.
    Loaded,

    /// The backend needs scope before it can build a graph; the scope form
    /// is shown and the graph is hidden.
    MissingScope,

    /// The last load failed; all graph UI is hidden.
    Failed,
}

/// A user-visible transient notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Message text.
    pub message: String,
}

/// User inputs reduced against the controller state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Fetch a graph for the selected cube with the resolved scope.
    Load,

    /// Clear the scope, then load.
    Reset,

    /// Re-filter and re-render from the in-memory model, without a fetch.
    Reload,

    /// Change the visible depth and reload.
    SetLevel(u32),

    /// Toggle a group's visibility selection.
    ToggleGroup(String),

    /// Toggle hierarchical layout and redraw.
    SetHierarchical(bool),

    /// Toggle eager trait loading on subsequent loads.
    SetLoadTraits(bool),

    /// Replace the scope from its text form and persist it.
    SetScopeText(String),

    /// Select a different cube and load it.
    SelectCube(String),

    /// Collapse a node's full descendant subtree.
    Cluster(NodeId),

    /// Re-expand a collapsed cluster.
    Expand(ClusterId),

    /// Fetch enriched trait data for one node.
    LoadTraits(NodeId),
}

/// Panel data for one node selection.
///
/// Surfaces the three actions bound to a selected node: navigate to the
/// backing cube, re-visualize starting from it, and fetch its traits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeSelection {
    /// Selected node ID.
    pub node_id: NodeId,

    /// Backing cube name, for cross-navigation.
    pub cube_name: String,

    /// Node description markup.
    pub desc: String,
}

/// One row of the group checkbox panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupRow {
    /// Suffix-stripped group key.
    pub key: String,

    /// Human-readable label from the catalog.
    pub label: String,

    /// Whether the group is currently selected.
    pub selected: bool,
}

/// Orchestrates one visualization view.
pub struct ViewController<R: GraphRenderer> {
    fetcher: Box<dyn GraphFetcher>,
    scope_store: Box<dyn ScopeStorage>,
    renderer: R,

    app_id: String,
    selected_cube_name: Option<String>,
    loaded_cube_name: Option<String>,

    scope: Scope,
    keep_current_scope: bool,
    reset: bool,
    available_scope_keys: Vec<String>,
    available_scope_values: BTreeMap<String, Vec<String>>,

    model: Option<GraphModel>,
    clusters: ClusterManager,
    visibility: Visibility,

    selected_level: Option<u32>,
    selected_groups: Option<Vec<String>>,
    hierarchical: bool,
    load_traits: bool,

    state: ViewState,
    notices: Vec<Notice>,
}

impl<R: GraphRenderer> ViewController<R> {
    /// Create a controller for one view of the given hosting application.
    pub fn new(
        fetcher: Box<dyn GraphFetcher>,
        scope_store: Box<dyn ScopeStorage>,
        renderer: R,
        app_id: impl Into<String>,
    ) -> Self {
        Self {
            fetcher,
            scope_store,
            renderer,
            app_id: app_id.into(),
            selected_cube_name: None,
            loaded_cube_name: None,
            scope: Scope::new(),
            keep_current_scope: false,
            reset: false,
            available_scope_keys: Vec::new(),
            available_scope_values: BTreeMap::new(),
            model: None,
            clusters: ClusterManager::new(),
            visibility: Visibility::default(),
            selected_level: None,
            selected_groups: None,
            hierarchical: false,
            load_traits: false,
            state: ViewState::default(),
            notices: Vec::new(),
        }
    }

    /// Reduce one action against the current state.
    ///
    /// # Errors
    ///
    /// Propagates scope-store IO failures and the no-cube-selected
    /// precondition. Fetch and domain failures are surfaced as notices, not
    /// errors.
    pub async fn dispatch(&mut self, action: Action) -> Result<()> {
        tracing::debug!(?action, "dispatch");
        match action {
            Action::Load => self.load().await,
            Action::Reset => {
                self.reset = true;
                self.load().await
            }
            Action::Reload => {
                self.reload();
                Ok(())
            }
            Action::SetLevel(level) => {
                self.selected_level = Some(level);
                self.reload();
                Ok(())
            }
            Action::ToggleGroup(group) => {
                self.toggle_group(&group);
                Ok(())
            }
            Action::SetHierarchical(hierarchical) => {
                self.hierarchical = hierarchical;
                self.redraw();
                Ok(())
            }
            Action::SetLoadTraits(load_traits) => {
                self.load_traits = load_traits;
                Ok(())
            }
            Action::SetScopeText(text) => self.set_scope_text(&text),
            Action::SelectCube(name) => {
                self.selected_cube_name = Some(name);
                self.load().await
            }
            Action::Cluster(node_id) => {
                self.cluster_node(&node_id, false);
                Ok(())
            }
            Action::Expand(cluster_id) => {
                self.expand_cluster(&cluster_id);
                Ok(())
            }
            Action::LoadTraits(node_id) => self.fetch_node_traits(&node_id).await.map(|_| ()),
        }
    }

    /// Handle an interaction event from the rendering collaborator.
    ///
    /// A double-click on a collapsed cluster expands it; on a regular node
    /// it collapses the node's full subtree.
    pub fn handle_event(&mut self, event: RendererEvent) -> Option<NodeSelection> {
        match event {
            RendererEvent::Select(node_id) => self.select_node(&node_id),
            RendererEvent::DoubleClick(ids) => {
                if let [id] = ids.as_slice() {
                    let as_cluster = ClusterId::new(id.as_str());
                    if self.clusters.is_cluster(&as_cluster) {
                        self.expand_cluster(&as_cluster);
                    } else {
                        self.cluster_node(id, false);
                    }
                }
                None
            }
        }
    }

    /// Fetch and render a graph for the selected cube.
    ///
    /// Scope is resolved in priority order: keep-current (armed by
    /// [`ViewController::revisualize`], consumed here), reset-to-none, then
    /// the persisted scope for this cube. A reset or a cube change also
    /// clears the depth/group/layout/trait selections.
    ///
    /// # Errors
    ///
    /// `Error::NoCubeSelected` if no cube is selected (no fetch attempted);
    /// scope-store failures are propagated. Fetch and domain failures
    /// transition to [`ViewState::Failed`] and are surfaced as notices.
    pub async fn load(&mut self) -> Result<()> {
        let Some(cube) = self.selected_cube_name.clone() else {
            self.state = ViewState::Failed;
            self.notify("Failed to load visualizer: no cube selected.");
            return Err(Error::NoCubeSelected);
        };

        if self.keep_current_scope {
            self.keep_current_scope = false;
        } else if self.reset {
            self.scope = Scope::new();
        } else {
            self.scope = self.scope_store.load(&storage_key(&self.app_id, &cube))?;
        }

        if self.reset || self.loaded_cube_name.as_deref() != Some(cube.as_str()) {
            self.selected_level = None;
            self.selected_groups = None;
            self.hierarchical = false;
            self.load_traits = false;
        }
        self.reset = false;

        let request = GraphRequest {
            start_cube_name: cube.clone(),
            scope: self.scope.clone(),
            selected_level: self.selected_level,
            selected_groups: self.selected_groups.clone(),
            available_scope_keys: self.available_scope_keys.clone(),
            available_scope_values: self.available_scope_values.clone(),
            load_traits: self.load_traits,
        };

        tracing::info!(%cube, scope = %self.scope, "loading visualizer graph");
        let response = match self.fetcher.fetch_graph(request).await {
            Ok(response) => response,
            Err(err) => {
                self.state = ViewState::Failed;
                self.notify(format!("Failed to load visualizer: {err}"));
                return Ok(());
            }
        };

        match response {
            GraphResponse::Success { message, vis_info } => {
                if let Some(message) = message {
                    self.notify(message);
                }
                self.adopt_graph(*vis_info, cube)?;
                self.state = ViewState::Loaded;
                Ok(())
            }
            GraphResponse::MissingStartScope {
                message,
                scope,
                available_scope_keys,
                available_scope_values,
            } => {
                if let Some(message) = message {
                    self.notify(message);
                }
                self.adopt_scope(scope);
                self.adopt_scope_metadata(available_scope_keys, available_scope_values);
                self.loaded_cube_name = Some(cube);
                self.persist_scope()?;
                self.state = ViewState::MissingScope;
                Ok(())
            }
            GraphResponse::Failure {
                message,
                stack_trace,
            } => {
                self.state = ViewState::Failed;
                match stack_trace {
                    Some(trace) => {
                        self.notify(format!("Failed to load visualizer: {message}\n\n{trace}"));
                    }
                    None => self.notify(format!("Failed to load visualizer: {message}")),
                }
                Ok(())
            }
        }
    }

    /// Re-apply the visibility filter and re-render from the loaded model,
    /// without a fetch. Used after a level or group change.
    pub fn reload(&mut self) {
        self.apply_visibility();
        self.redraw();
    }

    /// Fetch enriched trait data for one node, replacing it in the model.
    ///
    /// On any failure the model is left unchanged, the failure is surfaced
    /// as a notice, and the original node is returned.
    ///
    /// # Errors
    ///
    /// Propagates scope-store failures from persisting the refreshed scope.
    ///
    /// # Panics
    ///
    /// Panics if no graph is loaded or `node_id` does not exist in the
    /// model; callers must validate existence first.
    pub async fn fetch_node_traits(&mut self, node_id: &NodeId) -> Result<Node> {
        let model = self
            .model
            .as_ref()
            .expect("trait fetch requested with no graph loaded");
        let node = model
            .node(node_id)
            .unwrap_or_else(|| panic!("node {node_id} given to fetch_node_traits does not exist"))
            .clone();

        let request = TraitRequest {
            node: node.clone(),
            scope: self.scope.clone(),
            available_scope_keys: self.available_scope_keys.clone(),
            available_scope_values: self.available_scope_values.clone(),
        };

        let response = match self.fetcher.fetch_traits(request).await {
            Ok(response) => response,
            Err(err) => {
                self.notify(format!("Failed to load traits: {err}"));
                return Ok(node);
            }
        };

        match response {
            GraphResponse::Success { message, vis_info } => {
                if let Some(message) = message {
                    self.notify(message);
                }
                let info = *vis_info;
                let Some(enriched) = info.nodes.into_iter().next() else {
                    self.notify("Failed to load traits: empty payload.");
                    return Ok(node);
                };
                self.adopt_scope(info.scope);
                self.adopt_scope_metadata(info.available_scope_keys, info.available_scope_values);
                self.persist_scope()?;
                if let Some(model) = self.model.as_mut() {
                    model.replace_node(enriched.clone());
                }
                self.redraw();
                Ok(enriched)
            }
            GraphResponse::Failure {
                message,
                stack_trace,
            } => {
                match stack_trace {
                    Some(trace) => {
                        self.notify(format!("Failed to load traits: {message}\n\n{trace}"));
                    }
                    None => self.notify(format!("Failed to load traits: {message}")),
                }
                Ok(node)
            }
            GraphResponse::MissingStartScope { message, .. } => {
                let message = message.unwrap_or_else(|| "missing start scope".to_string());
                self.notify(format!("Failed to load traits: {message}"));
                Ok(node)
            }
        }
    }

    /// Surface the selection panel for a node; `None` for unknown IDs.
    pub fn select_node(&self, node_id: &NodeId) -> Option<NodeSelection> {
        let node = self.model.as_ref()?.node(node_id)?;
        Some(NodeSelection {
            node_id: node.id.clone(),
            cube_name: node.name.clone(),
            desc: node.desc.clone(),
        })
    }

    /// Arm a re-visualization starting from the given node.
    ///
    /// Adopts the node's scope snapshot and selects its backing cube; the
    /// next `load()` keeps this scope instead of resolving one, for exactly
    /// that one load. Returns the cube name to navigate to, or `None` for
    /// unknown IDs.
    pub fn revisualize(&mut self, node_id: &NodeId) -> Option<String> {
        let node = self.model.as_ref()?.node(node_id)?;
        let cube_name = node.name.clone();
        if let Some(scope) = node.scope.clone() {
            self.scope = scope;
        }
        self.keep_current_scope = true;
        self.selected_cube_name = Some(cube_name.clone());
        Some(cube_name)
    }

    /// Collapse a node's descendants into a cluster.
    ///
    /// Ignored unless a graph is loaded. `immediate_only` collapses only
    /// direct children instead of the full subtree.
    ///
    /// # Panics
    ///
    /// Panics if `node_id` does not exist in the loaded model.
    pub fn cluster_node(&mut self, node_id: &NodeId, immediate_only: bool) {
        if self.state != ViewState::Loaded {
            return;
        }
        let model = self.model.as_ref().expect("loaded state implies a model");
        self.clusters.cluster(model, node_id, immediate_only);
        self.redraw();
    }

    /// Expand a collapsed cluster, restoring its absorbed nodes and edges.
    pub fn expand_cluster(&mut self, cluster_id: &ClusterId) {
        if self.clusters.expand(cluster_id).is_some() {
            self.renderer.open_cluster(cluster_id);
        } else {
            tracing::warn!(%cluster_id, "expand requested for unknown cluster");
        }
    }

    /// Toggle a group's selection.
    ///
    /// Enabling a group not present at the current depth surfaces a notice;
    /// the next reload drops it from the effective selection silently.
    fn toggle_group(&mut self, group: &str) {
        let Some(model) = self.model.as_ref() else {
            return;
        };
        let suffix = model.group_suffix.clone();
        let catalog_name = model
            .available_groups_all_levels
            .iter()
            .find(|known| group_ids_equal(known, group, &suffix))
            .cloned();

        let selected = self.selected_groups.get_or_insert_with(Vec::new);
        if let Some(pos) = selected
            .iter()
            .position(|current| group_ids_equal(current, group, &suffix))
        {
            selected.remove(pos);
            return;
        }
        selected.push(catalog_name.unwrap_or_else(|| group.to_string()));

        let at_level = self
            .visibility
            .available_groups_at_level
            .iter()
            .any(|available| group_ids_equal(available, group, &suffix));
        if !at_level {
            let level = self.selected_level.unwrap_or(1);
            let level_label = if level == 1 { "level" } else { "levels" };
            let prefix = crate::domain::group_key_prefix(group, &suffix).to_string();
            self.notify(format!(
                "The group {prefix} is not included in the {level} {level_label} currently \
                 displayed. Increase the levels to include the group."
            ));
        }
    }

    /// Replace the scope from its text form and persist it.
    fn set_scope_text(&mut self, text: &str) -> Result<()> {
        self.scope = Scope::parse(text);
        self.persist_scope()
    }

    fn adopt_graph(&mut self, info: VisualizerInfo, cube: String) -> Result<()> {
        self.adopt_scope(info.scope);
        self.adopt_scope_metadata(info.available_scope_keys, info.available_scope_values);
        self.selected_level = Some(info.selected_level);
        self.selected_groups = Some(info.selected_groups);
        self.model = Some(GraphModel::new(
            info.nodes,
            info.edges,
            info.all_groups,
            info.available_groups_all_levels,
            info.group_suffix,
            info.max_level,
            info.node_count,
        ));
        self.clusters.reset();
        self.loaded_cube_name = Some(cube);
        self.persist_scope()?;
        self.apply_visibility();
        self.redraw();
        Ok(())
    }

    fn adopt_scope(&mut self, mut scope: Scope) {
        scope.strip_metadata();
        self.scope = scope;
    }

    fn adopt_scope_metadata(
        &mut self,
        mut keys: Vec<String>,
        values: BTreeMap<String, Vec<String>>,
    ) {
        keys.sort();
        self.available_scope_keys = keys;
        self.available_scope_values = values;
    }

    fn persist_scope(&mut self) -> Result<()> {
        let Some(cube) = self
            .selected_cube_name
            .as_deref()
            .or(self.loaded_cube_name.as_deref())
        else {
            return Ok(());
        };
        let key = storage_key(&self.app_id, cube);
        self.scope_store.save(&key, &self.scope)
    }

    fn apply_visibility(&mut self) {
        let Some(model) = self.model.as_ref() else {
            return;
        };
        let level = self.selected_level.unwrap_or(model.max_level);
        let groups = self.selected_groups.clone().unwrap_or_default();
        let vis = compute_visibility(model, level, &groups);
        self.selected_groups = Some(vis.selected_groups.clone());
        self.visibility = vis;
    }

    /// Tear down and redraw the rendered graph: full node/edge lists, then
    /// exclusions, then the registered clusters.
    fn redraw(&mut self) {
        let Some(model) = self.model.as_ref() else {
            return;
        };
        let options = RenderOptions {
            hierarchical: self.hierarchical,
            ..RenderOptions::default()
        };
        self.renderer.draw(model.nodes(), model.edges(), &options);
        self.renderer.remove_nodes(&self.visibility.excluded_nodes);
        self.renderer.remove_edges(&self.visibility.excluded_edges);
        self.clusters.recompute(model);
        for cluster in self.clusters.clusters() {
            self.renderer.collapse(cluster);
        }
    }

    fn notify(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(%message, "notice");
        self.notices.push(Notice { message });
    }

    // ========== Panel projections ==========

    /// Depth selector options, `1..=max_level`. Empty when nothing is
    /// loaded.
    pub fn level_options(&self) -> Vec<u32> {
        match &self.model {
            Some(model) => (1..=model.max_level).collect(),
            None => Vec::new(),
        }
    }

    /// The counts line, e.g. `"10 nodes over 4 levels"`.
    pub fn counts_line(&self) -> String {
        let Some(model) = &self.model else {
            return String::new();
        };
        let node_label = if model.node_count == 1 { "node" } else { "nodes" };
        let level_label = if model.max_level == 1 { "level" } else { "levels" };
        format!(
            "{} {node_label} over {} {level_label}",
            model.node_count, model.max_level
        )
    }

    /// Group checkbox rows: every group present in the loaded graph, sorted,
    /// with its catalog label and current selection state.
    pub fn group_rows(&self) -> Vec<GroupRow> {
        let Some(model) = &self.model else {
            return Vec::new();
        };
        let suffix = &model.group_suffix;
        let selected = self.selected_groups.as_deref().unwrap_or_default();
        let mut groups = model.available_groups_all_levels.clone();
        groups.sort();
        groups
            .into_iter()
            .map(|group| {
                let key = crate::domain::group_key_prefix(&group, suffix).to_string();
                let label = model.all_groups.get(&key).cloned().unwrap_or_else(|| key.clone());
                let selected = selected
                    .iter()
                    .any(|current| group_ids_equal(current, &group, suffix));
                GroupRow {
                    key,
                    label,
                    selected,
                }
            })
            .collect()
    }

    /// Current scope in its `key:value, key:value` text form.
    pub fn scope_text(&self) -> String {
        self.scope.to_text()
    }

    /// Drain pending user-visible notices.
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    // ========== Accessors ==========

    /// Current lifecycle state.
    pub fn state(&self) -> ViewState {
        self.state
    }

    /// Current scope.
    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// The loaded graph model, if any.
    pub fn model(&self) -> Option<&GraphModel> {
        self.model.as_ref()
    }

    /// The latest visibility computation.
    pub fn visibility(&self) -> &Visibility {
        &self.visibility
    }

    /// The cluster manager.
    pub fn clusters(&self) -> &ClusterManager {
        &self.clusters
    }

    /// Currently selected depth, if a graph is loaded.
    pub fn selected_level(&self) -> Option<u32> {
        self.selected_level
    }

    /// Currently selected groups, if a graph is loaded.
    pub fn selected_groups(&self) -> Option<&[String]> {
        self.selected_groups.as_deref()
    }

    /// The rendering collaborator.
    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    /// Mutable access to the rendering collaborator.
    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }
}
