//! Shared fixtures for integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use cubeviz::domain::{Edge, EdgeId, Node, NodeId};
use cubeviz::error::{Error, Result};
use cubeviz::fetch::{GraphFetcher, GraphRequest, GraphResponse, TraitRequest, VisualizerInfo};
use cubeviz::scope::{Scope, ScopeStorage};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::{Arc, Mutex};

pub fn node(id: &str, level: u32, group: &str) -> Node {
    Node {
        id: NodeId::from(id),
        label: format!("label-{id}"),
        title: format!("title-{id}"),
        desc: format!("desc-{id}"),
        level,
        group: group.to_string(),
        name: format!("rpm.class.{id}"),
        scope: None,
        traits: None,
    }
}

pub fn edge(id: &str, from: &str, to: &str, level: u32) -> Edge {
    Edge {
        id: EdgeId::from(id),
        from: NodeId::from(from),
        to: NodeId::from(to),
        level,
    }
}

/// A 4-node payload: 1(PRODUCT) -> 2(RISK) -> 3(COVERAGE), 2 -> 4(RISK).
pub fn sample_info() -> VisualizerInfo {
    let mut all_groups = BTreeMap::new();
    all_groups.insert("PRODUCT".to_string(), "Product".to_string());
    all_groups.insert("RISK".to_string(), "Risk".to_string());
    all_groups.insert("COVERAGE".to_string(), "Coverage".to_string());

    VisualizerInfo {
        all_groups,
        available_groups_all_levels: vec![
            "PRODUCT".to_string(),
            "RISK".to_string(),
            "COVERAGE".to_string(),
        ],
        selected_groups: vec![
            "PRODUCT".to_string(),
            "RISK".to_string(),
            "COVERAGE".to_string(),
        ],
        selected_level: 3,
        group_suffix: "_GROUP".to_string(),
        node_count: 4,
        max_level: 3,
        nodes: vec![
            node("1", 1, "PRODUCT"),
            node("2", 2, "RISK"),
            node("3", 3, "COVERAGE"),
            node("4", 3, "RISK"),
        ],
        edges: vec![
            edge("e12", "1", "2", 2),
            edge("e23", "2", "3", 3),
            edge("e24", "2", "4", 3),
        ],
        scope: Scope::parse("state:OH, product:WORKCOMP"),
        available_scope_keys: vec!["state".to_string(), "product".to_string()],
        available_scope_values: BTreeMap::new(),
    }
}

pub fn success(info: VisualizerInfo) -> GraphResponse {
    GraphResponse::Success {
        message: None,
        vis_info: Box::new(info),
    }
}

#[derive(Default)]
struct MockFetcherInner {
    graph_responses: VecDeque<Result<GraphResponse>>,
    trait_responses: VecDeque<Result<GraphResponse>>,
    graph_requests: Vec<GraphRequest>,
    trait_requests: Vec<TraitRequest>,
}

/// Fetcher serving queued responses and recording requests.
///
/// Clones share the same queues, so a handle kept outside the controller
/// can inspect recorded requests and queue further responses.
#[derive(Clone, Default)]
pub struct MockFetcher {
    inner: Arc<Mutex<MockFetcherInner>>,
}

impl MockFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_graph(&self, response: GraphResponse) {
        self.inner
            .lock()
            .unwrap()
            .graph_responses
            .push_back(Ok(response));
    }

    pub fn queue_graph_transport_error(&self, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .graph_responses
            .push_back(Err(Error::Fetch(message.to_string())));
    }

    pub fn queue_traits(&self, response: GraphResponse) {
        self.inner
            .lock()
            .unwrap()
            .trait_responses
            .push_back(Ok(response));
    }

    pub fn queue_traits_transport_error(&self, message: &str) {
        self.inner
            .lock()
            .unwrap()
            .trait_responses
            .push_back(Err(Error::Fetch(message.to_string())));
    }

    pub fn graph_requests(&self) -> Vec<GraphRequest> {
        self.inner.lock().unwrap().graph_requests.clone()
    }

    pub fn trait_requests(&self) -> Vec<TraitRequest> {
        self.inner.lock().unwrap().trait_requests.clone()
    }
}

#[async_trait]
impl GraphFetcher for MockFetcher {
    async fn fetch_graph(&self, request: GraphRequest) -> Result<GraphResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.graph_requests.push(request);
        inner
            .graph_responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Fetch("no queued graph response".to_string())))
    }

    async fn fetch_traits(&self, request: TraitRequest) -> Result<GraphResponse> {
        let mut inner = self.inner.lock().unwrap();
        inner.trait_requests.push(request);
        inner
            .trait_responses
            .pop_front()
            .unwrap_or_else(|| Err(Error::Fetch("no queued trait response".to_string())))
    }
}

/// Scope store shared between the controller and the test body.
#[derive(Clone, Default)]
pub struct SharedScopeStore {
    entries: Arc<Mutex<HashMap<String, Scope>>>,
}

impl SharedScopeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<Scope> {
        self.entries.lock().unwrap().get(key).cloned()
    }

    pub fn put(&self, key: &str, scope: Scope) {
        self.entries.lock().unwrap().insert(key.to_string(), scope);
    }
}

impl ScopeStorage for SharedScopeStore {
    fn load(&self, key: &str) -> Result<Scope> {
        Ok(self.get(key).unwrap_or_default())
    }

    fn save(&mut self, key: &str, scope: &Scope) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        if scope.is_empty() {
            entries.remove(key);
        } else {
            entries.insert(key.to_string(), scope.clone());
        }
        Ok(())
    }
}
