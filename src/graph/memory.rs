//! In-memory property graph backend
//!
//! Keeps nodes in insertion order so search and traversal results are
//! deterministic. Shared across retrievals behind a tokio `RwLock`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::errors::Result;
use crate::graph::backend::{GraphBackend, StoreFailure, StoreResult};
use crate::graph::matching::match_confidence;
use crate::graph::model::{Node, Relation};

/// Serializable copy of a whole graph
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GraphSnapshot {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub relations: Vec<Relation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

impl GraphSnapshot {
    /// Read a snapshot from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// Write the snapshot as pretty JSON
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

/// Aggregate counts over the graph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphStatistics {
    pub node_count: usize,
    pub relation_count: usize,
    pub node_types: BTreeMap<String, usize>,
    pub relation_types: BTreeMap<String, usize>,
    pub average_degree: f64,
}

#[derive(Default)]
struct GraphState {
    nodes: HashMap<String, Node>,
    order: Vec<String>,
    relations: Vec<Relation>,
    /// Node id -> ids across each incident relation, in relation order
    adjacency: HashMap<String, Vec<String>>,
    closed: bool,
}

impl GraphState {
    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed {
            Err(StoreFailure::backend("store closed"))
        } else {
            Ok(())
        }
    }

    fn adjacent(&self, id: &str) -> &[String] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or_default()
    }

    fn link(&mut self, relation: &Relation) {
        self.adjacency
            .entry(relation.start_node.clone())
            .or_default()
            .push(relation.end_node.clone());
        if relation.start_node != relation.end_node {
            self.adjacency
                .entry(relation.end_node.clone())
                .or_default()
                .push(relation.start_node.clone());
        }
    }

    /// Rebuild the adjacency index after relations were removed
    fn relink(&mut self) {
        self.adjacency.clear();
        let relations = std::mem::take(&mut self.relations);
        for relation in &relations {
            self.link(relation);
        }
        self.relations = relations;
    }
}

/// Property graph held entirely in memory
#[derive(Default)]
pub struct InMemoryGraph {
    state: RwLock<GraphState>,
}

impl InMemoryGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a snapshot. Relations with unknown endpoints are skipped.
    pub async fn from_snapshot(snapshot: GraphSnapshot) -> Self {
        let graph = Self::new();
        graph.import(snapshot).await;
        graph
    }

    /// Merge a snapshot into this graph, returning (nodes, relations) imported.
    pub async fn import(&self, snapshot: GraphSnapshot) -> (usize, usize) {
        let mut nodes = 0;
        let mut relations = 0;
        for node in snapshot.nodes {
            if self.add_node(node).await.is_ok() {
                nodes += 1;
            }
        }
        for relation in snapshot.relations {
            match self.add_relation(relation).await {
                Ok(()) => relations += 1,
                Err(e) => debug!(error = %e, "skipping relation during import"),
            }
        }
        (nodes, relations)
    }

    /// Export every node and relation
    pub async fn snapshot(&self) -> GraphSnapshot {
        let state = self.state.read().await;
        GraphSnapshot {
            nodes: state
                .order
                .iter()
                .filter_map(|id| state.nodes.get(id).cloned())
                .collect(),
            relations: state.relations.clone(),
            exported_at: Some(Utc::now()),
        }
    }

    pub async fn statistics(&self) -> GraphStatistics {
        let state = self.state.read().await;
        let mut stats = GraphStatistics {
            node_count: state.nodes.len(),
            relation_count: state.relations.len(),
            ..Default::default()
        };

        for node in state.nodes.values() {
            *stats.node_types.entry(node.node_type.clone()).or_insert(0) += 1;
        }
        for relation in &state.relations {
            *stats
                .relation_types
                .entry(relation.relation_type.clone())
                .or_insert(0) += 1;
        }
        if stats.node_count > 0 {
            // Each edge contributes to the degree of both endpoints
            stats.average_degree = (2 * stats.relation_count) as f64 / stats.node_count as f64;
        }

        stats
    }
}

#[async_trait]
impl GraphBackend for InMemoryGraph {
    async fn add_node(&self, mut node: Node) -> StoreResult<String> {
        if node.name.trim().is_empty() {
            return Err(StoreFailure::invalid("node name must not be empty"));
        }
        let mut state = self.state.write().await;
        state.ensure_open()?;

        if node.id.is_empty() {
            node.id = Uuid::new_v4().to_string();
        }
        let id = node.id.clone();
        if state.nodes.insert(id.clone(), node).is_none() {
            state.order.push(id.clone());
        }
        Ok(id)
    }

    async fn get_node(&self, id: &str) -> StoreResult<Node> {
        let state = self.state.read().await;
        state.ensure_open()?;
        state
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| StoreFailure::not_found(id))
    }

    async fn update_node(&self, node: Node) -> StoreResult<()> {
        if node.name.trim().is_empty() {
            return Err(StoreFailure::invalid("node name must not be empty"));
        }
        let mut state = self.state.write().await;
        state.ensure_open()?;
        match state.nodes.get_mut(&node.id) {
            Some(existing) => {
                *existing = node;
                Ok(())
            }
            None => Err(StoreFailure::not_found(node.id)),
        }
    }

    async fn delete_node(&self, id: &str) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        if state.nodes.remove(id).is_none() {
            return Err(StoreFailure::not_found(id));
        }
        state.order.retain(|existing| existing != id);
        state.relations.retain(|r| !r.touches(id));
        state.relink();
        Ok(())
    }

    async fn add_relation(&self, relation: Relation) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        for endpoint in [&relation.start_node, &relation.end_node] {
            if !state.nodes.contains_key(endpoint) {
                return Err(StoreFailure::invalid(format!(
                    "relation endpoint does not exist: {}",
                    endpoint
                )));
            }
        }

        if let Some(pos) = state.relations.iter().position(|r| r.same_edge(&relation)) {
            state.relations[pos] = relation;
        } else {
            state.link(&relation);
            state.relations.push(relation);
        }
        Ok(())
    }

    async fn delete_relation(&self, relation: &Relation) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.ensure_open()?;
        let before = state.relations.len();
        state.relations.retain(|r| !r.same_edge(relation));
        if state.relations.len() == before {
            return Err(StoreFailure::not_found(format!(
                "{}-[{}]->{}",
                relation.start_node, relation.relation_type, relation.end_node
            )));
        }
        state.relink();
        Ok(())
    }

    async fn get_neighbors(&self, id: &str, max_depth: usize) -> StoreResult<Vec<Node>> {
        let state = self.state.read().await;
        state.ensure_open()?;
        if !state.nodes.contains_key(id) {
            return Err(StoreFailure::not_found(id));
        }

        let mut neighbors = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        let mut queue: VecDeque<(&str, usize)> = VecDeque::new();
        visited.insert(id);
        queue.push_back((id, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            for next in state.adjacent(current) {
                let next = next.as_str();
                if !visited.insert(next) {
                    continue;
                }
                // Dangling endpoints are not traversed
                if let Some(node) = state.nodes.get(next) {
                    neighbors.push(node.clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }

        Ok(neighbors)
    }

    async fn search_nodes(
        &self,
        query: &str,
        node_types: Option<&[String]>,
    ) -> StoreResult<Vec<Node>> {
        let state = self.state.read().await;
        state.ensure_open()?;

        let type_allowed = |node: &Node| {
            node_types.map_or(true, |types| types.iter().any(|t| t == &node.node_type))
        };
        let candidates = state
            .order
            .iter()
            .filter_map(|id| state.nodes.get(id))
            .filter(|node| type_allowed(*node));

        if query.trim().is_empty() {
            return Ok(candidates.cloned().collect());
        }

        let mut matched: Vec<(f32, &Node)> = candidates
            .filter_map(|node| match_confidence(query, node).map(|score| (score, node)))
            .collect();
        // Stable: equal confidence keeps insertion order
        matched.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

        Ok(matched.into_iter().map(|(_, node)| node.clone()).collect())
    }

    async fn close(&self) -> StoreResult<()> {
        let mut state = self.state.write().await;
        state.closed = true;
        Ok(())
    }
}
