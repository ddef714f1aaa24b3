//! GraphStore: fail-soft access to a property graph backend
//!
//! Two surfaces over one backend:
//! - `try_*` methods return the backend outcome unchanged, for callers that
//!   need to tell "not found" apart from "backend unavailable"
//! - the plain methods log failures and return `false` / `None` / empty,
//!   so a backend hiccup never aborts a retrieval

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::graph::backend::{GraphBackend, StoreFailure, StoreResult};
use crate::graph::model::{Node, Relation};

/// Shared handle to a graph backend
pub struct GraphStore {
    backend: Arc<dyn GraphBackend>,
    closed: AtomicBool,
}

impl GraphStore {
    pub fn new(backend: Arc<dyn GraphBackend>) -> Self {
        Self {
            backend,
            closed: AtomicBool::new(false),
        }
    }

    /// Underlying backend
    pub fn backend(&self) -> &Arc<dyn GraphBackend> {
        &self.backend
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.is_closed() {
            Err(StoreFailure::backend("store closed"))
        } else {
            Ok(())
        }
    }

    // Outcome surface; every call fails once the store is closed

    pub async fn try_add_node(&self, node: Node) -> StoreResult<String> {
        self.ensure_open()?;
        self.backend.add_node(node).await
    }

    pub async fn try_get_node(&self, id: &str) -> StoreResult<Node> {
        self.ensure_open()?;
        self.backend.get_node(id).await
    }

    pub async fn try_update_node(&self, node: Node) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.update_node(node).await
    }

    pub async fn try_delete_node(&self, id: &str) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.delete_node(id).await
    }

    pub async fn try_add_relation(&self, relation: Relation) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.add_relation(relation).await
    }

    pub async fn try_delete_relation(&self, relation: &Relation) -> StoreResult<()> {
        self.ensure_open()?;
        self.backend.delete_relation(relation).await
    }

    pub async fn try_get_neighbors(&self, id: &str, max_depth: usize) -> StoreResult<Vec<Node>> {
        self.ensure_open()?;
        self.backend.get_neighbors(id, max_depth).await
    }

    pub async fn try_search_nodes(
        &self,
        query: &str,
        node_types: Option<&[String]>,
    ) -> StoreResult<Vec<Node>> {
        self.ensure_open()?;
        self.backend.search_nodes(query, node_types).await
    }

    // Fail-soft surface

    pub async fn add_node(&self, node: Node) -> bool {
        soften("add_node", self.try_add_node(node).await).is_some()
    }

    pub async fn get_node(&self, id: &str) -> Option<Node> {
        soften("get_node", self.try_get_node(id).await)
    }

    pub async fn update_node(&self, node: Node) -> bool {
        soften("update_node", self.try_update_node(node).await).is_some()
    }

    pub async fn delete_node(&self, id: &str) -> bool {
        soften("delete_node", self.try_delete_node(id).await).is_some()
    }

    pub async fn add_relation(&self, relation: Relation) -> bool {
        soften("add_relation", self.try_add_relation(relation).await).is_some()
    }

    pub async fn delete_relation(&self, relation: &Relation) -> bool {
        soften("delete_relation", self.try_delete_relation(relation).await).is_some()
    }

    pub async fn get_neighbors(&self, id: &str, max_depth: usize) -> Vec<Node> {
        soften("get_neighbors", self.try_get_neighbors(id, max_depth).await).unwrap_or_default()
    }

    pub async fn search_nodes(&self, query: &str, node_types: Option<&[String]>) -> Vec<Node> {
        soften("search_nodes", self.try_search_nodes(query, node_types).await).unwrap_or_default()
    }

    /// Release the backend. Only the first call reaches it.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("graph store already closed");
            return;
        }
        match self.backend.close().await {
            Ok(()) => info!("graph store closed"),
            Err(e) => warn!(error = %e, "graph store close failed"),
        }
    }
}

/// Collapse an outcome into the fail-soft sentinel, logging the failure.
fn soften<T>(operation: &'static str, outcome: StoreResult<T>) -> Option<T> {
    match outcome {
        Ok(value) => Some(value),
        Err(StoreFailure::NotFound { id }) => {
            debug!(operation, %id, "graph entity not found");
            None
        }
        Err(e) => {
            warn!(operation, error = %e, "graph store operation failed");
            None
        }
    }
}
