//! Backend seam for property graph storage
//!
//! Every operation reports an explicit outcome. `GraphStore` layers the
//! fail-soft contract on top of this trait.

use async_trait::async_trait;
use thiserror::Error;

use crate::graph::model::{Node, Relation};

/// Why a graph operation did not succeed
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreFailure {
    #[error("node not found: {id}")]
    NotFound { id: String },

    #[error("graph backend error: {reason}")]
    Backend { reason: String },

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl StoreFailure {
    pub fn not_found(id: impl Into<String>) -> Self {
        StoreFailure::NotFound { id: id.into() }
    }

    pub fn backend(reason: impl Into<String>) -> Self {
        StoreFailure::Backend { reason: reason.into() }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        StoreFailure::InvalidInput { reason: reason.into() }
    }
}

/// Outcome of a graph operation
pub type StoreResult<T> = std::result::Result<T, StoreFailure>;

/// Property graph backend.
///
/// Implementations must be safe to share across concurrent retrievals.
#[async_trait]
pub trait GraphBackend: Send + Sync {
    /// Insert or upsert a node, returning its id (assigned when empty).
    async fn add_node(&self, node: Node) -> StoreResult<String>;

    async fn get_node(&self, id: &str) -> StoreResult<Node>;

    /// Replace an existing node. Fails with `NotFound` if it does not exist.
    async fn update_node(&self, node: Node) -> StoreResult<()>;

    /// Remove a node together with its incident relations.
    async fn delete_node(&self, id: &str) -> StoreResult<()>;

    async fn add_relation(&self, relation: Relation) -> StoreResult<()>;

    async fn delete_relation(&self, relation: &Relation) -> StoreResult<()>;

    /// Nodes reachable from `id` within `max_depth` hops, excluding `id` itself.
    async fn get_neighbors(&self, id: &str, max_depth: usize) -> StoreResult<Vec<Node>>;

    /// Free-text node search, optionally restricted to `node_types`.
    async fn search_nodes(&self, query: &str, node_types: Option<&[String]>)
        -> StoreResult<Vec<Node>>;

    /// Release the underlying connection.
    async fn close(&self) -> StoreResult<()>;
}
