//! Test doubles shared by the integration suites

#![allow(dead_code)]

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use hybrid_rag::graph::{GraphBackend, GraphStore, Node, Relation, StoreFailure, StoreResult};
use hybrid_rag::keyword::KeywordIndex;
use hybrid_rag::rag::{RerankError, Reranker};
use hybrid_rag::types::{Candidate, Source};

/// Graph backend with fixed search results that counts every call
#[derive(Default)]
pub struct CountingGraph {
    pub seeds: Vec<Node>,
    pub neighbors: Vec<Node>,
    pub fail: bool,
    /// Latency of every search
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub closes: AtomicUsize,
    /// Searches that ran to completion
    pub finished: AtomicUsize,
}

impl CountingGraph {
    pub fn with_seeds(seeds: Vec<Node>) -> Self {
        Self {
            seeds,
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> usize {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }

    fn touch(&self) -> StoreResult<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            Err(StoreFailure::backend("connection refused"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl GraphBackend for CountingGraph {
    async fn add_node(&self, node: Node) -> StoreResult<String> {
        self.touch()?;
        Ok(node.id)
    }

    async fn get_node(&self, id: &str) -> StoreResult<Node> {
        self.touch()?;
        self.seeds
            .iter()
            .find(|n| n.id == id)
            .cloned()
            .ok_or_else(|| StoreFailure::not_found(id))
    }

    async fn update_node(&self, _node: Node) -> StoreResult<()> {
        self.touch()
    }

    async fn delete_node(&self, _id: &str) -> StoreResult<()> {
        self.touch()
    }

    async fn add_relation(&self, _relation: Relation) -> StoreResult<()> {
        self.touch()
    }

    async fn delete_relation(&self, _relation: &Relation) -> StoreResult<()> {
        self.touch()
    }

    async fn get_neighbors(&self, _id: &str, max_depth: usize) -> StoreResult<Vec<Node>> {
        self.touch()?;
        if max_depth == 0 {
            return Ok(Vec::new());
        }
        Ok(self.neighbors.clone())
    }

    async fn search_nodes(
        &self,
        _query: &str,
        _node_types: Option<&[String]>,
    ) -> StoreResult<Vec<Node>> {
        self.touch()?;
        pause(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(self.seeds.clone())
    }

    async fn close(&self) -> StoreResult<()> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Keyword index returning a fixed list, counting searches
#[derive(Default)]
pub struct StaticIndex {
    pub hits: Vec<Candidate>,
    pub delay: Duration,
    pub calls: AtomicUsize,
    pub finished: AtomicUsize,
}

impl StaticIndex {
    pub fn new(hits: Vec<(&str, f32)>) -> Self {
        Self {
            hits: hits
                .into_iter()
                .map(|(content, score)| Candidate::new(content, score, Source::Keyword))
                .collect(),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn finished(&self) -> usize {
        self.finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeywordIndex for StaticIndex {
    async fn search(&self, _query: &str, limit: Option<usize>) -> Vec<Candidate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        pause(self.delay).await;
        self.finished.fetch_add(1, Ordering::SeqCst);
        let mut hits = self.hits.clone();
        hits.truncate(limit.unwrap_or(usize::MAX));
        hits
    }
}

/// Reranker that answers with a prefix of a fixed score list
pub struct ScriptedReranker {
    pub scores: Vec<f32>,
    seen: Mutex<Vec<Vec<String>>>,
}

impl ScriptedReranker {
    pub fn new(scores: Vec<f32>) -> Self {
        Self {
            scores,
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn last_input(&self) -> Vec<String> {
        self.seen.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl Reranker for ScriptedReranker {
    async fn rerank(&self, _query: &str, candidates: &[String]) -> Result<Vec<f32>, RerankError> {
        self.seen.lock().unwrap().push(candidates.to_vec());
        Ok(self.scores.iter().copied().take(candidates.len()).collect())
    }
}

/// Reranker that always fails
pub struct OfflineReranker;

#[async_trait]
impl Reranker for OfflineReranker {
    async fn rerank(&self, _query: &str, _candidates: &[String]) -> Result<Vec<f32>, RerankError> {
        Err(RerankError::Unavailable("model not loaded".to_string()))
    }
}

// Zero delay skips the timer so doubles also run under `tokio_test::block_on`
async fn pause(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

pub fn store(backend: Arc<CountingGraph>) -> Arc<GraphStore> {
    Arc::new(GraphStore::new(backend))
}
