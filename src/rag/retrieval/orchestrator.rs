// Retrieval orchestrator: fan-out, merge, dedup, rerank, rank
//
// One query flows through:
//   validate -> {graph, keyword} concurrently -> merge (graph first)
//   -> dedup -> rerank -> stable sort -> threshold -> truncate
//
// Source and reranker failures degrade the result instead of failing it.
// Only caller mistakes (and reranker failures in strict mode) return Err.
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

use crate::config::RetrievalConfig;
use crate::errors::{RetrievalError, Result};
use crate::graph::GraphStore;
use crate::keyword::KeywordIndex;
use crate::rag::reranking::{RerankError, Reranker};
use crate::rag::retrieval::fusion::{deduplicate, rank};
use crate::rag::retrieval::graph_source::graph_candidates;
use crate::telemetry::{RetrievalEvent, RetrievalTelemetry};
use crate::types::{Candidate, RetrievalResult, Source, SOURCE_SCORE_KEY};

/// Per-call retrieval parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrieveOptions {
    pub top_k: usize,
    pub score_threshold: f32,
    /// Restrict graph seeds to these node types
    #[serde(default)]
    pub node_types: Option<Vec<String>>,
}

impl RetrieveOptions {
    pub fn new(top_k: usize, score_threshold: f32) -> Self {
        Self {
            top_k,
            score_threshold,
            node_types: None,
        }
    }

    pub fn with_node_types(mut self, node_types: Vec<String>) -> Self {
        self.node_types = Some(node_types);
        self
    }

    /// Defaults taken from the `[retrieval]` section
    pub fn from_config(config: &RetrievalConfig) -> Self {
        Self::new(
            config.retrieval.default_top_k,
            config.retrieval.default_score_threshold,
        )
    }

    fn validate(&self, query: &str) -> Result<()> {
        if query.trim().is_empty() {
            return Err(RetrievalError::invalid("query must not be empty"));
        }
        if self.top_k < 1 {
            return Err(RetrievalError::invalid(format!(
                "top_k must be >= 1, got {}",
                self.top_k
            )));
        }
        if !self.score_threshold.is_finite() {
            return Err(RetrievalError::invalid(format!(
                "score_threshold must be finite, got {}",
                self.score_threshold
            )));
        }
        Ok(())
    }
}

/// Hybrid retrieval over a graph store and a keyword index
pub struct RetrievalOrchestrator {
    graph: Arc<GraphStore>,
    keyword: Arc<dyn KeywordIndex>,
    reranker: Arc<dyn Reranker>,
    config: RetrievalConfig,
    telemetry: Option<RetrievalTelemetry>,
    closed: AtomicBool,
}

impl RetrievalOrchestrator {
    pub fn new(
        graph: Arc<GraphStore>,
        keyword: Arc<dyn KeywordIndex>,
        reranker: Arc<dyn Reranker>,
        config: RetrievalConfig,
    ) -> Self {
        Self {
            graph,
            keyword,
            reranker,
            config,
            telemetry: None,
            closed: AtomicBool::new(false),
        }
    }

    /// Attach a telemetry collector
    pub fn with_telemetry(mut self, telemetry: RetrievalTelemetry) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    pub fn config(&self) -> &RetrievalConfig {
        &self.config
    }

    pub fn graph(&self) -> &Arc<GraphStore> {
        &self.graph
    }

    /// Retrieve with configured defaults for `top_k` and threshold
    pub async fn retrieve_default(&self, query: &str) -> Result<RetrievalResult> {
        self.retrieve_with(query, &RetrieveOptions::from_config(&self.config))
            .await
    }

    /// Retrieve at most `top_k` documents scoring at least `score_threshold`
    pub async fn retrieve(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f32,
    ) -> Result<RetrievalResult> {
        self.retrieve_with(query, &RetrieveOptions::new(top_k, score_threshold))
            .await
    }

    pub async fn retrieve_with(
        &self,
        query: &str,
        options: &RetrieveOptions,
    ) -> Result<RetrievalResult> {
        let started = Instant::now();
        options.validate(query)?;

        let (graph, keyword) = tokio::join!(
            self.bounded(
                Source::Graph,
                graph_candidates(
                    &self.graph,
                    query,
                    options.node_types.as_deref(),
                    &self.config.graph,
                ),
            ),
            self.bounded(Source::Keyword, self.keyword_candidates(query)),
        );

        // Timed-out sources were recorded already; only answered ones can be empty
        for (source, answer) in [(Source::Graph, &graph), (Source::Keyword, &keyword)] {
            if answer.as_ref().is_some_and(Vec::is_empty) {
                self.record(RetrievalEvent::SourceEmpty {
                    source,
                    timestamp: Instant::now(),
                });
            }
        }
        let graph = graph.unwrap_or_default();
        let keyword = keyword.unwrap_or_default();
        let graph_count = graph.len();
        let keyword_count = keyword.len();
        debug!(query, graph_count, keyword_count, "sources answered");

        let mut candidates = graph;
        candidates.extend(keyword);

        let mut duplicates_removed = 0;
        if self.config.dedup.enabled {
            let (kept, removed) =
                deduplicate(candidates, self.config.dedup.near_duplicate_threshold);
            candidates = kept;
            duplicates_removed = removed;
        }

        let reranker_fallback = self.rerank(query, &mut candidates).await?;
        let documents = rank(candidates, options.score_threshold, options.top_k);

        let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
        info!(
            query,
            documents = documents.len(),
            latency_ms,
            reranker_fallback,
            "retrieval completed"
        );
        self.record(RetrievalEvent::RetrievalCompleted {
            documents: documents.len(),
            latency_ms,
            timestamp: Instant::now(),
        });

        Ok(RetrievalResult {
            documents,
            latency_ms,
            graph_candidates: graph_count,
            keyword_candidates: keyword_count,
            duplicates_removed,
            reranker_fallback,
        })
    }

    async fn keyword_candidates(&self, query: &str) -> Vec<Candidate> {
        let mut candidates = self
            .keyword
            .search(query, Some(self.config.keyword.limit))
            .await;
        for candidate in &mut candidates {
            candidate.tag_source(Source::Keyword);
        }
        candidates
    }

    /// Await a source, giving up after the configured deadline. `None` means
    /// the source timed out.
    async fn bounded<F>(&self, source: Source, fut: F) -> Option<Vec<Candidate>>
    where
        F: Future<Output = Vec<Candidate>>,
    {
        let Some(limit) = self.config.source_timeout() else {
            return Some(fut.await);
        };
        match tokio::time::timeout(limit, fut).await {
            Ok(candidates) => Some(candidates),
            Err(_) => {
                let timeout_ms = limit.as_millis() as u64;
                warn!(%source, timeout_ms, "source timed out, continuing without it");
                self.record(RetrievalEvent::SourceTimedOut {
                    source,
                    timeout_ms,
                    timestamp: Instant::now(),
                });
                None
            }
        }
    }

    /// Overwrite scores with reranker output. Returns true when the reranker
    /// failed and source-local scores were kept.
    async fn rerank(&self, query: &str, candidates: &mut [Candidate]) -> Result<bool> {
        if candidates.is_empty() {
            return Ok(false);
        }

        let texts: Vec<String> = candidates.iter().map(|c| c.content.clone()).collect();
        let outcome = match self.reranker.rerank(query, &texts).await {
            Ok(scores) if scores.len() == texts.len() => Ok(scores),
            Ok(scores) => Err(RerankError::LengthMismatch {
                expected: texts.len(),
                got: scores.len(),
            }),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(scores) => {
                for (candidate, score) in candidates.iter_mut().zip(scores) {
                    candidate
                        .metadata
                        .insert(SOURCE_SCORE_KEY.to_string(), Value::from(candidate.score));
                    candidate.score = score;
                }
                Ok(false)
            }
            Err(e) if self.config.rerank.fail_on_error => Err(e.into()),
            Err(e) => {
                warn!(error = %e, "reranker failed, keeping source scores");
                self.record(RetrievalEvent::RerankerFallback {
                    reason: e.to_string(),
                    timestamp: Instant::now(),
                });
                Ok(true)
            }
        }
    }

    fn record(&self, event: RetrievalEvent) {
        if let Some(telemetry) = &self.telemetry {
            telemetry.record(event);
        }
    }

    /// Close the graph store. Only the first call has an effect.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            debug!("orchestrator already closed");
            return;
        }
        self.graph.close().await;
    }
}
