//! Integration tests for the retrieval orchestrator

mod common;

use std::sync::Arc;

use common::{store, CountingGraph, OfflineReranker, ScriptedReranker, StaticIndex};
use hybrid_rag::graph::Node;
use hybrid_rag::rag::{RerankError, RetrievalOrchestrator, RetrieveOptions};
use hybrid_rag::telemetry::RetrievalTelemetry;
use hybrid_rag::types::{Source, SOURCE_SCORE_KEY};
use hybrid_rag::{RetrievalConfig, RetrievalError};

fn qi_deficiency() -> Node {
    Node::new("c1", "气虚", "Constitution").with_description("元气不足，脏腑功能衰退")
}

fn build(
    graph: &Arc<CountingGraph>,
    index: &Arc<StaticIndex>,
    reranker: Arc<dyn hybrid_rag::rag::Reranker>,
    config: RetrievalConfig,
) -> RetrievalOrchestrator {
    RetrievalOrchestrator::new(store(graph.clone()), index.clone(), reranker, config)
}

#[tokio::test]
async fn test_graph_and_keyword_ordered_by_reranked_score() {
    let graph = Arc::new(CountingGraph::with_seeds(vec![qi_deficiency()]));
    let index = Arc::new(StaticIndex::new(vec![("气虚体质的特征", 0.8)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.9, 0.8, 0.7]));
    let orchestrator = build(&graph, &index, reranker.clone(), RetrievalConfig::default());

    let result = orchestrator.retrieve("气虚", 5, 0.0).await.unwrap();

    assert_eq!(result.len(), 2);
    assert_eq!(result.scores(), vec![0.9, 0.8]);
    assert_eq!(result.documents[0].source, Source::Graph);
    assert!(result.documents[0].content.starts_with("气虚 (Constitution)"));
    assert_eq!(result.documents[0].metadata["node_id"], "c1");
    assert_eq!(result.documents[0].metadata[SOURCE_SCORE_KEY], 1.0);
    assert_eq!(result.documents[1].content, "气虚体质的特征");
    assert_eq!(result.documents[1].metadata["source"], "keyword");

    // Graph candidates are merged ahead of keyword candidates
    let input = reranker.last_input();
    assert_eq!(input.len(), 2);
    assert!(input[0].starts_with("气虚 (Constitution)"));
    assert_eq!(input[1], "气虚体质的特征");
}

#[tokio::test]
async fn test_top_k_truncates() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("a", 0.1), ("b", 0.2), ("c", 0.3)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.9, 0.7, 0.5]));
    let orchestrator = build(&graph, &index, reranker, RetrievalConfig::default());

    let result = orchestrator.retrieve("query", 2, 0.0).await.unwrap();
    assert_eq!(result.scores(), vec![0.9, 0.7]);
}

#[tokio::test]
async fn test_threshold_filters() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("a", 0.1), ("b", 0.2), ("c", 0.3)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.95, 0.8, 0.6]));
    let orchestrator = build(&graph, &index, reranker, RetrievalConfig::default());

    let result = orchestrator.retrieve("query", 5, 0.9).await.unwrap();
    assert_eq!(result.scores(), vec![0.95]);
}

#[tokio::test]
async fn test_top_k_larger_than_available_returns_all() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("a", 0.1), ("b", 0.2)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.4, 0.6]));
    let orchestrator = build(&graph, &index, reranker, RetrievalConfig::default());

    let result = orchestrator.retrieve("query", 50, 0.0).await.unwrap();
    assert_eq!(result.scores(), vec![0.6, 0.4]);
}

#[tokio::test]
async fn test_both_sources_empty() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::default());
    let reranker = Arc::new(ScriptedReranker::new(vec![0.9]));
    let orchestrator = build(&graph, &index, reranker.clone(), RetrievalConfig::default());

    let result = orchestrator.retrieve("nothing matches", 5, 0.0).await.unwrap();
    assert!(result.is_empty());
    assert!(!result.reranker_fallback);
    assert_eq!(reranker.calls(), 0);
}

#[tokio::test]
async fn test_invalid_arguments_rejected_before_io() {
    let graph = Arc::new(CountingGraph::with_seeds(vec![qi_deficiency()]));
    let index = Arc::new(StaticIndex::new(vec![("气虚体质的特征", 0.8)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.9, 0.8]));
    let orchestrator = build(&graph, &index, reranker.clone(), RetrievalConfig::default());

    for (query, top_k, threshold) in [
        ("", 5, 0.0),
        ("   ", 5, 0.0),
        ("气虚", 0, 0.0),
        ("气虚", 5, f32::NAN),
        ("气虚", 5, f32::NEG_INFINITY),
    ] {
        let err = orchestrator.retrieve(query, top_k, threshold).await.unwrap_err();
        assert!(
            matches!(err, RetrievalError::InvalidArgument(_)),
            "unexpected error for {:?}: {}",
            (query, top_k, threshold),
            err
        );
    }

    assert_eq!(graph.calls(), 0);
    assert_eq!(index.calls(), 0);
    assert_eq!(reranker.calls(), 0);
}

#[tokio::test]
async fn test_graph_backend_failure_keeps_keyword_results() {
    let graph = Arc::new(CountingGraph::failing());
    let index = Arc::new(StaticIndex::new(vec![("气虚体质的特征", 0.8)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.7]));
    let orchestrator = build(&graph, &index, reranker, RetrievalConfig::default());

    let result = orchestrator.retrieve("气虚", 5, 0.0).await.unwrap();
    assert_eq!(result.graph_candidates, 0);
    assert_eq!(result.len(), 1);
    assert_eq!(result.documents[0].source, Source::Keyword);
}

#[tokio::test]
async fn test_reranker_failure_degrades_to_source_scores() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("a", 0.3), ("b", 0.6)]));
    let telemetry = RetrievalTelemetry::new();
    let orchestrator = build(&graph, &index, Arc::new(OfflineReranker), RetrievalConfig::default())
        .with_telemetry(telemetry.clone());

    let result = orchestrator.retrieve("query", 5, 0.0).await.unwrap();
    assert!(result.reranker_fallback);
    assert_eq!(result.scores(), vec![0.6, 0.3]);
    assert_eq!(telemetry.stats().reranker_fallbacks, 1);
}

#[tokio::test]
async fn test_reranker_failure_propagates_in_strict_mode() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("a", 0.3)]));
    let mut config = RetrievalConfig::default();
    config.rerank.fail_on_error = true;
    let orchestrator = build(&graph, &index, Arc::new(OfflineReranker), config);

    let err = orchestrator.retrieve("query", 5, 0.0).await.unwrap_err();
    assert!(matches!(
        err,
        RetrievalError::Reranker(RerankError::Unavailable(_))
    ));
}

#[tokio::test]
async fn test_ties_keep_merge_order() {
    let graph = Arc::new(CountingGraph::with_seeds(vec![qi_deficiency()]));
    let index = Arc::new(StaticIndex::new(vec![("first snippet", 0.9), ("second snippet", 0.1)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.5, 0.5, 0.5]));
    let orchestrator = build(&graph, &index, reranker, RetrievalConfig::default());

    let result = orchestrator.retrieve("气虚", 5, 0.0).await.unwrap();
    let contents: Vec<&str> = result.documents.iter().map(|d| d.content.as_str()).collect();
    assert_eq!(contents.len(), 3);
    assert!(contents[0].starts_with("气虚"));
    assert_eq!(&contents[1..], &["first snippet", "second snippet"]);
}

#[tokio::test]
async fn test_duplicates_collapse_before_reranking() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![
        ("气虚体质的特征", 0.3),
        ("气虚体质的特征。", 0.8),
        ("阳虚体质", 0.5),
    ]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.6, 0.4]));
    let orchestrator = build(&graph, &index, reranker.clone(), RetrievalConfig::default());

    let result = orchestrator.retrieve("体质", 5, 0.0).await.unwrap();
    assert_eq!(result.duplicates_removed, 1);
    assert_eq!(result.len(), 2);
    assert_eq!(reranker.last_input(), vec!["气虚体质的特征。", "阳虚体质"]);
    assert_eq!(result.documents[0].metadata[SOURCE_SCORE_KEY], 0.8f32 as f64);
}

#[tokio::test]
async fn test_dedup_can_be_disabled() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("same", 0.3), ("same", 0.8)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.6, 0.4]));
    let mut config = RetrievalConfig::default();
    config.dedup.enabled = false;
    let orchestrator = build(&graph, &index, reranker, config);

    let result = orchestrator.retrieve("same", 5, 0.0).await.unwrap();
    assert_eq!(result.len(), 2);
    assert_eq!(result.duplicates_removed, 0);
}

#[tokio::test]
async fn test_neighbor_candidates_carry_seed() {
    let graph = Arc::new(CountingGraph {
        seeds: vec![qi_deficiency()],
        neighbors: vec![Node::new("h1", "黄芪", "Herb")],
        ..CountingGraph::default()
    });
    let index = Arc::new(StaticIndex::default());
    let reranker = Arc::new(ScriptedReranker::new(vec![0.9, 0.6]));
    let mut config = RetrievalConfig::default();
    config.graph.include_neighbors = true;
    let orchestrator = build(&graph, &index, reranker, config);

    let result = orchestrator.retrieve("气虚", 5, 0.0).await.unwrap();
    assert_eq!(result.graph_candidates, 2);
    assert!(result.documents[0].content.contains("related: 黄芪 (Herb)"));
    assert_eq!(result.documents[1].content, "黄芪 (Herb)");
    assert_eq!(result.documents[1].metadata["seed_node_id"], "c1");
}

#[tokio::test]
async fn test_retrieve_default_uses_config() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::new(vec![("a", 0.1), ("b", 0.2), ("c", 0.3)]));
    let reranker = Arc::new(ScriptedReranker::new(vec![0.9, 0.7, 0.5]));
    let mut config = RetrievalConfig::default();
    config.retrieval.default_top_k = 1;
    let orchestrator = build(&graph, &index, reranker, config);

    let result = orchestrator.retrieve_default("query").await.unwrap();
    assert_eq!(result.scores(), vec![0.9]);

    let options = RetrieveOptions::from_config(orchestrator.config());
    assert_eq!(options.top_k, 1);
}

#[tokio::test]
async fn test_close_reaches_graph_store_once() {
    let graph = Arc::new(CountingGraph::default());
    let index = Arc::new(StaticIndex::default());
    let shared = store(graph.clone());

    let first = RetrievalOrchestrator::new(
        shared.clone(),
        index.clone(),
        Arc::new(OfflineReranker),
        RetrievalConfig::default(),
    );
    let second = RetrievalOrchestrator::new(
        shared,
        index,
        Arc::new(OfflineReranker),
        RetrievalConfig::default(),
    );

    first.close().await;
    first.close().await;
    second.close().await;

    assert_eq!(graph.closes(), 1);
}
