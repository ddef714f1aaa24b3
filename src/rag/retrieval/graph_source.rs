// Graph-side candidate synthesis
//
// Seeds come from a node search; each seed is expanded to its neighborhood
// and rendered as one self-contained text snippet so the reranker can score
// it next to keyword passages.
use futures_util::future::join_all;
use serde_json::Value;

use crate::config::GraphSection;
use crate::graph::matching::match_confidence;
use crate::graph::{GraphStore, Node};
use crate::types::{Candidate, Source};

/// Seed score when a backend returns a node the local matcher cannot explain
pub const FALLBACK_CONFIDENCE: f32 = 0.3;

/// Render a node and its related nodes as a snippet:
/// `name (type): description; key: value; related: a (t), b (t)`
pub fn render_node(node: &Node, related: &[Node], max_related: usize) -> String {
    let mut head = format!("{} ({})", node.name, node.node_type);
    if !node.description.is_empty() {
        head.push_str(": ");
        head.push_str(&node.description);
    }

    let mut parts = vec![head];
    if !node.aliases.is_empty() {
        parts.push(format!("aliases: {}", node.aliases.join(", ")));
    }
    for (key, value) in &node.properties {
        parts.push(format!("{}: {}", key, value));
    }

    let shown: Vec<String> = related
        .iter()
        .take(max_related)
        .map(|n| format!("{} ({})", n.name, n.node_type))
        .collect();
    if !shown.is_empty() {
        parts.push(format!("related: {}", shown.join(", ")));
    }

    parts.join("; ")
}

fn node_candidate(content: String, score: f32, node: &Node) -> Candidate {
    Candidate::new(content, score, Source::Graph)
        .with_metadata("node_id", node.id.clone())
        .with_metadata("node_type", node.node_type.clone())
        .with_metadata("node_name", node.name.clone())
}

/// Search the graph for `query` and turn the matches into candidates.
///
/// Candidates come out in seed order; a seed's neighbor candidates (when
/// enabled) follow it directly. Backend failures surface as fewer candidates,
/// never as an error.
pub async fn graph_candidates(
    store: &GraphStore,
    query: &str,
    node_types: Option<&[String]>,
    config: &GraphSection,
) -> Vec<Candidate> {
    let mut seeds = store.search_nodes(query, node_types).await;
    seeds.truncate(config.max_seed_nodes);
    if seeds.is_empty() {
        return Vec::new();
    }

    let neighborhoods = join_all(
        seeds
            .iter()
            .map(|seed| store.get_neighbors(&seed.id, config.max_depth)),
    )
    .await;

    let mut candidates = Vec::new();
    for (seed, neighbors) in seeds.iter().zip(neighborhoods) {
        let seed_score = match_confidence(query, seed).unwrap_or(FALLBACK_CONFIDENCE);
        candidates.push(node_candidate(
            render_node(seed, &neighbors, config.max_related_in_snippet),
            seed_score,
            seed,
        ));

        if config.include_neighbors {
            let score = seed_score * config.neighbor_decay;
            for neighbor in neighbors.iter().take(config.max_neighbor_candidates) {
                candidates.push(
                    node_candidate(render_node(neighbor, &[], 0), score, neighbor)
                        .with_metadata("seed_node_id", Value::from(seed.id.clone())),
                );
            }
        }
    }

    candidates
}
