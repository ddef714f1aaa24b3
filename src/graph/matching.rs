//! Heuristic match confidence between a free-text query and a node.
//!
//! Queries are usually sentences ("气虚体质的表现") while node names are short
//! entity labels ("气虚"), so containment in either direction counts. The
//! value is source-local and only used to order graph seeds before reranking.

use crate::graph::model::Node;

/// Confidence for an exact name or alias match
pub const EXACT_MATCH: f32 = 1.0;

/// Confidence when only the description mentions the query
pub const DESCRIPTION_MATCH: f32 = 0.5;

const MIN_PARTIAL: f32 = 0.1;
const MAX_PARTIAL: f32 = 0.95;

/// Score how well `node` matches `query`, or `None` if it does not match at all.
pub fn match_confidence(query: &str, node: &Node) -> Option<f32> {
    let query = query.trim().to_lowercase();
    if query.is_empty() {
        return None;
    }
    let query_len = query.chars().count() as f32;

    let mut best: Option<f32> = None;

    for name in node.names() {
        let name = name.trim().to_lowercase();
        if name.is_empty() {
            continue;
        }
        let name_len = name.chars().count() as f32;

        if name == query {
            raise(&mut best, EXACT_MATCH);
        } else if query.contains(&name) {
            raise(&mut best, (name_len / query_len).clamp(MIN_PARTIAL, MAX_PARTIAL));
        } else if name.contains(&query) {
            raise(&mut best, (query_len / name_len).clamp(MIN_PARTIAL, MAX_PARTIAL));
        }
    }

    if best.is_none() && node.description.to_lowercase().contains(&query) {
        raise(&mut best, DESCRIPTION_MATCH);
    }

    best
}

fn raise(best: &mut Option<f32>, score: f32) {
    *best = Some(best.map_or(score, |b| b.max(score)));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        let node = Node::new("p1", "气虚", "Pathology");
        assert_eq!(match_confidence("气虚", &node), Some(EXACT_MATCH));
    }

    #[test]
    fn test_query_contains_name() {
        let node = Node::new("p1", "气虚", "Pathology");
        let score = match_confidence("气虚体质的表现", &node).unwrap();
        assert!((score - 2.0 / 7.0).abs() < 1e-6);
    }

    #[test]
    fn test_alias_match_is_exact() {
        let node = Node::new("h1", "黄芪", "Herb").with_alias("北芪");
        assert_eq!(match_confidence("北芪", &node), Some(EXACT_MATCH));
    }

    #[test]
    fn test_description_only() {
        let node = Node::new("o1", "脾", "Organ").with_description("主运化，统血");
        assert_eq!(match_confidence("运化", &node), Some(DESCRIPTION_MATCH));
    }

    #[test]
    fn test_no_match() {
        let node = Node::new("o1", "脾", "Organ");
        assert_eq!(match_confidence("头痛", &node), None);
        assert_eq!(match_confidence("   ", &node), None);
    }

    #[test]
    fn test_case_insensitive() {
        let node = Node::new("d1", "Diabetes", "Disease");
        assert_eq!(match_confidence("diabetes", &node), Some(EXACT_MATCH));
    }
}
