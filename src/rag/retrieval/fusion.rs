// Candidate fusion: duplicate collapsing and final ranking
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use crate::types::Candidate;

/// Lowercase and keep only letters and digits, so that whitespace and
/// punctuation differences do not hide a duplicate
pub fn normalize_content(content: &str) -> String {
    content
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn bigrams(normalized: &str) -> HashSet<String> {
    let chars: Vec<char> = normalized.chars().collect();
    if chars.len() < 2 {
        return chars.iter().map(|c| c.to_string()).collect();
    }
    chars.windows(2).map(|pair| pair.iter().collect()).collect()
}

/// Jaccard similarity of the character-bigram sets of two normalized strings
pub fn bigram_jaccard(a: &str, b: &str) -> f32 {
    jaccard_sets(&bigrams(a), &bigrams(b))
}

/// Descending score order with NaN after every real score
pub fn compare_scores(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

struct Group {
    survivor: Candidate,
    bigrams: HashSet<String>,
}

/// Collapse duplicate candidates, returning survivors and how many were dropped.
///
/// Identical normalized content always collapses. With `near_threshold < 1.0`
/// a candidate also joins the first earlier group whose first member has
/// bigram Jaccard similarity `>= near_threshold`. The higher-scoring member
/// survives, at the position of the group's first member.
pub fn deduplicate(candidates: Vec<Candidate>, near_threshold: f32) -> (Vec<Candidate>, usize) {
    let near_enabled = near_threshold < 1.0;
    let mut groups: Vec<Group> = Vec::with_capacity(candidates.len());
    let mut by_content: HashMap<String, usize> = HashMap::new();
    let mut removed = 0;

    for candidate in candidates {
        let normalized = normalize_content(&candidate.content);
        let candidate_bigrams = if near_enabled {
            bigrams(&normalized)
        } else {
            HashSet::new()
        };

        let existing = by_content.get(&normalized).copied().or_else(|| {
            if !near_enabled {
                return None;
            }
            groups
                .iter()
                .position(|g| jaccard_sets(&g.bigrams, &candidate_bigrams) >= near_threshold)
        });

        match existing {
            Some(index) => {
                removed += 1;
                by_content.insert(normalized, index);
                let group = &mut groups[index];
                if compare_scores(candidate.score, group.survivor.score) == Ordering::Less {
                    group.survivor = candidate;
                }
            }
            None => {
                by_content.insert(normalized, groups.len());
                groups.push(Group {
                    survivor: candidate,
                    bigrams: candidate_bigrams,
                });
            }
        }
    }

    (groups.into_iter().map(|g| g.survivor).collect(), removed)
}

fn jaccard_sets(left: &HashSet<String>, right: &HashSet<String>) -> f32 {
    if left.is_empty() && right.is_empty() {
        return 1.0;
    }
    let shared = left.intersection(right).count();
    shared as f32 / (left.len() + right.len() - shared) as f32
}

/// Sort (stable, best first), drop scores below `threshold`, keep `top_k`.
///
/// NaN scores never pass the threshold.
pub fn rank(mut candidates: Vec<Candidate>, threshold: f32, top_k: usize) -> Vec<Candidate> {
    candidates.sort_by(|a, b| compare_scores(a.score, b.score));
    candidates.retain(|c| c.score >= threshold);
    candidates.truncate(top_k);
    candidates
}
