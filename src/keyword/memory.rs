//! In-memory BM25 keyword index
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::sync::RwLock;
use tracing::debug;

use crate::errors::Result;
use crate::keyword::tokenizer::tokenize;
use crate::keyword::{KeywordIndex, DEFAULT_SEARCH_LIMIT};
use crate::types::{Candidate, Metadata, Source};

/// BM25 term-frequency saturation
const K1: f32 = 1.2;
/// BM25 length normalization
const B: f32 = 0.75;

/// One document of a keyword corpus file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorpusEntry {
    #[serde(default)]
    pub id: Option<String>,
    pub content: String,
    #[serde(default)]
    pub metadata: Metadata,
}

struct IndexedDoc {
    id: String,
    content: String,
    metadata: Metadata,
    term_freqs: HashMap<String, usize>,
    length: usize,
}

#[derive(Default)]
struct IndexState {
    docs: Vec<IndexedDoc>,
    doc_freqs: HashMap<String, usize>,
    total_length: usize,
    next_id: usize,
}

impl IndexState {
    fn average_length(&self) -> f32 {
        if self.docs.is_empty() {
            0.0
        } else {
            self.total_length as f32 / self.docs.len() as f32
        }
    }

    fn idf(&self, term: &str) -> f32 {
        let n = self.docs.len() as f32;
        let df = self.doc_freqs.get(term).copied().unwrap_or(0) as f32;
        (1.0 + (n - df + 0.5) / (df + 0.5)).ln()
    }

    fn score(&self, doc: &IndexedDoc, terms: &[String], avg_len: f32) -> f32 {
        terms
            .iter()
            .filter_map(|term| doc.term_freqs.get(term).map(|tf| (term, *tf as f32)))
            .map(|(term, tf)| {
                let norm = 1.0 - B + B * doc.length as f32 / avg_len.max(1.0);
                self.idf(term) * tf * (K1 + 1.0) / (tf + K1 * norm)
            })
            .sum()
    }
}

/// Keyword index over a flat text corpus
#[derive(Default)]
pub struct InMemoryKeywordIndex {
    state: RwLock<IndexState>,
}

impl InMemoryKeywordIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a JSON array of corpus entries
    pub async fn load_corpus(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let entries: Vec<CorpusEntry> = serde_json::from_str(&contents)?;
        let index = Self::new();
        for entry in entries {
            index.add_entry(entry).await;
        }
        Ok(index)
    }

    /// Add a document, returning its id. Re-adding an id replaces the old text;
    /// generated ids never collide with ids already present.
    pub async fn add_document(&self, id: Option<String>, content: &str, metadata: Metadata) -> String {
        self.add_entry(CorpusEntry {
            id,
            content: content.to_string(),
            metadata,
        })
        .await
    }

    async fn add_entry(&self, entry: CorpusEntry) -> String {
        let mut state = self.state.write().await;
        let id = match entry.id {
            Some(id) => id,
            None => loop {
                state.next_id += 1;
                let candidate = format!("doc-{}", state.next_id);
                if !state.docs.iter().any(|d| d.id == candidate) {
                    break candidate;
                }
            },
        };
        remove_locked(&mut state, &id);

        let tokens = tokenize(&entry.content);
        let mut term_freqs: HashMap<String, usize> = HashMap::new();
        for token in &tokens {
            *term_freqs.entry(token.clone()).or_insert(0) += 1;
        }
        for term in term_freqs.keys() {
            *state.doc_freqs.entry(term.clone()).or_insert(0) += 1;
        }
        state.total_length += tokens.len();
        state.docs.push(IndexedDoc {
            id: id.clone(),
            content: entry.content,
            metadata: entry.metadata,
            term_freqs,
            length: tokens.len(),
        });
        id
    }

    pub async fn remove_document(&self, id: &str) -> bool {
        let mut state = self.state.write().await;
        remove_locked(&mut state, id)
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.docs.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

fn remove_locked(state: &mut IndexState, id: &str) -> bool {
    let Some(pos) = state.docs.iter().position(|d| d.id == id) else {
        return false;
    };
    let doc = state.docs.remove(pos);
    for term in doc.term_freqs.keys() {
        if let Some(df) = state.doc_freqs.get_mut(term) {
            *df -= 1;
            if *df == 0 {
                state.doc_freqs.remove(term);
            }
        }
    }
    state.total_length -= doc.length;
    true
}

#[async_trait]
impl KeywordIndex for InMemoryKeywordIndex {
    async fn search(&self, query: &str, limit: Option<usize>) -> Vec<Candidate> {
        let limit = limit.unwrap_or(DEFAULT_SEARCH_LIMIT);
        let mut seen = HashSet::new();
        let terms: Vec<String> = tokenize(query)
            .into_iter()
            .filter(|t| seen.insert(t.clone()))
            .collect();
        if terms.is_empty() || limit == 0 {
            return Vec::new();
        }

        let state = self.state.read().await;
        let avg_len = state.average_length();
        let mut scored: Vec<(f32, &IndexedDoc)> = state
            .docs
            .iter()
            .map(|doc| (state.score(doc, &terms, avg_len), doc))
            .filter(|(score, _)| *score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);

        debug!(query, hits = scored.len(), "keyword search");

        scored
            .into_iter()
            .map(|(score, doc)| {
                let mut candidate = Candidate::new(doc.content.clone(), score, Source::Keyword)
                    .with_metadata("doc_id", doc.id.clone());
                candidate.extend_metadata(doc.metadata.clone());
                candidate
            })
            .collect()
    }
}
