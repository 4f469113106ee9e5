//! Similarity search over stored text.
//!
//! `TermIndex` ranks documents by cosine similarity of term-frequency
//! vectors. It needs no model and no network, which keeps recall
//! available whenever the bot itself is.

use crate::error::Result;
use crate::types::SemanticHit;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Metadata equality filter: every key must match exactly.
pub type MetadataFilter = Map<String, Value>;

/// Upsert and query text by similarity.
#[async_trait::async_trait]
pub trait SemanticStore: Send + Sync {
    /// Insert or replace a document.
    async fn upsert(&self, id: &str, text: &str, metadata: Value) -> Result<()>;

    /// Up to `k` documents most similar to `text`, best first.
    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SemanticHit>>;

    /// Remove every document matching the filter.
    async fn delete_matching(&self, filter: &MetadataFilter) -> Result<usize>;
}

struct Document {
    text: String,
    metadata: Value,
    terms: HashMap<String, f32>,
    norm: f32,
}

impl Document {
    fn matches(&self, filter: &MetadataFilter) -> bool {
        filter
            .iter()
            .all(|(key, expected)| self.metadata.get(key) == Some(expected))
    }
}

/// In-memory term-frequency index.
#[derive(Default)]
pub struct TermIndex {
    docs: RwLock<HashMap<String, Document>>,
}

impl TermIndex {
    /// Empty index
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of indexed documents
    pub async fn len(&self) -> usize {
        self.docs.read().await.len()
    }

    /// Whether the index is empty
    pub async fn is_empty(&self) -> bool {
        self.docs.read().await.is_empty()
    }
}

/// Lowercased alphanumeric terms of two or more characters.
pub(crate) fn term_frequencies(text: &str) -> HashMap<String, f32> {
    let mut tf = HashMap::new();
    for term in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.chars().count() > 1)
    {
        *tf.entry(term.to_lowercase()).or_insert(0.0) += 1.0;
    }
    tf
}

fn norm(tf: &HashMap<String, f32>) -> f32 {
    tf.values().map(|v| v * v).sum::<f32>().sqrt()
}

#[async_trait::async_trait]
impl SemanticStore for TermIndex {
    async fn upsert(&self, id: &str, text: &str, metadata: Value) -> Result<()> {
        let terms = term_frequencies(text);
        let doc = Document {
            text: text.to_string(),
            metadata,
            norm: norm(&terms),
            terms,
        };
        self.docs.write().await.insert(id.to_string(), doc);
        Ok(())
    }

    async fn query(
        &self,
        text: &str,
        k: usize,
        filter: Option<&MetadataFilter>,
    ) -> Result<Vec<SemanticHit>> {
        let query = term_frequencies(text);
        let query_norm = norm(&query);
        if k == 0 || query_norm == 0.0 {
            return Ok(Vec::new());
        }

        let docs = self.docs.read().await;
        let mut hits: Vec<SemanticHit> = docs
            .iter()
            .filter(|(_, doc)| doc.norm > 0.0)
            .filter(|(_, doc)| filter.map_or(true, |f| doc.matches(f)))
            .filter_map(|(id, doc)| {
                let dot: f32 = query
                    .iter()
                    .filter_map(|(term, q)| doc.terms.get(term).map(|d| q * d))
                    .sum();
                let score = dot / (query_norm * doc.norm);
                (score > 0.0).then(|| SemanticHit {
                    id: id.clone(),
                    text: doc.text.clone(),
                    metadata: doc.metadata.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn delete_matching(&self, filter: &MetadataFilter) -> Result<usize> {
        let mut docs = self.docs.write().await;
        let before = docs.len();
        docs.retain(|_, doc| !doc.matches(filter));
        Ok(before - docs.len())
    }
}
