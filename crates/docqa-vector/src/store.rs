use anyhow::{anyhow, Result};
use tracing::debug;

use docqa_core::traits::{Embedder, VectorStore};
use docqa_core::types::{DocId, IndexedDocument, QueryResult};

struct Entry {
    doc: IndexedDocument,
    vector: Vec<f32>,
}

/// Brute-force cosine store for one named collection.
///
/// Vectors come from the configured embedder and are expected to be
/// L2-normalized. Ties keep insertion order.
pub struct MemoryVectorStore {
    collection: String,
    embedder: Box<dyn Embedder>,
    entries: Vec<Entry>,
}

impl MemoryVectorStore {
    pub fn new(collection: impl Into<String>, embedder: Box<dyn Embedder>) -> Self {
        Self { collection: collection.into(), embedder, entries: Vec::new() }
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn dim(&self) -> usize {
        self.embedder.dim()
    }

    fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        let vectors = self.embedder.embed_batch(texts)?;
        if vectors.len() != texts.len() {
            return Err(anyhow!("embedder returned {} vectors for {} texts", vectors.len(), texts.len()));
        }
        let dim = self.embedder.dim();
        if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
            return Err(anyhow!("embedding has {} dimensions, collection expects {dim}", bad.len()));
        }
        Ok(vectors)
    }
}

impl VectorStore for MemoryVectorStore {
    fn add(&mut self, documents: &[IndexedDocument]) -> Result<()> {
        if documents.is_empty() {
            return Ok(());
        }
        let texts: Vec<String> = documents.iter().map(|d| d.text.clone()).collect();
        let vectors = self.embed(&texts)?;
        for (doc, vector) in documents.iter().zip(vectors) {
            match self.entries.iter_mut().find(|e| e.doc.id == doc.id) {
                Some(existing) => {
                    existing.doc = doc.clone();
                    existing.vector = vector;
                }
                None => self.entries.push(Entry { doc: doc.clone(), vector }),
            }
        }
        debug!(collection = %self.collection, added = documents.len(), total = self.entries.len(), "vector add");
        Ok(())
    }

    fn delete(&mut self, ids: &[DocId]) -> Result<()> {
        let before = self.entries.len();
        self.entries.retain(|e| !ids.contains(&e.doc.id));
        debug!(collection = %self.collection, deleted = before - self.entries.len(), "vector delete");
        Ok(())
    }

    fn ids_for_source(&self, source: &str) -> Result<Vec<DocId>> {
        Ok(self.entries.iter().filter(|e| e.doc.metadata.source == source).map(|e| e.doc.id.clone()).collect())
    }

    fn query(&self, text: &str, n_results: usize, source: Option<&str>) -> Result<QueryResult> {
        if n_results == 0 || self.entries.is_empty() {
            return Ok(QueryResult::default());
        }
        let q = self.embed(&[text.to_string()])?.remove(0);
        let mut scored: Vec<(&Entry, f32)> = self
            .entries
            .iter()
            .filter(|e| source.map_or(true, |s| e.doc.metadata.source == s))
            .map(|e| (e, cosine(&q, &e.vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(n_results);

        let mut result = QueryResult::default();
        for (entry, _) in scored {
            result.ids.push(entry.doc.id.clone());
            result.documents.push(entry.doc.text.clone());
            result.metadatas.push(entry.doc.metadata.clone());
        }
        Ok(result)
    }

    fn count(&self) -> usize {
        self.entries.len()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if na <= f32::EPSILON || nb <= f32::EPSILON {
        0.0
    } else {
        dot / (na * nb)
    }
}
