use crate::types::{DocId, IndexedDocument, QueryResult};

pub trait Embedder: Send + Sync {
    fn dim(&self) -> usize;
    fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f32>>>;
}

/// One logical collection of embedded chunks.
///
/// `add` and `delete` must be applied in lockstep with the lexical corpus; the
/// engine that owns both stores is responsible for the ordering.
pub trait VectorStore: Send + Sync {
    fn add(&mut self, documents: &[IndexedDocument]) -> anyhow::Result<()>;
    fn delete(&mut self, ids: &[DocId]) -> anyhow::Result<()>;
    /// Ids of every document whose metadata `source` equals `source`.
    fn ids_for_source(&self, source: &str) -> anyhow::Result<Vec<DocId>>;
    /// Best-first nearest neighbours of `text`, optionally restricted to one source.
    fn query(&self, text: &str, n_results: usize, source: Option<&str>) -> anyhow::Result<QueryResult>;
    fn count(&self) -> usize;
}

/// Opaque `generate(prompt) -> text` service.
pub trait LanguageModel: Send + Sync {
    fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
