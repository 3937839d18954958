use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::config::RetrievalConfig;
use docqa_core::traits::VectorStore;
use docqa_core::types::{DocId, DocMetadata};
use docqa_core::Result;

use crate::engine::HybridSearchEngine;
use crate::fusion::{reciprocal_rank_fusion, rerank_by_overlap};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    pub top_k: usize,
    pub use_hybrid: bool,
    pub rerank: bool,
    pub source_filter: Option<String>,
}

impl RetrievalRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self::from_config(query, &RetrievalConfig::default())
    }

    pub fn from_config(query: impl Into<String>, cfg: &RetrievalConfig) -> Self {
        Self { query: query.into(), top_k: cfg.top_k, use_hybrid: cfg.use_hybrid, rerank: cfg.rerank, source_filter: None }
    }

    pub fn top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn hybrid(mut self, on: bool) -> Self {
        self.use_hybrid = on;
        self
    }

    pub fn rerank(mut self, on: bool) -> Self {
        self.rerank = on;
        self
    }

    pub fn source(mut self, source: impl Into<String>) -> Self {
        self.source_filter = Some(source.into());
        self
    }
}

/// Retrieved chunk texts and their metadata, best first. Parallel vectors.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Retrieved {
    pub documents: Vec<String>,
    pub metadatas: Vec<DocMetadata>,
}

impl Retrieved {
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl<V: VectorStore> HybridSearchEngine<V> {
    /// Vector candidates, optionally fused with BM25 and reranked by keyword
    /// overlap. Only ids returned by the vector store can come out, so an
    /// empty vector result is an empty answer.
    pub fn retrieve(&self, req: &RetrievalRequest) -> Result<Retrieved> {
        if req.top_k == 0 {
            return Ok(Retrieved::default());
        }
        let n_results = req.top_k.saturating_mul(3).min(self.max_candidates);
        let wide = req.top_k.saturating_mul(2);
        let candidates = self.vector.query(&req.query, n_results, req.source_filter.as_deref())?;

        let mut fused: Vec<DocId> = candidates.ids.iter().take(wide).cloned().collect();
        if req.use_hybrid && !self.lexical.is_empty() {
            let bm25_ids: Vec<DocId> = self.lexical.search(&req.query, wide)?.into_iter().map(|h| h.id).collect();
            debug!(vector = candidates.len(), bm25 = bm25_ids.len(), "retrieval candidates");
            if !bm25_ids.is_empty() {
                fused = reciprocal_rank_fusion(&[candidates.ids.clone(), bm25_ids], self.rrf_k);
                fused.truncate(wide);
            }
        }
        if req.rerank && !fused.is_empty() && !self.lexical.is_empty() {
            fused = rerank_by_overlap(&req.query, fused, &self.lexical, wide);
        }

        let position: HashMap<&str, usize> =
            candidates.ids.iter().enumerate().map(|(i, id)| (id.as_str(), i)).collect();
        let mut seen = HashSet::new();
        let mut out = Retrieved::default();
        for id in &fused {
            if out.len() >= req.top_k {
                break;
            }
            if !seen.insert(id.as_str()) {
                continue;
            }
            let Some(&i) = position.get(id.as_str()) else { continue };
            if let (Some(text), Some(meta)) = (candidates.documents.get(i), candidates.metadatas.get(i)) {
                out.documents.push(text.clone());
                out.metadatas.push(meta.clone());
            }
        }
        debug!(query = %req.query, returned = out.len(), "retrieved");
        Ok(out)
    }
}
