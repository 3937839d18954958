use std::path::Path;

use tracing::{debug, info};

use docqa_core::chunker::Chunker;
use docqa_core::config::Settings;
use docqa_core::loader::DocumentLoader;
use docqa_core::traits::VectorStore;
use docqa_core::types::{IndexStats, IndexedDocument};
use docqa_core::{Error, Result};
use docqa_text::LexicalCorpus;

/// Owns both stores and keeps them in lockstep.
///
/// Indexing loads and chunks the file before touching either store, so every
/// load or chunk failure leaves the corpus unchanged. After that the vector
/// store is updated first and the lexical corpus second. If the vector update
/// fails, leftover lexical entries never surface because retrieval only
/// returns ids the vector store knows about; the next successful index of the
/// same source converges both stores.
pub struct HybridSearchEngine<V: VectorStore> {
    pub(crate) vector: V,
    pub(crate) lexical: LexicalCorpus,
    loader: DocumentLoader,
    chunker: Chunker,
    lexical_enabled: bool,
    pub(crate) rrf_k: usize,
    pub(crate) max_candidates: usize,
}

impl<V: VectorStore> HybridSearchEngine<V> {
    pub fn new(vector: V, settings: &Settings) -> Self {
        Self {
            vector,
            lexical: LexicalCorpus::new(),
            loader: DocumentLoader::new(settings.index.max_file_bytes),
            chunker: Chunker::new(settings.chunking.max_chars),
            lexical_enabled: settings.index.lexical,
            rrf_k: settings.retrieval.rrf_k.max(1),
            max_candidates: settings.retrieval.max_candidates.max(1),
        }
    }

    pub fn vector(&self) -> &V {
        &self.vector
    }

    pub fn lexical(&self) -> &LexicalCorpus {
        &self.lexical
    }

    /// Index one file under `source_tag`, or under the file name when no tag
    /// is given. Every earlier chunk of that source is replaced.
    pub fn index(&mut self, path: &Path, source_tag: Option<&str>) -> Result<IndexStats> {
        let source = match source_tag.filter(|t| !t.is_empty()) {
            Some(tag) => tag.to_string(),
            None => source_name(path),
        };

        let blocks = self.loader.load(path)?;
        if blocks.is_empty() {
            return Err(Error::NoContent { path: path.to_path_buf() });
        }
        let chunks = self.chunker.chunk(&blocks);
        if chunks.is_empty() {
            return Err(Error::NoChunks { path: path.to_path_buf() });
        }
        let documents: Vec<IndexedDocument> =
            chunks.into_iter().map(|c| IndexedDocument::from_chunk(&source, c)).collect();

        let old_ids = self.vector.ids_for_source(&source)?;
        if !old_ids.is_empty() {
            self.vector.delete(&old_ids)?;
        }
        self.vector.add(&documents)?;
        let lexical_docs = if self.lexical_enabled { documents.clone() } else { Vec::new() };
        let lexical_removed = self.lexical.replace_source(&source, lexical_docs)?;
        debug!(%source, vector_removed = old_ids.len(), lexical_removed, "replaced previous chunks");

        info!(path = %path.display(), %source, blocks = blocks.len(), chunks = documents.len(), deleted_old_chunks = old_ids.len(), "indexed file");
        Ok(IndexStats {
            files_parsed: 1,
            chunks_created: documents.len(),
            indexed: true,
            source,
            deleted_old_chunks: old_ids.len(),
        })
    }

    /// Delete every chunk of `source` from both stores. Returns how many
    /// vector entries were removed.
    pub fn remove_source(&mut self, source: &str) -> Result<usize> {
        let ids = self.vector.ids_for_source(source)?;
        if !ids.is_empty() {
            self.vector.delete(&ids)?;
        }
        self.lexical.remove_source(source)?;
        info!(source, removed = ids.len(), "removed source");
        Ok(ids.len())
    }

    /// Distinct sources present in the lexical corpus.
    pub fn sources(&self) -> Vec<String> {
        self.lexical.sources()
    }
}

fn source_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
