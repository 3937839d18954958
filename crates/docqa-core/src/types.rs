//! Domain types shared by the loader, chunker, stores and retriever.

use serde::{Deserialize, Serialize};

/// Primary key shared by the vector store and the lexical corpus.
pub type DocId = String;

/// An addressable slice of a loaded file.
///
/// `locator` is a human-readable position marker: `page_{n}` for PDF pages,
/// `Section: <heading>` for HTML sections, or `document` for plain text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub locator: String,
    pub text: String,
}

impl Block {
    pub fn new(locator: impl Into<String>, text: impl Into<String>) -> Self {
        Self { locator: locator.into(), text: text.into() }
    }
}

/// A bounded-size, locator-tagged piece of a file ready for embedding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub chunk_id: String,
    pub text: String,
    pub locator: String,
}

/// Metadata stored next to every indexed chunk, in both stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocMetadata {
    pub source: String,
    pub locator: String,
    pub chunk_id: String,
}

/// A chunk as it lives in the vector store and the lexical corpus.
///
/// `id` is always `{source}::{chunk_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: DocId,
    pub text: String,
    pub metadata: DocMetadata,
}

impl IndexedDocument {
    pub fn from_chunk(source: &str, chunk: Chunk) -> Self {
        Self {
            id: doc_id(source, &chunk.chunk_id),
            text: chunk.text,
            metadata: DocMetadata {
                source: source.to_string(),
                locator: chunk.locator,
                chunk_id: chunk.chunk_id,
            },
        }
    }
}

pub fn doc_id(source: &str, chunk_id: &str) -> DocId {
    format!("{source}::{chunk_id}")
}

/// Ranked output of a vector-store query. The three vectors are parallel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub ids: Vec<DocId>,
    pub documents: Vec<String>,
    pub metadatas: Vec<DocMetadata>,
}

impl QueryResult {
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// A lexical hit. Higher `score` is better.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: DocId,
    pub score: f32,
}

/// Result of indexing one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub files_parsed: usize,
    pub chunks_created: usize,
    pub indexed: bool,
    pub source: String,
    pub deleted_old_chunks: usize,
}

/// Where an answer came from. Derived read-only from a retrieved chunk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub source: String,
    pub locator: String,
    pub chunk_id: String,
    pub snippet: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub answer: String,
    pub citations: Vec<Citation>,
}
