//! docqa-text
//!
//! In-memory lexical corpus for hybrid retrieval. Documents are scored with
//! tantivy's BM25 over a RAM index that mirrors the corpus.

pub mod corpus;
pub mod tantivy_utils;

pub use corpus::LexicalCorpus;
pub use tantivy_utils::{token_set, tokenize};
