//! docqa-vector
//!
//! Embedding providers and an in-memory vector store keyed by document id.

pub mod embed_provider;
pub mod openai_compat;
pub mod store;

pub use embed_provider::{get_embedder, HashedEmbedder, OpenAiEmbedder};
pub use openai_compat::{api_key_from_env, openai_endpoint, OPENAI_API_KEY_ENV};
pub use store::MemoryVectorStore;
