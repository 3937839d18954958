//! docqa-hybrid
//!
//! Index manager, hybrid retriever and answer assembler over a vector store
//! plus the in-memory lexical corpus.

pub mod answer;
pub mod chat;
pub mod engine;
pub mod fusion;
pub mod retriever;

pub use answer::{AnswerAssembler, NOT_FOUND_PHRASE, NO_RESULTS_MESSAGE};
pub use chat::OpenAiChat;
pub use engine::HybridSearchEngine;
pub use retriever::{RetrievalRequest, Retrieved};
