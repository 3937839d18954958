//! Core of the document QA pipeline: domain types, the error taxonomy,
//! collaborator traits, configuration, document loading and chunking.

pub mod chunker;
pub mod config;
pub mod error;
pub mod loader;
pub mod traits;
pub mod types;

pub use error::{Error, Result};
