//! Embedding providers behind the core `Embedder` trait.
//!
//! Providers return L2-normalized vectors of a fixed dimensionality, so cosine
//! similarity reduces to a dot product in the store.

use anyhow::Result;
use tracing::info;

use docqa_core::config::{EmbeddingConfig, EmbeddingProviderKind};
use docqa_core::traits::Embedder;

pub mod hashed;
pub mod openai;

pub use hashed::HashedEmbedder;
pub use openai::OpenAiEmbedder;

use crate::openai_compat::api_key_from_env;

pub fn get_embedder(cfg: &EmbeddingConfig) -> Result<Box<dyn Embedder>> {
    match cfg.provider {
        EmbeddingProviderKind::Hashed => {
            info!(dim = cfg.dim, "using hashed embedder");
            Ok(Box::new(HashedEmbedder::new(cfg.dim)))
        }
        EmbeddingProviderKind::OpenAi => {
            let api_key = api_key_from_env("the openai embedding provider")?;
            info!(model = %cfg.model, base_url = %cfg.base_url, "using OpenAI embedder");
            Ok(Box::new(OpenAiEmbedder::new(api_key, &cfg.base_url, &cfg.model, cfg.dim)?))
        }
    }
}

pub(crate) fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 1e-6 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}
