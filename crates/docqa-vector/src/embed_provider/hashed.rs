use std::hash::{Hash, Hasher};

use anyhow::Result;
use twox_hash::XxHash64;

use docqa_core::traits::Embedder;

use super::l2_normalize;

/// Deterministic bag-of-words embedder.
///
/// Every lowercased alphanumeric token is hashed into one of `dim` buckets and
/// the vector is L2-normalized. Texts sharing words land close together, which
/// is all offline indexing and tests need.
#[derive(Debug, Clone)]
pub struct HashedEmbedder {
    dim: usize,
}

impl HashedEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim: dim.max(1) }
    }

    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut v = vec![0f32; self.dim];
        let lowered = text.to_lowercase();
        for token in lowered.split(|c: char| !c.is_alphanumeric()).filter(|t| !t.is_empty()) {
            let mut hasher = XxHash64::with_seed(0);
            token.hash(&mut hasher);
            let h = hasher.finish();
            let idx = (h % self.dim as u64) as usize;
            // top bit picks the sign
            v[idx] += if (h >> 63) == 0 { 1.0 } else { -1.0 };
        }
        l2_normalize(&mut v);
        v
    }
}

impl Embedder for HashedEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.embed_text(t)).collect())
    }
}
