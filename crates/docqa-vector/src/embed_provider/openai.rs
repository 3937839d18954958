use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use docqa_core::traits::Embedder;

use super::l2_normalize;
use crate::openai_compat::openai_endpoint;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// OpenAI-compatible `/v1/embeddings` client.
pub struct OpenAiEmbedder {
    client: reqwest::blocking::Client,
    api_key: String,
    endpoint: String,
    model: String,
    dim: usize,
}

impl OpenAiEmbedder {
    pub fn new(api_key: String, base_url: &str, model: &str, dim: usize) -> Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self { client, api_key, endpoint: openai_endpoint(base_url, "embeddings"), model: model.to_string(), dim })
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

impl Embedder for OpenAiEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let req = EmbeddingRequest { model: &self.model, input: texts };
        let mut resp: EmbeddingResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .with_context(|| format!("embedding request to {}", self.endpoint))?
            .error_for_status()?
            .json()?;
        if resp.data.len() != texts.len() {
            return Err(anyhow!("expected {} embeddings, got {}", texts.len(), resp.data.len()));
        }
        resp.data.sort_by_key(|d| d.index);
        debug!(count = texts.len(), model = %self.model, "embedded batch");

        let mut out = Vec::with_capacity(resp.data.len());
        for d in resp.data {
            if d.embedding.len() != self.dim {
                return Err(anyhow!("embedding has {} dimensions, configured {}", d.embedding.len(), self.dim));
            }
            let mut v = d.embedding;
            l2_normalize(&mut v);
            out.push(v);
        }
        Ok(out)
    }
}
