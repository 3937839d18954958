//! Configuration loader and path helpers.
//!
//! Figment merges built-in defaults, `docqa.toml`, `docqa.<env>.toml` and
//! `DOCQA_*` env vars (`__` separates nested keys, e.g.
//! `DOCQA_RETRIEVAL__TOP_K=8`).

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_MAX_CHARS: usize = 800;
pub const DEFAULT_MAX_FILE_BYTES: u64 = 50 * 1024 * 1024;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file("docqa.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("docqa.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("docqa.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("docqa.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("DOCQA_").split("__"));

        let config = Self { figment };
        config.settings()?.validate()?;
        Ok(config)
    }

    /// Build from an explicit figment, e.g. a test fixture.
    pub fn from_figment(figment: Figment) -> Self {
        Self { figment: Figment::new().merge(Serialized::defaults(Settings::default())).merge(figment) }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to read settings: {}", e))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub embedding: EmbeddingConfig,
    pub llm: LlmConfig,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.max_chars must be positive".into()));
        }
        if self.index.max_file_bytes == 0 {
            return Err(Error::InvalidConfig("index.max_file_bytes must be positive".into()));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be positive".into()));
        }
        if self.retrieval.rrf_k == 0 {
            return Err(Error::InvalidConfig("retrieval.rrf_k must be positive".into()));
        }
        if self.retrieval.max_candidates == 0 {
            return Err(Error::InvalidConfig("retrieval.max_candidates must be positive".into()));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be positive".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    pub max_chars: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self { max_chars: DEFAULT_MAX_CHARS }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    pub max_file_bytes: u64,
    /// Mirror chunks into the lexical corpus.
    pub lexical: bool,
    /// Corpus namespace; engines with different collections share nothing.
    pub collection: String,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { max_file_bytes: DEFAULT_MAX_FILE_BYTES, lexical: true, collection: "documents".to_string() }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    pub top_k: usize,
    pub use_hybrid: bool,
    pub rerank: bool,
    pub rrf_k: usize,
    pub max_candidates: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5, use_hybrid: true, rerank: true, rrf_k: 60, max_candidates: 100 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProviderKind {
    Hashed,
    OpenAi,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    pub provider: EmbeddingProviderKind,
    pub dim: usize,
    pub model: String,
    pub base_url: String,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: EmbeddingProviderKind::Hashed,
            dim: 384,
            model: "text-embedding-3-small".to_string(),
            base_url: "https://api.openai.com".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub model: String,
    pub base_url: String,
    pub temperature: f32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self { model: "gpt-4o-mini".to_string(), base_url: "https://api.openai.com".to_string(), temperature: 0.0 }
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_pipeline_constants() {
        let settings = Settings::default();
        assert_eq!(settings.chunking.max_chars, 800);
        assert_eq!(settings.index.max_file_bytes, 50 * 1024 * 1024);
        assert_eq!(settings.retrieval.rrf_k, 60);
        assert_eq!(settings.retrieval.max_candidates, 100);
        assert!((settings.llm.temperature - 0.0).abs() < f32::EPSILON);
    }

    #[test]
    fn overrides_merge_over_defaults() {
        let config = Config::from_figment(Figment::new().merge(Serialized::default("retrieval.top_k", 9)));
        let settings = config.settings().expect("settings");
        assert_eq!(settings.retrieval.top_k, 9);
        assert!(settings.retrieval.use_hybrid);
        assert_eq!(config.get::<usize>("chunking.max_chars").expect("max_chars"), 800);
    }

    #[test]
    fn zero_top_k_is_rejected() {
        let mut settings = Settings::default();
        settings.retrieval.top_k = 0;
        assert!(matches!(settings.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/data");
        assert_eq!(resolve_with_base(base, "docs/a.txt"), PathBuf::from("/data/docs/a.txt"));
        assert_eq!(resolve_with_base(base, "/abs/b.txt"), PathBuf::from("/abs/b.txt"));
    }
}
