//! Shared plumbing for OpenAI-compatible HTTP collaborators.

use anyhow::{anyhow, Result};

pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Bearer token from `OPENAI_API_KEY`. `purpose` names the caller in the error.
pub fn api_key_from_env(purpose: &str) -> Result<String> {
    std::env::var(OPENAI_API_KEY_ENV).map_err(|_| anyhow!("{OPENAI_API_KEY_ENV} must be set for {purpose}"))
}

/// Full URL for `route` (`embeddings`, `chat/completions`) under `base_url`.
///
/// A base already ending in `route` is used as is, a base ending in a version
/// segment (`/v1`, `/v2`) gets only the route, anything else gets `/v1/{route}`.
pub fn openai_endpoint(base_url: &str, route: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with(&format!("/{route}")) {
        base.to_string()
    } else if has_version_suffix(base) {
        format!("{base}/{route}")
    } else {
        format!("{base}/v1/{route}")
    }
}

fn has_version_suffix(base_url: &str) -> bool {
    let Some(last) = base_url.rsplit('/').next() else { return false };
    let Some(rest) = last.strip_prefix('v') else { return false };
    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embeddings_endpoint_is_derived_from_base_url() {
        assert_eq!(openai_endpoint("https://api.openai.com", "embeddings"), "https://api.openai.com/v1/embeddings");
        assert_eq!(openai_endpoint("https://api.openai.com/v1/", "embeddings"), "https://api.openai.com/v1/embeddings");
        assert_eq!(openai_endpoint("http://localhost:8080/v2", "embeddings"), "http://localhost:8080/v2/embeddings");
        assert_eq!(openai_endpoint("http://host/v1/embeddings", "embeddings"), "http://host/v1/embeddings");
    }

    #[test]
    fn chat_endpoint_is_derived_from_base_url() {
        assert_eq!(
            openai_endpoint("https://api.openai.com", "chat/completions"),
            "https://api.openai.com/v1/chat/completions"
        );
        assert_eq!(
            openai_endpoint("http://localhost:11434/v1/chat/completions", "chat/completions"),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn version_segment_needs_digits() {
        assert!(has_version_suffix("http://host/v1"));
        assert!(!has_version_suffix("http://host/v"));
        assert!(!has_version_suffix("http://host/api"));
        assert_eq!(openai_endpoint("http://host/vault", "embeddings"), "http://host/vault/v1/embeddings");
    }
}
