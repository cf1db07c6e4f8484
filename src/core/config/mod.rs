//! Runtime configuration.
//!
//! Settings come from `config.yml` in the data dir (all keys optional),
//! with environment variables taking precedence. The API credential is
//! resolved separately and never stored in `Settings`.

pub mod paths;

pub use paths::AppPaths;

use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::errors::ApiError;

const DEFAULT_BASE_URL: &str = "https://api.openai.com";
const DEFAULT_CHAT_MODEL: &str = "gpt-3.5-turbo";
const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Base URL of the OpenAI-compatible endpoint used for chat and quota checks.
    pub base_url: String,
    pub chat_model: String,
    pub embedding_model: String,
    /// Optional local OpenAI-compatible endpoint (LM Studio, Ollama) used by
    /// the offline assistant for embeddings. No credential is sent to it.
    pub local_base_url: Option<String>,
    pub local_embedding_model: Option<String>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub max_chunks_per_file: usize,
    pub top_k: usize,
    pub similarity_threshold: f64,
    pub max_context_length: usize,
    pub max_tokens: Option<i32>,
    pub temperature: Option<f64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            local_base_url: None,
            local_embedding_model: None,
            chunk_size: 500,
            chunk_overlap: 50,
            max_chunks_per_file: 200,
            top_k: 3,
            similarity_threshold: 0.3,
            max_context_length: 4000,
            max_tokens: Some(512),
            temperature: Some(0.7),
        }
    }
}

impl Settings {
    /// Load from the config file (defaults when missing or unreadable),
    /// then apply environment overrides.
    pub fn load(path: &Path) -> Self {
        let mut settings = match fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str::<Settings>(&raw) {
                Ok(settings) => settings,
                Err(err) => {
                    tracing::warn!("Invalid config file {}: {}", path.display(), err);
                    Settings::default()
                }
            },
            Err(_) => Settings::default(),
        };

        if let Ok(url) = env::var("SABIO_BASE_URL") {
            settings.base_url = url;
        }
        if let Ok(model) = env::var("SABIO_CHAT_MODEL") {
            settings.chat_model = model;
        }
        if let Ok(model) = env::var("SABIO_EMBEDDING_MODEL") {
            settings.embedding_model = model;
        }
        if let Ok(url) = env::var("SABIO_LOCAL_BASE_URL") {
            settings.local_base_url = Some(url);
        }

        settings
    }
}

/// Resolve the API credential: process environment first (populated from
/// `.env` by dotenvy at startup), then a `api_key:` entry in the config file.
pub fn resolve_api_key(config_path: &Path) -> Result<String, ApiError> {
    if let Ok(key) = env::var("OPENAI_API_KEY") {
        if !key.trim().is_empty() {
            return Ok(key);
        }
    }

    if let Ok(raw) = fs::read_to_string(config_path) {
        if let Ok(value) = serde_yaml::from_str::<serde_yaml::Value>(&raw) {
            if let Some(key) = value.get("api_key").and_then(|v| v.as_str()) {
                if !key.trim().is_empty() {
                    return Ok(key.to_string());
                }
            }
        }
    }

    Err(ApiError::MissingCredential)
}

/// Render a credential for display without revealing it.
pub fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", head, tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_when_file_missing() {
        let settings = Settings::load(Path::new("/nonexistent/config.yml"));
        assert_eq!(settings.chat_model, DEFAULT_CHAT_MODEL);
        assert_eq!(settings.chunk_size, 500);
    }

    #[test]
    fn partial_yaml_keeps_defaults() {
        let tmp = std::env::temp_dir().join(format!("sabio-cfg-{}.yml", uuid::Uuid::new_v4()));
        fs::write(&tmp, "chat_model: gpt-4o-mini\ntop_k: 5\n").unwrap();

        let settings = Settings::load(&tmp);
        assert_eq!(settings.chat_model, "gpt-4o-mini");
        assert_eq!(settings.top_k, 5);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);

        let _ = fs::remove_file(tmp);
    }

    #[test]
    fn mask_hides_middle() {
        let masked = mask_key("sk-proj-abcdefghijklmnop");
        assert!(masked.starts_with("sk-p"));
        assert!(masked.ends_with("mnop"));
        assert!(!masked.contains("abcdefgh"));

        assert_eq!(mask_key("short"), "****");
    }
}
