use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::Error;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub embedding: EmbeddingConfig,
    #[serde(default)]
    pub completion: CompletionConfig,
    #[serde(default)]
    pub websearch: WebSearchConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StoreConfig {
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("./data/intramate.sqlite")
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_window_words")]
    pub window_words: usize,
    #[serde(default = "default_overlap_words")]
    pub overlap_words: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            window_words: default_window_words(),
            overlap_words: default_overlap_words(),
        }
    }
}

fn default_window_words() -> usize {
    500
}
fn default_overlap_words() -> usize {
    50
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
        }
    }
}

fn default_top_k() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_model")]
    pub model: String,
    #[serde(default = "default_dims")]
    pub dims: usize,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            model: default_embedding_model(),
            dims: default_dims(),
            max_retries: default_max_retries(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_embedding_model() -> String {
    "text-embedding-3-small".to_string()
}
fn default_dims() -> usize {
    1536
}
fn default_max_retries() -> u32 {
    5
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CompletionConfig {
    #[serde(default = "default_completion_model")]
    pub model: String,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_completion_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_summary_max_chars")]
    pub summary_max_chars: usize,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            model: default_completion_model(),
            max_retries: default_max_retries(),
            timeout_secs: default_completion_timeout_secs(),
            summary_max_chars: default_summary_max_chars(),
        }
    }
}

fn default_completion_model() -> String {
    "gpt-3.5-turbo".to_string()
}
fn default_completion_timeout_secs() -> u64 {
    60
}
fn default_summary_max_chars() -> usize {
    4000
}

#[derive(Debug, Deserialize, Clone)]
pub struct WebSearchConfig {
    #[serde(default = "default_web_limit")]
    pub limit: usize,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            limit: default_web_limit(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_web_limit() -> usize {
    3
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: usize,
    #[serde(default = "default_uploads_dir")]
    pub uploads_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_upload_bytes: default_max_upload_bytes(),
            uploads_dir: default_uploads_dir(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:8000".to_string()
}
fn default_max_upload_bytes() -> usize {
    50 * 1024 * 1024
}
fn default_uploads_dir() -> PathBuf {
    PathBuf::from("./uploads")
}

impl Config {
    /// Validate cross-field constraints. Called by [`load_config`] and by
    /// tests that build configs directly.
    pub fn validate(&self) -> Result<(), Error> {
        if self.chunking.window_words == 0 {
            return Err(Error::Config(
                "chunking.window_words must be > 0".to_string(),
            ));
        }
        if self.chunking.overlap_words >= self.chunking.window_words {
            return Err(Error::Config(format!(
                "chunking.overlap_words ({}) must be smaller than chunking.window_words ({})",
                self.chunking.overlap_words, self.chunking.window_words
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(Error::Config("retrieval.top_k must be >= 1".to_string()));
        }
        if self.embedding.dims == 0 {
            return Err(Error::Config("embedding.dims must be > 0".to_string()));
        }
        if self.completion.summary_max_chars == 0 {
            return Err(Error::Config(
                "completion.summary_max_chars must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            store: StoreConfig::default(),
            chunking: ChunkingConfig::default(),
            retrieval: RetrievalConfig::default(),
            embedding: EmbeddingConfig::default(),
            completion: CompletionConfig::default(),
            websearch: WebSearchConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

/// Load and validate a TOML configuration file. Every section and field has
/// a default, so a minimal or empty file is valid.
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.chunking.window_words, 500);
        assert_eq!(config.chunking.overlap_words, 50);
        assert_eq!(config.retrieval.top_k, 3);
        assert_eq!(config.completion.summary_max_chars, 4000);
        assert_eq!(config.websearch.limit, 3);
        config.validate().unwrap();
    }

    #[test]
    fn overlap_must_be_smaller_than_window() {
        let config: Config = toml::from_str(
            r#"
            [chunking]
            window_words = 100
            overlap_words = 100
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn top_k_zero_is_rejected() {
        let config: Config = toml::from_str(
            r#"
            [retrieval]
            top_k = 0
            "#,
        )
        .unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn partial_sections_fill_in() {
        let config: Config = toml::from_str(
            r#"
            [embedding]
            model = "text-embedding-3-large"
            dims = 3072
            "#,
        )
        .unwrap();
        assert_eq!(config.embedding.model, "text-embedding-3-large");
        assert_eq!(config.embedding.dims, 3072);
        assert_eq!(config.embedding.max_retries, 5);
    }
}
