mod env;
mod types;


pub use types::*;

use std::path::Path;

use anyhow::{Context, bail};

use crate::secrets::{GEMINI_API_KEY, Secret, SecretSource};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).context("failed to read config file")?;
            toml::from_str::<Self>(&content).context("failed to parse config file")?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Look up the Gemini credential in `source`.
    ///
    /// # Errors
    ///
    /// Returns an error if the secret source fails.
    pub async fn resolve_secrets(&mut self, source: &dyn SecretSource) -> anyhow::Result<()> {
        if let Some(raw) = source.lookup(GEMINI_API_KEY).await? {
            self.secrets.gemini_api_key = Secret::from_raw(&raw);
        }
        Ok(())
    }

    /// Reject configurations the service cannot start with.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid value, including a
    /// missing `GEMINI_API_KEY`.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.secrets.gemini_api_key.is_none() {
            bail!("GEMINI_API_KEY is not set (environment or .env)");
        }
        if self.chunking.chunk_size == 0 {
            bail!("chunking.chunk_size must be greater than 0");
        }
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            bail!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunking.chunk_overlap,
                self.chunking.chunk_size
            );
        }
        if self.retrieval.top_k == 0 {
            bail!("retrieval.top_k must be greater than 0");
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            bail!("llm.temperature must be within 0.0..=2.0");
        }
        if self.llm.model.trim().is_empty() || self.llm.embedding_model.trim().is_empty() {
            bail!("llm.model and llm.embedding_model must not be empty");
        }
        if self.documents.max_file_size == 0 || self.gateway.max_body_size == 0 {
            bail!("size limits must be greater than 0");
        }
        Ok(())
    }
}
