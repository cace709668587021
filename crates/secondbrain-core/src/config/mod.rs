mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::vault::{VaultProvider, first_secret};

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Config file location: explicit flag, then `SECONDBRAIN_CONFIG`, then the default path.
#[must_use]
pub fn resolve_config_path(cli_path: Option<&Path>) -> PathBuf {
    if let Some(path) = cli_path {
        return path.to_owned();
    }
    std::env::var("SECONDBRAIN_CONFIG")
        .map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

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
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {}", path.display()))?;
            toml::from_str::<Self>(&content)
                .with_context(|| format!("failed to parse config file {}", path.display()))?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Resolve API keys through the vault. The embedding key falls back to the chat key.
    ///
    /// # Errors
    ///
    /// Returns an error if the vault backend fails.
    pub async fn resolve_secrets(&mut self, vault: &dyn VaultProvider) -> anyhow::Result<()> {
        self.secrets.llm_api_key =
            first_secret(vault, &["SECONDBRAIN_LLM_API_KEY", "OPENROUTER_API_KEY"]).await?;
        self.secrets.embedding_api_key =
            first_secret(vault, &["SECONDBRAIN_EMBEDDING_API_KEY"])
                .await?
                .or_else(|| self.secrets.llm_api_key.clone());
        Ok(())
    }

    /// Check cross-field constraints that serde defaults cannot express.
    ///
    /// # Errors
    ///
    /// Returns an error describing the first invalid setting.
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.ingest.chunk_size == 0 {
            bail!("ingest.chunk_size must be greater than zero");
        }
        if self.ingest.chunk_overlap >= self.ingest.chunk_size {
            bail!(
                "ingest.chunk_overlap ({}) must be smaller than ingest.chunk_size ({})",
                self.ingest.chunk_overlap,
                self.ingest.chunk_size
            );
        }
        if self.ingest.retrieval_k == 0 {
            bail!("ingest.retrieval_k must be at least 1");
        }
        if self.agent.max_tool_iterations == 0 {
            bail!("agent.max_tool_iterations must be at least 1");
        }
        if self.timeouts.llm_seconds == 0 || self.timeouts.embedding_seconds == 0 {
            bail!("timeouts must be at least one second");
        }
        if self.llm.model.trim().is_empty() || self.llm.rag_model.trim().is_empty() {
            bail!("llm.model and llm.rag_model must not be empty");
        }
        if self.embedding.model.trim().is_empty() {
            bail!("embedding.model must not be empty");
        }
        Ok(())
    }
}
