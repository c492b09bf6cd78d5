mod env;
mod types;

#[cfg(test)]
mod tests;

pub use types::*;

use std::path::Path;

use crate::vault::SecretSource;

pub const HF_TOKEN_KEYS: [&str; 2] = ["DOCQA_HF_TOKEN", "HUGGINGFACEHUB_API_TOKEN"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Config {
    /// Load configuration from a TOML file with env var overrides.
    ///
    /// Falls back to defaults when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str::<Self>(&content)?
        } else {
            tracing::debug!(path = %path.display(), "config file not found, using defaults");
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Pick up the Hugging Face token, which also selects the remote backend.
    pub fn resolve_secrets(&mut self, source: &dyn SecretSource) {
        self.secrets.huggingface_token = source.first_secret(&HF_TOKEN_KEYS);
    }

    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] for a zero chunk size, an overlap not
    /// smaller than the chunk size, a zero top-K or a non-finite threshold.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let chunking = &self.chunking;
        if chunking.chunk_size == 0 {
            return Err(ConfigError::Invalid(
                "chunking.chunk_size must be greater than zero".into(),
            ));
        }
        if chunking.chunk_overlap >= chunking.chunk_size {
            return Err(ConfigError::Invalid(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                chunking.chunk_overlap, chunking.chunk_size
            )));
        }
        if self.retrieval.top_k == 0 {
            return Err(ConfigError::Invalid(
                "retrieval.top_k must be greater than zero".into(),
            ));
        }
        if let Some(t) = self.retrieval.score_threshold
            && !t.is_finite()
        {
            return Err(ConfigError::Invalid(
                "retrieval.score_threshold must be a finite number".into(),
            ));
        }
        Ok(())
    }
}
