//! Application bootstrap: config resolution and provider construction.

use std::path::{Path, PathBuf};

use docqa_llm::LlmError;
use docqa_llm::any::AnyProvider;
use docqa_llm::huggingface::HuggingFaceProvider;
use docqa_llm::ollama::OllamaProvider;
use docqa_llm::provider::LlmProvider;

use crate::config::{Config, ConfigError, GeneratorBackend};
use crate::pipeline::{Pipeline, PipelineOptions};
use crate::session::Session;
use crate::vault::{EnvSecrets, SecretSource};

#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("invalid chunking settings: {0}")]
    Chunking(#[from] docqa_memory::document::DocumentError),
}

/// Priority: `explicit` (CLI `--config`) > `DOCQA_CONFIG` env > `config/default.toml`.
#[must_use]
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Ok(path) = std::env::var("DOCQA_CONFIG") {
        return PathBuf::from(path);
    }
    PathBuf::from("config/default.toml")
}

/// Load the file, apply env overrides, resolve secrets and validate.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed or the result is invalid.
pub fn load_config(path: &Path, secrets: &dyn SecretSource) -> Result<Config, BootstrapError> {
    let mut config = Config::load(path)?;
    config.resolve_secrets(secrets);
    config.validate()?;
    Ok(config)
}

/// Build the generation provider for the configured backend. The same
/// provider also serves embeddings.
///
/// # Errors
///
/// Returns an error if the HTTP client for the remote backend cannot be built.
pub fn create_provider(config: &Config) -> Result<AnyProvider, BootstrapError> {
    let backend = config.backend();
    let model = config.generation_model();
    let embedding_model = config.embedding_model();
    tracing::info!(%backend, model, embedding_model, "selected generator backend");

    let provider = match backend {
        GeneratorBackend::Local => AnyProvider::Ollama(OllamaProvider::new(
            &config.llm.ollama_url,
            model,
            embedding_model,
            config.llm.max_tokens,
        )),
        GeneratorBackend::Remote => {
            let token = config
                .secrets
                .huggingface_token
                .as_ref()
                .map(|s| s.expose().to_owned())
                .unwrap_or_default();
            AnyProvider::HuggingFace(HuggingFaceProvider::new(
                token,
                config.llm.huggingface_url.clone(),
                model,
                Some(embedding_model),
                config.llm.max_tokens,
            )?)
        }
    };
    Ok(provider)
}

pub async fn health_check(provider: &AnyProvider) {
    match provider.health_check().await {
        Ok(()) => tracing::info!(provider = provider.name(), "provider health check passed"),
        Err(e) => tracing::warn!(provider = provider.name(), "provider health check failed: {e}"),
    }
}

/// Wire a session from configuration with `provider` serving both embedding
/// and generation.
///
/// # Errors
///
/// Returns an error if the chunking settings are invalid.
pub fn build_session<P: LlmProvider + Clone>(
    config: &Config,
    provider: P,
) -> Result<Session<P, P>, BootstrapError> {
    let options = PipelineOptions::from_config(config)?;
    let pipeline = Pipeline::new(provider.clone(), provider, options);
    Ok(Session::new(config, pipeline))
}

/// [`load_config`] with secrets read from the process environment.
///
/// # Errors
///
/// See [`load_config`].
pub fn load_config_from_env(path: &Path) -> Result<Config, BootstrapError> {
    load_config(path, &EnvSecrets)
}

#[cfg(test)]
mod tests {
    use serial_test::serial;

    use super::*;
    use crate::vault::{MapSecrets, Secret};

    #[test]
    #[serial]
    fn config_path_priority() {
        unsafe { std::env::remove_var("DOCQA_CONFIG") };
        assert_eq!(
            resolve_config_path(None),
            PathBuf::from("config/default.toml")
        );

        unsafe { std::env::set_var("DOCQA_CONFIG", "/etc/docqa.toml") };
        assert_eq!(resolve_config_path(None), PathBuf::from("/etc/docqa.toml"));
        assert_eq!(
            resolve_config_path(Some(Path::new("cli.toml"))),
            PathBuf::from("cli.toml")
        );
        unsafe { std::env::remove_var("DOCQA_CONFIG") };
    }

    #[test]
    fn local_backend_without_token() {
        let config = Config::default();
        let provider = create_provider(&config).unwrap();
        assert!(matches!(provider, AnyProvider::Ollama(_)));
        assert_eq!(provider.model(), "mistral:7b");
        assert_eq!(provider.embedding_model(), Some("nomic-embed-text"));
    }

    #[test]
    fn local_backend_receives_token_limit() {
        let mut config = Config::default();
        config.llm.max_tokens = 128;
        let AnyProvider::Ollama(provider) = create_provider(&config).unwrap() else {
            panic!("expected the local backend");
        };
        assert_eq!(provider.max_tokens(), 128);
    }

    #[test]
    fn remote_backend_with_token() {
        let mut config = Config::default();
        config.secrets.huggingface_token = Some(Secret::new("hf_test"));
        let provider = create_provider(&config).unwrap();
        assert!(matches!(provider, AnyProvider::HuggingFace(_)));
        assert_eq!(provider.model(), "HuggingFaceH4/zephyr-7b-beta");
        assert!(!format!("{provider:?}").contains("hf_test"));
    }

    #[test]
    #[serial]
    fn load_config_validates() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[chunking]\nchunk_size = 100\nchunk_overlap = 150\n").unwrap();
        let err = load_config(&path, &MapSecrets::default()).unwrap_err();
        assert!(matches!(err, BootstrapError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    #[serial]
    fn load_config_resolves_token() {
        let config = load_config(
            Path::new("/nonexistent/docqa.toml"),
            &MapSecrets::default().with_secret("DOCQA_HF_TOKEN", "hf_z"),
        )
        .unwrap();
        assert_eq!(config.backend(), GeneratorBackend::Remote);
    }

    #[tokio::test]
    async fn build_session_uses_config_options() {
        let mut config = Config::default();
        config.retrieval.top_k = 3;
        let session = build_session(&config, docqa_llm::mock::MockProvider::default()).unwrap();
        assert_eq!(session.pipeline().options().top_k, 3);
        assert!(!session.pipeline().is_indexed().await);
    }
}
