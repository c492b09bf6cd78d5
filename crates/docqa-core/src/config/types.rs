use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::vault::Secret;

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(skip)]
    pub secrets: ResolvedSecrets,
}

/// Where answers are generated. Resolved once from the presence of a
/// Hugging Face token; never switched at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GeneratorBackend {
    /// Hugging Face inference router.
    Remote,
    /// Local Ollama daemon.
    Local,
}

impl GeneratorBackend {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Remote => "remote",
            Self::Local => "local",
        }
    }

    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::Remote => "HuggingFaceH4/zephyr-7b-beta",
            Self::Local => "mistral:7b",
        }
    }

    #[must_use]
    pub fn default_embedding_model(self) -> &'static str {
        match self {
            Self::Remote => "sentence-transformers/all-mpnet-base-v2",
            Self::Local => "nomic-embed-text",
        }
    }
}

impl std::fmt::Display for GeneratorBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_ollama_url() -> String {
    "http://localhost:11434".into()
}

fn default_huggingface_url() -> String {
    docqa_llm::huggingface::DEFAULT_BASE_URL.into()
}

fn default_max_tokens() -> u32 {
    256
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LlmConfig {
    #[serde(default = "default_ollama_url")]
    pub ollama_url: String,
    #[serde(default = "default_huggingface_url")]
    pub huggingface_url: String,
    /// Generation model. Unset means the backend's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Embedding model. Unset means the backend's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model: Option<String>,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            ollama_url: default_ollama_url(),
            huggingface_url: default_huggingface_url(),
            model: None,
            embedding_model: None,
            max_tokens: default_max_tokens(),
        }
    }
}

fn default_chunk_size() -> usize {
    1200
}

fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_top_k() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,
    /// Minimum cosine score for a retrieved chunk to be used as context.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score_threshold: Option<f32>,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            score_threshold: None,
        }
    }
}

fn default_index_dir() -> PathBuf {
    PathBuf::from("storage/index")
}

fn default_cache_dir() -> PathBuf {
    PathBuf::from("storage/cache")
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default = "default_index_dir")]
    pub index_dir: PathBuf,
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            index_dir: default_index_dir(),
            cache_dir: default_cache_dir(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ResolvedSecrets {
    pub huggingface_token: Option<Secret>,
}

impl Config {
    #[must_use]
    pub fn backend(&self) -> GeneratorBackend {
        if self.secrets.huggingface_token.is_some() {
            GeneratorBackend::Remote
        } else {
            GeneratorBackend::Local
        }
    }

    #[must_use]
    pub fn generation_model(&self) -> String {
        self.llm
            .model
            .clone()
            .unwrap_or_else(|| self.backend().default_model().to_owned())
    }

    #[must_use]
    pub fn embedding_model(&self) -> String {
        self.llm
            .embedding_model
            .clone()
            .unwrap_or_else(|| self.backend().default_embedding_model().to_owned())
    }
}
