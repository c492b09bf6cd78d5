use std::io::Write;
use std::path::{Path, PathBuf};

use serial_test::serial;

use super::*;
use crate::vault::MapSecrets;

const ENV_KEYS: [&str; 19] = [
    "DOCQA_OLLAMA_URL",
    "DOCQA_HF_URL",
    "DOCQA_LLM_MODEL",
    "LLM_HF_MODEL",
    "DOCQA_EMBEDDING_MODEL",
    "EMBEDDING_MODEL",
    "DOCQA_LLM_MAX_TOKENS",
    "DOCQA_CHUNK_SIZE",
    "CHUNK_SIZE",
    "DOCQA_CHUNK_OVERLAP",
    "CHUNK_OVERLAP",
    "DOCQA_TOP_K",
    "TOP_K",
    "DOCQA_SCORE_THRESHOLD",
    "DOCQA_INDEX_DIR",
    "INDEX_DIR",
    "DOCQA_CACHE_DIR",
    "CACHE_DIR",
    "DOCQA_HF_TOKEN",
];

fn clear_env() {
    for key in ENV_KEYS {
        unsafe { std::env::remove_var(key) };
    }
}

fn write_config(dir: &Path, body: &str) -> PathBuf {
    let path = dir.join("docqa.toml");
    let mut f = std::fs::File::create(&path).unwrap();
    write!(f, "{body}").unwrap();
    path
}

#[test]
fn defaults_when_file_missing() {
    let config = Config::default();
    assert_eq!(config.llm.ollama_url, "http://localhost:11434");
    assert_eq!(config.llm.huggingface_url, "https://router.huggingface.co");
    assert_eq!(config.llm.max_tokens, 256);
    assert!(config.llm.model.is_none());
    assert_eq!(config.chunking.chunk_size, 1200);
    assert_eq!(config.chunking.chunk_overlap, 200);
    assert_eq!(config.retrieval.top_k, 10);
    assert!(config.retrieval.score_threshold.is_none());
    assert_eq!(config.storage.index_dir, PathBuf::from("storage/index"));
    assert_eq!(config.storage.cache_dir, PathBuf::from("storage/cache"));
    assert!(config.secrets.huggingface_token.is_none());
    assert_eq!(config.backend(), GeneratorBackend::Local);
}

#[test]
#[serial]
fn load_missing_file_gives_defaults() {
    clear_env();
    let config = Config::load(Path::new("/nonexistent/docqa.toml")).unwrap();
    assert_eq!(config.chunking.chunk_size, 1200);
    assert_eq!(config.retrieval.top_k, 10);
}

#[test]
#[serial]
fn parse_valid_toml() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(
        dir.path(),
        r#"
[llm]
ollama_url = "http://gpu-box:11434"
model = "llama3.1:8b"
embedding_model = "mxbai-embed-large"
max_tokens = 512

[chunking]
chunk_size = 800
chunk_overlap = 100

[retrieval]
top_k = 4
score_threshold = 0.25

[storage]
index_dir = "/var/lib/docqa/index"
cache_dir = "/var/lib/docqa/cache"
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.llm.ollama_url, "http://gpu-box:11434");
    assert_eq!(config.generation_model(), "llama3.1:8b");
    assert_eq!(config.embedding_model(), "mxbai-embed-large");
    assert_eq!(config.llm.max_tokens, 512);
    assert_eq!(config.chunking.chunk_size, 800);
    assert_eq!(config.chunking.chunk_overlap, 100);
    assert_eq!(config.retrieval.top_k, 4);
    assert_eq!(config.retrieval.score_threshold, Some(0.25));
    assert_eq!(config.storage.index_dir, PathBuf::from("/var/lib/docqa/index"));
    assert!(config.validate().is_ok());
}

#[test]
#[serial]
fn partial_toml_keeps_section_defaults() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[retrieval]\ntop_k = 3\n");
    let config = Config::load(&path).unwrap();
    assert_eq!(config.retrieval.top_k, 3);
    assert!(config.retrieval.score_threshold.is_none());
    assert_eq!(config.chunking.chunk_size, 1200);
    assert_eq!(config.llm.ollama_url, "http://localhost:11434");
}

#[test]
#[serial]
fn invalid_toml_is_parse_error() {
    clear_env();
    let dir = tempfile::tempdir().unwrap();
    let path = write_config(dir.path(), "[chunking\nchunk_size = ");
    assert!(matches!(Config::load(&path), Err(ConfigError::Parse(_))));
}

#[test]
#[serial]
fn env_overrides() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("DOCQA_LLM_MODEL", "phi3:mini");
        std::env::set_var("DOCQA_CHUNK_SIZE", "600");
        std::env::set_var("DOCQA_CHUNK_OVERLAP", "50");
        std::env::set_var("DOCQA_TOP_K", "5");
        std::env::set_var("DOCQA_SCORE_THRESHOLD", "0.4");
        std::env::set_var("DOCQA_CACHE_DIR", "/tmp/docqa-cache");
    }
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.llm.model.as_deref(), Some("phi3:mini"));
    assert_eq!(config.chunking.chunk_size, 600);
    assert_eq!(config.chunking.chunk_overlap, 50);
    assert_eq!(config.retrieval.top_k, 5);
    assert_eq!(config.retrieval.score_threshold, Some(0.4));
    assert_eq!(config.storage.cache_dir, PathBuf::from("/tmp/docqa-cache"));
}

#[test]
#[serial]
fn legacy_env_names_are_honored() {
    clear_env();
    let mut config = Config::default();

    unsafe {
        std::env::set_var("LLM_HF_MODEL", "google/flan-t5-large");
        std::env::set_var("EMBEDDING_MODEL", "sentence-transformers/all-MiniLM-L6-v2");
        std::env::set_var("CHUNK_SIZE", "900");
        std::env::set_var("TOP_K", "7");
        std::env::set_var("INDEX_DIR", "idx");
    }
    config.apply_env_overrides();
    clear_env();

    assert_eq!(config.generation_model(), "google/flan-t5-large");
    assert_eq!(
        config.embedding_model(),
        "sentence-transformers/all-MiniLM-L6-v2"
    );
    assert_eq!(config.chunking.chunk_size, 900);
    assert_eq!(config.retrieval.top_k, 7);
    assert_eq!(config.storage.index_dir, PathBuf::from("idx"));
}

#[test]
#[serial]
fn prefixed_env_wins_over_legacy() {
    clear_env();
    let mut config = Config::default();
    unsafe {
        std::env::set_var("DOCQA_TOP_K", "2");
        std::env::set_var("TOP_K", "9");
    }
    config.apply_env_overrides();
    clear_env();
    assert_eq!(config.retrieval.top_k, 2);
}

#[test]
#[serial]
fn invalid_numeric_env_is_ignored() {
    clear_env();
    let mut config = Config::default();
    unsafe {
        std::env::set_var("DOCQA_CHUNK_SIZE", "huge");
        std::env::set_var("DOCQA_TOP_K", "-3");
    }
    config.apply_env_overrides();
    clear_env();
    assert_eq!(config.chunking.chunk_size, 1200);
    assert_eq!(config.retrieval.top_k, 10);
}

#[test]
fn resolve_secrets_selects_remote_backend() {
    let mut config = Config::default();
    config.resolve_secrets(&MapSecrets::default().with_secret("HUGGINGFACEHUB_API_TOKEN", "hf_y"));
    assert_eq!(config.backend(), GeneratorBackend::Remote);
    assert_eq!(
        config.secrets.huggingface_token.as_ref().map(|s| s.expose()),
        Some("hf_y")
    );
}

#[test]
fn resolve_secrets_without_token_stays_local() {
    let mut config = Config::default();
    config.resolve_secrets(&MapSecrets::default().with_secret("DOCQA_HF_TOKEN", ""));
    assert_eq!(config.backend(), GeneratorBackend::Local);
}

#[test]
fn validate_accepts_defaults() {
    assert!(Config::default().validate().is_ok());
}

#[test]
fn validate_rejects_zero_chunk_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 0;
    config.chunking.chunk_overlap = 0;
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("chunk_size"));
}

#[test]
fn validate_rejects_overlap_not_below_size() {
    let mut config = Config::default();
    config.chunking.chunk_size = 100;
    config.chunking.chunk_overlap = 100;
    assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
}

#[test]
fn validate_rejects_zero_top_k() {
    let mut config = Config::default();
    config.retrieval.top_k = 0;
    assert!(config.validate().is_err());
}

#[test]
fn validate_rejects_nan_threshold() {
    let mut config = Config::default();
    config.retrieval.score_threshold = Some(f32::NAN);
    assert!(config.validate().is_err());
}
