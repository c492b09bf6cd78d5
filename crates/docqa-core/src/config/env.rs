use std::str::FromStr;

use super::Config;

/// First set variable among `keys`, with the name it was found under.
fn env_first(keys: &[&'static str]) -> Option<(&'static str, String)> {
    keys.iter()
        .find_map(|k| std::env::var(k).ok().map(|v| (*k, v)))
}

fn env_parse<T: FromStr>(keys: &[&'static str]) -> Option<T> {
    let (key, raw) = env_first(keys)?;
    if let Ok(v) = raw.trim().parse::<T>() {
        Some(v)
    } else {
        tracing::warn!("ignoring invalid {key} value: {raw}");
        None
    }
}

impl Config {
    pub(crate) fn apply_env_overrides(&mut self) {
        if let Some((_, v)) = env_first(&["DOCQA_OLLAMA_URL"]) {
            self.llm.ollama_url = v;
        }
        if let Some((_, v)) = env_first(&["DOCQA_HF_URL"]) {
            self.llm.huggingface_url = v;
        }
        if let Some((_, v)) = env_first(&["DOCQA_LLM_MODEL", "LLM_HF_MODEL"]) {
            self.llm.model = Some(v);
        }
        if let Some((_, v)) = env_first(&["DOCQA_EMBEDDING_MODEL", "EMBEDDING_MODEL"]) {
            self.llm.embedding_model = Some(v);
        }
        if let Some(n) = env_parse::<u32>(&["DOCQA_LLM_MAX_TOKENS"]) {
            self.llm.max_tokens = n;
        }
        if let Some(n) = env_parse::<usize>(&["DOCQA_CHUNK_SIZE", "CHUNK_SIZE"]) {
            self.chunking.chunk_size = n;
        }
        if let Some(n) = env_parse::<usize>(&["DOCQA_CHUNK_OVERLAP", "CHUNK_OVERLAP"]) {
            self.chunking.chunk_overlap = n;
        }
        if let Some(n) = env_parse::<usize>(&["DOCQA_TOP_K", "TOP_K"]) {
            self.retrieval.top_k = n;
        }
        if let Some(t) = env_parse::<f32>(&["DOCQA_SCORE_THRESHOLD"]) {
            self.retrieval.score_threshold = Some(t);
        }
        if let Some((_, v)) = env_first(&["DOCQA_INDEX_DIR", "INDEX_DIR"]) {
            self.storage.index_dir = v.into();
        }
        if let Some((_, v)) = env_first(&["DOCQA_CACHE_DIR", "CACHE_DIR"]) {
            self.storage.cache_dir = v.into();
        }
    }
}
