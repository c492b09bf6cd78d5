//! Parsed-document cache keyed by content fingerprint.
//!
//! One JSON file per tag under the cache directory. Writes go to a sibling
//! temp file that is renamed into place, so readers see either the previous
//! complete entry or the new one.

use std::path::{Path, PathBuf};

use crate::document::Document;
use crate::error::MemoryError;

#[derive(Debug, Clone)]
pub struct DocumentCache {
    dir: PathBuf,
}

impl DocumentCache {
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn entry_path(&self, tag: &str) -> PathBuf {
        self.dir.join(format!("{tag}_docs.json"))
    }

    /// # Errors
    ///
    /// Returns an error if the entry exists but cannot be read or parsed.
    pub async fn get(&self, tag: &str) -> Result<Option<Vec<Document>>, MemoryError> {
        let path = self.entry_path(tag);
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(tag, "cache miss");
                return Ok(None);
            }
            Err(e) => return Err(MemoryError::io(&path, e)),
        };
        let docs: Vec<Document> = serde_json::from_slice(&bytes)?;
        tracing::debug!(tag, documents = docs.len(), "cache hit");
        Ok(Some(docs))
    }

    /// Store `docs` under `tag`, replacing any previous entry.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the entry
    /// cannot be written.
    pub async fn put(&self, tag: &str, docs: &[Document]) -> Result<(), MemoryError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| MemoryError::io(&self.dir, e))?;

        let path = self.entry_path(tag);
        let tmp = self
            .dir
            .join(format!(".{tag}_docs.json.{}.tmp", std::process::id()));
        let json = serde_json::to_vec(docs)?;

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| MemoryError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, &path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(MemoryError::io(&path, e));
        }

        tracing::debug!(tag, documents = docs.len(), "cached documents");
        Ok(())
    }
}
