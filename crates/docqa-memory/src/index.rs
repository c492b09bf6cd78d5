//! Flat in-memory similarity index over chunk embeddings.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::document::Chunk;
use crate::error::MemoryError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexEntry {
    pub vector: Vec<f32>,
    pub chunk: Chunk,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoredChunk {
    pub score: f32,
    pub chunk: Chunk,
}

/// Serialized form of a built index, tagged with the embedding model that
/// produced its vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexSnapshot {
    pub embedding_model: String,
    pub entries: Vec<IndexEntry>,
}

impl IndexSnapshot {
    /// Write the snapshot as JSON via a temp file and rename.
    ///
    /// # Errors
    ///
    /// Returns an error on serialization or filesystem failure.
    pub async fn save(&self, path: &Path) -> Result<(), MemoryError> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| MemoryError::io(parent, e))?;
        }
        let json = serde_json::to_vec(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(format!(".{}.tmp", std::process::id()));
        let tmp = std::path::PathBuf::from(tmp);

        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| MemoryError::io(&tmp, e))?;
        if let Err(e) = tokio::fs::rename(&tmp, path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(MemoryError::io(path, e));
        }
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an error if the file is missing or is not a valid snapshot.
    pub async fn load(path: &Path) -> Result<Self, MemoryError> {
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| MemoryError::io(path, e))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

#[derive(Debug, Clone, Default)]
pub struct VectorIndex {
    entries: Vec<IndexEntry>,
    dimension: Option<usize>,
}

impl VectorIndex {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from `(chunk, vector)` pairs, keeping their order.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::DimensionMismatch`] if the vectors disagree in
    /// length, or [`MemoryError::Other`] if a vector is empty.
    pub fn build(pairs: impl IntoIterator<Item = (Chunk, Vec<f32>)>) -> Result<Self, MemoryError> {
        let mut index = Self::new();
        for (chunk, vector) in pairs {
            index.insert(chunk, vector)?;
        }
        Ok(index)
    }

    /// # Errors
    ///
    /// See [`VectorIndex::build`].
    pub fn insert(&mut self, chunk: Chunk, vector: Vec<f32>) -> Result<(), MemoryError> {
        if vector.is_empty() {
            return Err(MemoryError::Other("empty embedding vector".into()));
        }
        match self.dimension {
            Some(expected) if expected != vector.len() => {
                return Err(MemoryError::DimensionMismatch {
                    expected,
                    actual: vector.len(),
                });
            }
            Some(_) => {}
            None => self.dimension = Some(vector.len()),
        }
        self.entries.push(IndexEntry { vector, chunk });
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Top `k` chunks by descending cosine similarity to `query`. Equal scores
    /// keep insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`MemoryError::DimensionMismatch`] if `query` has a different
    /// length than the indexed vectors.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<ScoredChunk>, MemoryError> {
        if let Some(expected) = self.dimension
            && expected != query.len()
        {
            return Err(MemoryError::DimensionMismatch {
                expected,
                actual: query.len(),
            });
        }

        let mut scored: Vec<ScoredChunk> = self
            .entries
            .iter()
            .map(|e| ScoredChunk {
                score: cosine_similarity(query, &e.vector),
                chunk: e.chunk.clone(),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    #[must_use]
    pub fn to_snapshot(&self, embedding_model: &str) -> IndexSnapshot {
        IndexSnapshot {
            embedding_model: embedding_model.to_owned(),
            entries: self.entries.clone(),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the snapshot's vectors are inconsistent.
    pub fn from_snapshot(snapshot: IndexSnapshot) -> Result<Self, MemoryError> {
        Self::build(snapshot.entries.into_iter().map(|e| (e.chunk, e.vector)))
    }
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
