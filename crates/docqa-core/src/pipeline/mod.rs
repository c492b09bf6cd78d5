//! Retrieval-augmented answering over an in-memory index.
//!
//! A [`Pipeline`] owns a fixed embedding provider and a fixed generator. Its
//! only mutable state is the *indexed state* (index plus retriever), held as
//! an `Arc` behind a lock and replaced in a single write once a build has
//! fully succeeded. A failed build leaves whatever was there before.

mod error;
pub mod prompt;

pub use error::{PipelineError, PipelineErrorKind};

use std::sync::Arc;

use docqa_llm::LlmProvider;
use docqa_llm::provider::Message;
use docqa_memory::document::{Chunk, Document, DocumentError, SplitterConfig, TextSplitter};
use docqa_memory::{IndexSnapshot, MemoryError, ScoredChunk, VectorIndex};
use tokio::sync::RwLock;

use crate::config::Config;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub splitter: SplitterConfig,
    pub top_k: usize,
    pub score_threshold: Option<f32>,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            splitter: SplitterConfig::default(),
            top_k: 10,
            score_threshold: None,
        }
    }
}

impl PipelineOptions {
    /// # Errors
    ///
    /// Returns an error if the chunking settings are invalid.
    pub fn from_config(config: &Config) -> Result<Self, DocumentError> {
        Ok(Self {
            splitter: SplitterConfig::new(
                config.chunking.chunk_size,
                config.chunking.chunk_overlap,
            )?,
            top_k: config.retrieval.top_k,
            score_threshold: config.retrieval.score_threshold,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildReport {
    pub chunks: usize,
}

#[derive(Debug, Clone)]
pub struct Answer {
    pub text: String,
    /// Retrieved chunks in rank order.
    pub sources: Vec<Chunk>,
}

#[derive(Debug, Clone, Copy)]
struct Retriever {
    top_k: usize,
    score_threshold: Option<f32>,
}

impl Retriever {
    fn retrieve(&self, index: &VectorIndex, query: &[f32]) -> Result<Vec<ScoredChunk>, MemoryError> {
        let mut hits = index.search(query, self.top_k)?;
        if let Some(threshold) = self.score_threshold {
            hits.retain(|h| h.score >= threshold);
        }
        Ok(hits)
    }
}

#[derive(Debug)]
struct Indexed {
    index: VectorIndex,
    retriever: Retriever,
}

pub struct Pipeline<E, G> {
    embedder: E,
    generator: G,
    options: PipelineOptions,
    state: RwLock<Option<Arc<Indexed>>>,
}

impl<E, G> std::fmt::Debug for Pipeline<E, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl<E: LlmProvider, G: LlmProvider> Pipeline<E, G> {
    #[must_use]
    pub fn new(embedder: E, generator: G, options: PipelineOptions) -> Self {
        Self {
            embedder,
            generator,
            options,
            state: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    #[must_use]
    pub fn embedder(&self) -> &E {
        &self.embedder
    }

    #[must_use]
    pub fn generator(&self) -> &G {
        &self.generator
    }

    /// Model name recorded in snapshots and checked when restoring one.
    #[must_use]
    pub fn embedding_model(&self) -> String {
        self.embedder
            .embedding_model()
            .unwrap_or_else(|| self.embedder.model())
            .to_owned()
    }

    pub async fn is_indexed(&self) -> bool {
        self.state.read().await.is_some()
    }

    /// Chunk, embed and index `documents`, then install the result.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::IndexBuild`] if there is nothing to index or
    /// any embedding fails. The previously installed index stays in place.
    pub async fn build_index(&self, documents: &[Document]) -> Result<BuildReport, PipelineError> {
        if documents.is_empty() {
            return Err(PipelineError::IndexBuild("no documents to index".into()));
        }
        if !self.embedder.supports_embeddings() {
            return Err(PipelineError::IndexBuild(format!(
                "provider {} does not support embeddings",
                self.embedder.name()
            )));
        }

        let splitter = TextSplitter::new(self.options.splitter.clone());
        let chunks = splitter.split_all(documents);
        if chunks.is_empty() {
            return Err(PipelineError::IndexBuild(
                "documents produced no chunks".into(),
            ));
        }
        let chunk_count = chunks.len();
        tracing::info!(
            documents = documents.len(),
            chunks = chunk_count,
            "building index"
        );

        let mut index = VectorIndex::new();
        for chunk in chunks {
            let vector = self.embedder.embed(&chunk.content).await.map_err(|e| {
                tracing::error!("embedding failed during index build: {e}");
                PipelineError::IndexBuild(format!("embedding failed: {e}"))
            })?;
            index.insert(chunk, vector).map_err(|e| {
                tracing::error!("index insert failed: {e}");
                PipelineError::IndexBuild(e.to_string())
            })?;
        }

        self.install(index).await;
        tracing::info!(chunks = chunk_count, top_k = self.options.top_k, "index ready");
        Ok(BuildReport {
            chunks: chunk_count,
        })
    }

    /// Answer `question` from the retrieved context.
    ///
    /// When a score threshold is configured and no chunk reaches it, the
    /// fallback answer is returned with no sources and the generator is not
    /// called.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::EmptyQuestion`] for a blank question,
    /// [`PipelineError::NotIndexed`] before a successful build, and
    /// [`PipelineError::Query`] if embedding, retrieval or generation fails.
    pub async fn ask(&self, question: &str) -> Result<Answer, PipelineError> {
        let question = question.trim();
        if question.is_empty() {
            return Err(PipelineError::EmptyQuestion);
        }
        let indexed = self
            .state
            .read()
            .await
            .clone()
            .ok_or(PipelineError::NotIndexed)?;

        let query = self.embedder.embed(question).await.map_err(|e| {
            tracing::error!("question embedding failed: {e}");
            PipelineError::Query(format!("embedding failed: {e}"))
        })?;
        let hits = indexed
            .retriever
            .retrieve(&indexed.index, &query)
            .map_err(|e| PipelineError::Query(e.to_string()))?;

        if hits.is_empty() {
            tracing::info!("no chunk passed the score threshold");
            return Ok(Answer {
                text: prompt::FALLBACK_ANSWER.to_owned(),
                sources: Vec::new(),
            });
        }

        let context = prompt::build_context(hits.iter().map(|h| &h.chunk));
        let messages = [Message::user(prompt::render(&context, question))];
        let text = self.generator.chat(&messages).await.map_err(|e| {
            tracing::error!("generation failed: {e}");
            PipelineError::Query(format!("generation failed: {e}"))
        })?;

        tracing::info!(sources = hits.len(), "answered question");
        Ok(Answer {
            text: text.trim().to_owned(),
            sources: hits.into_iter().map(|h| h.chunk).collect(),
        })
    }

    /// Drop the indexed state.
    pub async fn reset(&self) {
        *self.state.write().await = None;
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::NotIndexed`] if no index is installed.
    pub async fn snapshot(&self) -> Result<IndexSnapshot, PipelineError> {
        let indexed = self
            .state
            .read()
            .await
            .clone()
            .ok_or(PipelineError::NotIndexed)?;
        Ok(indexed.index.to_snapshot(&self.embedding_model()))
    }

    /// Install a previously built index without re-embedding.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Snapshot`] if the snapshot was made with a
    /// different embedding model, is empty, or has inconsistent vectors.
    pub async fn restore_index(&self, snapshot: IndexSnapshot) -> Result<BuildReport, PipelineError> {
        let expected = self.embedding_model();
        if snapshot.embedding_model != expected {
            return Err(PipelineError::Snapshot(format!(
                "built with embedding model {}, pipeline uses {expected}",
                snapshot.embedding_model
            )));
        }
        if snapshot.entries.is_empty() {
            return Err(PipelineError::Snapshot("snapshot has no entries".into()));
        }
        let index =
            VectorIndex::from_snapshot(snapshot).map_err(|e| PipelineError::Snapshot(e.to_string()))?;
        let chunks = index.len();
        self.install(index).await;
        tracing::info!(chunks, "restored index from snapshot");
        Ok(BuildReport { chunks })
    }

    async fn install(&self, index: VectorIndex) {
        let indexed = Arc::new(Indexed {
            index,
            retriever: Retriever {
                top_k: self.options.top_k,
                score_threshold: self.options.score_threshold,
            },
        });
        *self.state.write().await = Some(indexed);
    }
}
