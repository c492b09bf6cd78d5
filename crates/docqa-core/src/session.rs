//! One user's working set: the ingested files, their tag and the pipeline
//! built over them.

use std::path::{Path, PathBuf};

use docqa_llm::LlmProvider;
use docqa_memory::document::{Document, DocumentError, load_documents};
use docqa_memory::{DocumentCache, IndexSnapshot, MemoryError, fingerprint};

use crate::config::Config;
use crate::pipeline::{Answer, BuildReport, Pipeline, PipelineError, PipelineErrorKind};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("no files given")]
    NoFiles,

    #[error("failed to fingerprint input files: {0}")]
    Fingerprint(#[source] MemoryError),

    #[error(transparent)]
    Load(#[from] DocumentError),

    #[error("no text extracted from the given files")]
    NoText,

    #[error("failed to read index snapshot: {0}")]
    Snapshot(#[source] MemoryError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),
}

impl SessionError {
    #[must_use]
    pub fn kind(&self) -> PipelineErrorKind {
        match self {
            Self::NoFiles => PipelineErrorKind::Precondition,
            Self::Fingerprint(_) | Self::Load(_) | Self::NoText => PipelineErrorKind::Extraction,
            Self::Snapshot(_) => PipelineErrorKind::IndexBuild,
            Self::Pipeline(e) => e.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestReport {
    pub tag: String,
    pub documents: usize,
    pub chunks: usize,
    pub from_cache: bool,
}

#[derive(Debug)]
struct Loaded {
    tag: String,
    documents: Vec<Document>,
}

#[derive(Debug)]
pub struct Session<E, G> {
    pipeline: Pipeline<E, G>,
    cache: DocumentCache,
    index_dir: PathBuf,
    loaded: Option<Loaded>,
}

impl<E: LlmProvider, G: LlmProvider> Session<E, G> {
    #[must_use]
    pub fn new(config: &Config, pipeline: Pipeline<E, G>) -> Self {
        Self {
            pipeline,
            cache: DocumentCache::new(&config.storage.cache_dir),
            index_dir: config.storage.index_dir.clone(),
            loaded: None,
        }
    }

    #[must_use]
    pub fn pipeline(&self) -> &Pipeline<E, G> {
        &self.pipeline
    }

    /// Tag of the current working set.
    #[must_use]
    pub fn tag(&self) -> Option<&str> {
        self.loaded.as_ref().map(|l| l.tag.as_str())
    }

    #[must_use]
    pub fn documents(&self) -> &[Document] {
        self.loaded
            .as_ref()
            .map(|l| l.documents.as_slice())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn snapshot_path(&self, tag: &str) -> PathBuf {
        self.index_dir.join(format!("{tag}.index.json"))
    }

    /// Fingerprint `paths`, reuse cached documents when available, and build
    /// the index over them.
    ///
    /// # Errors
    ///
    /// Fails if the files cannot be hashed or loaded, yield no text, or the
    /// index build fails. On failure the previous working set stays active.
    pub async fn ingest<P: AsRef<Path>>(&mut self, paths: &[P]) -> Result<IngestReport, SessionError> {
        if paths.is_empty() {
            return Err(SessionError::NoFiles);
        }
        let owned: Vec<PathBuf> = paths.iter().map(|p| p.as_ref().to_path_buf()).collect();
        let tag = tokio::task::spawn_blocking(move || fingerprint(&owned))
            .await
            .map_err(|e| SessionError::Fingerprint(MemoryError::Other(e.to_string())))?
            .map_err(SessionError::Fingerprint)?;

        let cached = match self.cache.get(&tag).await {
            Ok(Some(docs)) if !docs.is_empty() => Some(docs),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(tag, "ignoring unreadable cache entry: {e}");
                None
            }
        };
        let from_cache = cached.is_some();
        let documents = match cached {
            Some(docs) => {
                tracing::info!(tag, documents = docs.len(), "loaded cached documents");
                docs
            }
            None => self.load_and_cache(&tag, paths).await?,
        };

        let report = self.pipeline.build_index(&documents).await?;
        self.persist_snapshot(&tag).await;

        let ingest = IngestReport {
            tag: tag.clone(),
            documents: documents.len(),
            chunks: report.chunks,
            from_cache,
        };
        self.loaded = Some(Loaded { tag, documents });
        Ok(ingest)
    }

    /// Restore the index persisted for `tag` without re-embedding.
    ///
    /// # Errors
    ///
    /// Fails if no readable snapshot exists for `tag` or the pipeline refuses
    /// it.
    pub async fn open(&mut self, tag: &str) -> Result<BuildReport, SessionError> {
        let snapshot = IndexSnapshot::load(&self.snapshot_path(tag))
            .await
            .map_err(SessionError::Snapshot)?;
        let report = self.pipeline.restore_index(snapshot).await?;

        let documents = match self.cache.get(tag).await {
            Ok(docs) => docs.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(tag, "ignoring unreadable cache entry: {e}");
                Vec::new()
            }
        };
        self.loaded = Some(Loaded {
            tag: tag.to_owned(),
            documents,
        });
        Ok(report)
    }

    /// # Errors
    ///
    /// See [`Pipeline::ask`].
    pub async fn ask(&self, question: &str) -> Result<Answer, PipelineError> {
        self.pipeline.ask(question).await
    }

    /// Forget the working set and drop the index.
    pub async fn clear(&mut self) {
        self.loaded = None;
        self.pipeline.reset().await;
        tracing::info!("session cleared");
    }

    async fn load_and_cache<P: AsRef<Path>>(
        &self,
        tag: &str,
        paths: &[P],
    ) -> Result<Vec<Document>, SessionError> {
        let documents = load_documents(paths).await?;
        if documents.is_empty() {
            return Err(SessionError::NoText);
        }
        if let Err(e) = self.cache.put(tag, &documents).await {
            tracing::warn!(tag, "failed to cache parsed documents: {e}");
        } else {
            tracing::info!(tag, documents = documents.len(), "parsed and cached documents");
        }
        Ok(documents)
    }

    async fn persist_snapshot(&self, tag: &str) {
        let snapshot = match self.pipeline.snapshot().await {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(tag, "cannot snapshot index: {e}");
                return;
            }
        };
        let path = self.snapshot_path(tag);
        if let Err(e) = snapshot.save(&path).await {
            tracing::warn!(tag, "failed to persist index snapshot: {e}");
        } else {
            tracing::debug!(tag, path = %path.display(), "persisted index snapshot");
        }
    }
}
