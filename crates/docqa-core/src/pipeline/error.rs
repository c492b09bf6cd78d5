/// Failure category, for callers that report errors by class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineErrorKind {
    /// No text could be obtained from the input files.
    Extraction,
    IndexBuild,
    Query,
    /// The call was made in a state or with input that cannot succeed.
    Precondition,
}

impl PipelineErrorKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Extraction => "extraction",
            Self::IndexBuild => "index_build",
            Self::Query => "query",
            Self::Precondition => "precondition",
        }
    }
}

impl std::fmt::Display for PipelineErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("no index has been built yet; build the index first")]
    NotIndexed,

    #[error("question is empty")]
    EmptyQuestion,

    #[error("index build failed: {0}")]
    IndexBuild(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("index snapshot rejected: {0}")]
    Snapshot(String),
}

impl PipelineError {
    #[must_use]
    pub fn kind(&self) -> PipelineErrorKind {
        match self {
            Self::NotIndexed | Self::EmptyQuestion => PipelineErrorKind::Precondition,
            Self::IndexBuild(_) | Self::Snapshot(_) => PipelineErrorKind::IndexBuild,
            Self::Query(_) => PipelineErrorKind::Query,
        }
    }
}
