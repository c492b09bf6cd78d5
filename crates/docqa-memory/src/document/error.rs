#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("file too large: {0} bytes")]
    FileTooLarge(u64),

    #[cfg(feature = "pdf")]
    #[error("PDF error: {0}")]
    Pdf(String),

    #[error("no extractable text in {0}")]
    NoText(String),

    #[error("failed to load {path}: {source}")]
    File {
        path: String,
        #[source]
        source: Box<DocumentError>,
    },

    #[error("invalid splitter config: {0}")]
    InvalidConfig(String),
}
