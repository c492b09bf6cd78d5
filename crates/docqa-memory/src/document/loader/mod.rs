use std::future::Future;
use std::path::Path;
use std::pin::Pin;

use super::{Document, DocumentError};

#[cfg(feature = "pdf")]
mod pdf;
mod text;

#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>;

    fn supported_extensions(&self) -> &[&str];
}

fn loaders() -> Vec<Box<dyn DocumentLoader>> {
    vec![
        #[cfg(feature = "pdf")]
        Box::new(PdfLoader::default()),
        Box::new(TextLoader::default()),
    ]
}

/// Load every file with the loader registered for its extension.
///
/// Documents come back in input order. Loading stops at the first file that
/// fails; the error names that file.
///
/// # Errors
///
/// Returns [`DocumentError::File`] wrapping the underlying failure, including
/// unsupported extensions.
pub async fn load_documents<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<Document>, DocumentError> {
    let loaders = loaders();
    let mut documents = Vec::new();

    for path in paths {
        let path = path.as_ref();
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        let wrap = |source: DocumentError| DocumentError::File {
            path: path.display().to_string(),
            source: Box::new(source),
        };

        let loader = loaders
            .iter()
            .find(|l| l.supported_extensions().contains(&ext.as_str()))
            .ok_or_else(|| wrap(DocumentError::UnsupportedFormat(ext.clone())))?;

        let loaded = loader.load(path).await.map_err(wrap)?;
        tracing::debug!(path = %path.display(), pages = loaded.len(), "loaded document");
        documents.extend(loaded);
    }

    Ok(documents)
}

pub(crate) fn file_name(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}
