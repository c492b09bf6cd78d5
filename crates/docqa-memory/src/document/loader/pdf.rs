use std::collections::HashMap;
use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata,
};
use super::file_name;

/// Extracts one document per page that has any non-whitespace text.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let path = tokio::fs::canonicalize(&path).await?;

            let meta = tokio::fs::metadata(&path).await?;
            if meta.len() > max_size {
                return Err(DocumentError::FileTooLarge(meta.len()));
            }

            let path_buf = path.clone();
            let pages = tokio::task::spawn_blocking(move || extract_pages(&path_buf))
                .await
                .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            let documents = pages_to_documents(&path, pages);
            if documents.is_empty() {
                return Err(DocumentError::NoText(path.display().to_string()));
            }
            Ok(documents)
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

fn extract_pages(path: &Path) -> Result<Vec<String>, DocumentError> {
    pdf_extract::extract_text_by_pages(path).map_err(|e| DocumentError::Pdf(e.to_string()))
}

fn pages_to_documents(path: &Path, pages: Vec<String>) -> Vec<Document> {
    let source = path.display().to_string();
    let source_file = file_name(path);

    pages
        .into_iter()
        .enumerate()
        .filter(|(_, text)| !text.trim().is_empty())
        .map(|(i, content)| Document {
            content,
            metadata: DocumentMetadata {
                source: source.clone(),
                source_file: source_file.clone(),
                page: i + 1,
                content_type: "application/pdf".to_owned(),
                extra: HashMap::new(),
            },
        })
        .collect()
}
