use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentFormat, DocumentLoader,
    DocumentMetadata,
};
use super::read_bounded;

/// One document per PDF page, numbered from 1 in `extra.page`.
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
            let (source, bytes) = read_bounded(&path, max_size).await?;
            if bytes.is_empty() {
                return Ok(Vec::new());
            }

            let pages = tokio::task::spawn_blocking(move || {
                pdf_extract::extract_text_from_mem_by_pages(&bytes)
                    .map_err(|e| DocumentError::parse("pdf", e))
            })
            .await
            .map_err(|e| DocumentError::Io(std::io::Error::other(e)))??;

            Ok(pages
                .into_iter()
                .enumerate()
                .map(|(i, content)| Document {
                    content,
                    metadata: DocumentMetadata::new(&source, DocumentFormat::Pdf.content_type())
                        .with_extra("page", i + 1),
                })
                .collect())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn garbage_pdf_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("broken.pdf");
        std::fs::write(&file, b"this is not a pdf").unwrap();

        let result = PdfLoader::default().load(&file).await;
        assert!(matches!(result, Err(DocumentError::Parse { format: "pdf", .. })));
    }

    #[tokio::test]
    async fn empty_pdf_file_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("empty.pdf");
        std::fs::write(&file, b"").unwrap();

        let docs = PdfLoader::default().load(&file).await.unwrap();
        assert!(docs.is_empty());
    }
}
