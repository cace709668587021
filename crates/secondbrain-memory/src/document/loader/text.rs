use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentFormat, DocumentLoader,
    DocumentMetadata,
};
use super::read_bounded;

/// Whole-file loader for plain text, Markdown and Python sources.
pub struct TextLoader {
    pub max_file_size: u64,
}

impl Default for TextLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for TextLoader {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>
    {
        let path = path.to_path_buf();
        let max_size = self.max_file_size;
        Box::pin(async move {
            let format = DocumentFormat::from_path(&path);
            let (source, bytes) = read_bounded(&path, max_size).await?;
            if bytes.is_empty() {
                return Ok(Vec::new());
            }

            let content =
                String::from_utf8(bytes).map_err(|e| DocumentError::parse("text", e))?;

            Ok(vec![Document {
                content,
                metadata: DocumentMetadata::new(source, format.content_type()),
            }])
        })
    }
}
