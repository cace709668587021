pub mod error;
pub mod format;
pub mod loader;
pub mod pipeline;
pub mod splitter;
pub mod types;

use std::future::Future;
use std::path::Path;
use std::pin::Pin;

pub use error::DocumentError;
pub use format::DocumentFormat;
pub use loader::{CsvLoader, EmailLoader, JsonLoader, TextLoader};
pub use pipeline::IngestionPipeline;
pub use splitter::{SplitStrategy, SplitterConfig, TextSplitter};
pub use types::{Chunk, Document, DocumentMetadata};

#[cfg(feature = "pdf")]
pub use loader::PdfLoader;

/// Default maximum file size: 50 MiB.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub trait DocumentLoader: Send + Sync {
    fn load(
        &self,
        path: &Path,
    ) -> Pin<Box<dyn Future<Output = Result<Vec<Document>, DocumentError>> + Send + '_>>;
}

/// Loader for `format`, or `UnsupportedFormat` when no loader handles it.
///
/// # Errors
///
/// Returns `DocumentError::UnsupportedFormat` for unrecognized extensions, and for `.pdf`
/// when built without the `pdf` feature.
pub fn loader_for(
    format: &DocumentFormat,
    max_file_size: u64,
) -> Result<Box<dyn DocumentLoader>, DocumentError> {
    let loader: Box<dyn DocumentLoader> = match format {
        DocumentFormat::Text | DocumentFormat::Markdown | DocumentFormat::Python => {
            Box::new(TextLoader { max_file_size })
        }
        DocumentFormat::Json => Box::new(JsonLoader { max_file_size }),
        DocumentFormat::Csv => Box::new(CsvLoader { max_file_size }),
        DocumentFormat::Email => Box::new(EmailLoader { max_file_size }),
        #[cfg(feature = "pdf")]
        DocumentFormat::Pdf => Box::new(PdfLoader { max_file_size }),
        #[cfg(not(feature = "pdf"))]
        DocumentFormat::Pdf => {
            return Err(DocumentError::UnsupportedFormat(
                "pdf (built without the `pdf` feature)".into(),
            ));
        }
        DocumentFormat::Unsupported(_) => {
            return Err(DocumentError::UnsupportedFormat(format.to_string()));
        }
    };
    Ok(loader)
}

/// Load `path` with the loader its extension selects.
///
/// # Errors
///
/// Returns `UnsupportedFormat` before touching the filesystem for unknown extensions, and
/// the loader's `Io`, `FileTooLarge` or `Parse` errors otherwise.
pub async fn load_documents(
    path: &Path,
    max_file_size: u64,
) -> Result<(DocumentFormat, Vec<Document>), DocumentError> {
    let format = DocumentFormat::from_path(path);
    let loader = loader_for(&format, max_file_size)?;
    let documents = loader.load(path).await?;
    tracing::debug!(path = %path.display(), %format, documents = documents.len(), "loaded");
    Ok((format, documents))
}
