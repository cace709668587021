mod delimited;
mod email;
mod json;
#[cfg(feature = "pdf")]
mod pdf;
mod text;

pub use delimited::CsvLoader;
pub use email::EmailLoader;
pub use json::JsonLoader;
#[cfg(feature = "pdf")]
pub use pdf::PdfLoader;
pub use text::TextLoader;

use std::path::Path;

use super::DocumentError;

/// Canonicalize `path`, enforce the size limit, and read the whole file.
/// Returns the canonical path string used as `source` metadata.
pub(crate) async fn read_bounded(
    path: &Path,
    max_file_size: u64,
) -> Result<(String, Vec<u8>), DocumentError> {
    let path = tokio::fs::canonicalize(path).await?;
    let meta = tokio::fs::metadata(&path).await?;
    if meta.len() > max_file_size {
        return Err(DocumentError::FileTooLarge {
            size: meta.len(),
            limit: max_file_size,
        });
    }
    let bytes = tokio::fs::read(&path).await?;
    Ok((path.display().to_string(), bytes))
}
