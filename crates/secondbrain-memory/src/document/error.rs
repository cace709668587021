use secondbrain_llm::LlmError;

use crate::index::IndexError;

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("failed to parse {format} document: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },

    #[error("file too large: {size} bytes (limit {limit})")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("embedding failed: {0}")]
    Embedding(#[from] LlmError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),
}

impl DocumentError {
    pub(crate) fn parse(format: &'static str, message: impl ToString) -> Self {
        Self::Parse {
            format,
            message: message.to_string(),
        }
    }
}
