use std::fmt;
use std::path::Path;

use super::splitter::SplitStrategy;

/// Input format, chosen by exact (case-sensitive) file extension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DocumentFormat {
    Text,
    Json,
    Csv,
    Pdf,
    Markdown,
    Python,
    Email,
    /// Anything else; carries the extension (empty when the path has none).
    Unsupported(String),
}

impl DocumentFormat {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        Self::from_extension(ext)
    }

    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext {
            "txt" => Self::Text,
            "json" => Self::Json,
            "csv" => Self::Csv,
            "pdf" => Self::Pdf,
            "md" => Self::Markdown,
            "py" => Self::Python,
            "eml" => Self::Email,
            other => Self::Unsupported(other.to_owned()),
        }
    }

    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Text | Self::Unsupported(_) => "text/plain",
            Self::Json => "application/json",
            Self::Csv => "text/csv",
            Self::Pdf => "application/pdf",
            Self::Markdown => "text/markdown",
            Self::Python => "text/x-python",
            Self::Email => "message/rfc822",
        }
    }

    /// Chunking strategy for documents of this format. Formats without a dedicated
    /// splitter fall back to token windows.
    #[must_use]
    pub fn split_strategy(&self) -> SplitStrategy {
        match self {
            Self::Text | Self::Pdf => SplitStrategy::Recursive,
            Self::Markdown => SplitStrategy::MarkdownHeader,
            Self::Python => SplitStrategy::Code,
            Self::Json | Self::Csv | Self::Email | Self::Unsupported(_) => SplitStrategy::Token,
        }
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => f.write_str("txt"),
            Self::Json => f.write_str("json"),
            Self::Csv => f.write_str("csv"),
            Self::Pdf => f.write_str("pdf"),
            Self::Markdown => f.write_str("md"),
            Self::Python => f.write_str("py"),
            Self::Email => f.write_str("eml"),
            Self::Unsupported(ext) if ext.is_empty() => f.write_str("<no extension>"),
            Self::Unsupported(ext) => write!(f, ".{ext}"),
        }
    }
}
