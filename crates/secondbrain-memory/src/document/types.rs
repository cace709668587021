use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentMetadata {
    pub source: String,
    pub content_type: String,
    /// Per-format details such as `page`, `row`, `subject`.
    pub extra: HashMap<String, String>,
}

impl DocumentMetadata {
    #[must_use]
    pub fn new(source: impl Into<String>, content_type: &str) -> Self {
        Self {
            source: source.into(),
            content_type: content_type.to_owned(),
            extra: HashMap::new(),
        }
    }

    #[must_use]
    pub fn with_extra(mut self, key: &str, value: impl ToString) -> Self {
        self.extra.insert(key.to_owned(), value.to_string());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    pub content: String,
    pub metadata: DocumentMetadata,
}

/// Contiguous slice of one [`Document`]: `content == document.content[offset..offset + content.len()]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    pub content: String,
    pub metadata: DocumentMetadata,
    pub chunk_index: usize,
    /// Byte offset of `content` within the source document.
    pub offset: usize,
}
