use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentFormat, DocumentLoader,
    DocumentMetadata,
};
use super::read_bounded;

/// One document per element of the top-level `documents` array, taken from each element's
/// `content` string.
pub struct JsonLoader {
    pub max_file_size: u64,
}

impl Default for JsonLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn parse_documents(bytes: &[u8], source: &str) -> Result<Vec<Document>, DocumentError> {
    let value: serde_json::Value =
        serde_json::from_slice(bytes).map_err(|e| DocumentError::parse("json", e))?;
    let items = value
        .get("documents")
        .and_then(serde_json::Value::as_array)
        .ok_or_else(|| DocumentError::parse("json", "missing `documents` array"))?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let content = item
                .get("content")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| {
                    DocumentError::parse("json", format!("documents[{i}] has no string `content`"))
                })?;
            Ok(Document {
                content: content.to_owned(),
                metadata: DocumentMetadata::new(source, DocumentFormat::Json.content_type())
                    .with_extra("index", i),
            })
        })
        .collect()
}

impl DocumentLoader for JsonLoader {
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
            parse_documents(&bytes, &source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_each_content() {
        let json = br#"{"documents": [{"content": "alpha", "id": 1}, {"content": "beta"}]}"#;
        let docs = parse_documents(json, "s").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "alpha");
        assert_eq!(docs[1].content, "beta");
        assert_eq!(docs[1].metadata.extra["index"], "1");
        assert_eq!(docs[0].metadata.content_type, "application/json");
    }

    #[test]
    fn empty_array_yields_nothing() {
        let docs = parse_documents(br#"{"documents": []}"#, "s").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn malformed_json_is_parse_error() {
        let err = parse_documents(b"{not json", "s").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { format: "json", .. }));
    }

    #[test]
    fn missing_documents_array_is_parse_error() {
        let err = parse_documents(br#"{"items": []}"#, "s").unwrap_err();
        assert!(err.to_string().contains("documents"));
    }

    #[test]
    fn non_string_content_is_parse_error() {
        let err = parse_documents(br#"{"documents": [{"content": 5}]}"#, "s").unwrap_err();
        assert!(err.to_string().contains("documents[0]"));
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("kb.json");
        std::fs::write(&file, r#"{"documents": [{"content": "hello"}]}"#).unwrap();

        let docs = JsonLoader::default().load(&file).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "hello");
    }
}
