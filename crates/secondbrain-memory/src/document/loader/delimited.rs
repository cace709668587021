use std::path::Path;
use std::pin::Pin;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentFormat, DocumentLoader,
    DocumentMetadata,
};
use super::read_bounded;

/// One document per data row, rendered as `header: value` lines.
pub struct CsvLoader {
    pub max_file_size: u64,
}

impl Default for CsvLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn parse_rows(bytes: &[u8], source: &str) -> Result<Vec<Document>, DocumentError> {
    let mut reader = csv::Reader::from_reader(bytes);
    let headers = reader
        .headers()
        .map_err(|e| DocumentError::parse("csv", e))?
        .clone();

    let mut documents = Vec::new();
    for (row, record) in reader.records().enumerate() {
        let record = record.map_err(|e| DocumentError::parse("csv", e))?;
        let content = headers
            .iter()
            .zip(record.iter())
            .map(|(header, value)| format!("{header}: {value}"))
            .collect::<Vec<_>>()
            .join("\n");
        documents.push(Document {
            content,
            metadata: DocumentMetadata::new(source, DocumentFormat::Csv.content_type())
                .with_extra("row", row),
        });
    }
    Ok(documents)
}

impl DocumentLoader for CsvLoader {
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
            parse_rows(&bytes, &source)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_become_header_value_lines() {
        let data = b"name,role\nAda,engineer\nGrace,admiral\n";
        let docs = parse_rows(data, "people.csv").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].content, "name: Ada\nrole: engineer");
        assert_eq!(docs[1].metadata.extra["row"], "1");
        assert_eq!(docs[1].metadata.content_type, "text/csv");
    }

    #[test]
    fn header_only_yields_nothing() {
        let docs = parse_rows(b"a,b\n", "s").unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn ragged_row_is_parse_error() {
        let err = parse_rows(b"a,b\n1,2,3\n", "s").unwrap_err();
        assert!(matches!(err, DocumentError::Parse { format: "csv", .. }));
    }

    #[test]
    fn quoted_fields_keep_commas() {
        let docs = parse_rows(b"title,body\n\"Hi, there\",\"x\"\n", "s").unwrap();
        assert_eq!(docs[0].content, "title: Hi, there\nbody: x");
    }
}
