use std::path::Path;
use std::pin::Pin;

use mail_parser::MessageParser;

use super::super::{
    DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentFormat, DocumentLoader,
    DocumentMetadata,
};
use super::read_bounded;

/// RFC 822 message loader: one document per text body part.
pub struct EmailLoader {
    pub max_file_size: u64,
}

impl Default for EmailLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

fn parse_message(bytes: &[u8], source: &str) -> Result<Vec<Document>, DocumentError> {
    let message = MessageParser::default()
        .parse(bytes)
        .ok_or_else(|| DocumentError::parse("email", "not an RFC 822 message"))?;

    let mut base = DocumentMetadata::new(source, DocumentFormat::Email.content_type());
    if let Some(subject) = message.subject() {
        base = base.with_extra("subject", subject);
    }
    if let Some(from) = message
        .from()
        .and_then(|addrs| addrs.first())
        .and_then(|addr| addr.address())
    {
        base = base.with_extra("from", from);
    }

    let documents = (0..message.text_body_count())
        .filter_map(|i| message.body_text(i))
        .filter(|text| !text.trim().is_empty())
        .enumerate()
        .map(|(part, text)| Document {
            content: text.into_owned(),
            metadata: base.clone().with_extra("part", part),
        })
        .collect();
    Ok(documents)
}

impl DocumentLoader for EmailLoader {
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
            parse_message(&bytes, &source)
        })
    }
}
