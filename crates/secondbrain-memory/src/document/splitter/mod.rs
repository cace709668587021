mod code;
mod markdown;
mod recursive;
mod token;

use std::ops::Range;

use serde::{Deserialize, Serialize};

use super::error::DocumentError;
use super::format::DocumentFormat;
use super::types::{Chunk, Document};
use recursive::Separator;
use token::TokenCounter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    /// Character budget, breaking at paragraph, line, sentence, then word boundaries.
    Recursive,
    /// Heading-delimited sections merged up to the budget.
    MarkdownHeader,
    /// Top-level Python syntax units merged up to the budget.
    Code,
    /// Windows of cl100k BPE tokens.
    Token,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SplitterConfig {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

impl SplitterConfig {
    /// # Errors
    ///
    /// Returns `DocumentError::Configuration` unless `0 <= chunk_overlap < chunk_size`.
    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.chunk_size == 0 {
            return Err(DocumentError::Configuration(
                "chunk_size must be greater than zero".into(),
            ));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(DocumentError::Configuration(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct TextSplitter {
    config: SplitterConfig,
    tokens: TokenCounter,
}

impl TextSplitter {
    /// # Errors
    ///
    /// Returns `DocumentError::Configuration` if the config is invalid or the token
    /// encoder cannot be loaded.
    pub fn new(config: SplitterConfig) -> Result<Self, DocumentError> {
        config.validate()?;
        Ok(Self {
            config,
            tokens: TokenCounter::cl100k()?,
        })
    }

    #[must_use]
    pub fn config(&self) -> &SplitterConfig {
        &self.config
    }

    /// Split one document. Empty documents yield nothing; a document of at most
    /// `chunk_size` chars yields a single chunk equal to the whole document.
    #[must_use]
    pub fn split(&self, document: &Document, strategy: SplitStrategy) -> Vec<Chunk> {
        let text = document.content.as_str();
        if text.is_empty() {
            return Vec::new();
        }
        let SplitterConfig {
            chunk_size: size,
            chunk_overlap: overlap,
        } = self.config;

        let spans = if text.chars().count() <= size {
            vec![0..text.len()]
        } else {
            match strategy {
                SplitStrategy::Recursive => {
                    recursive::split_spans(text, size, overlap, recursive::TEXT_SEPARATORS)
                }
                SplitStrategy::MarkdownHeader => markdown::split_spans(text, size, overlap),
                SplitStrategy::Code => code::split_spans(text, size, overlap),
                SplitStrategy::Token => token::split_spans(self.tokens, text, size, overlap),
            }
        };

        spans
            .into_iter()
            .filter(|span| !span.is_empty())
            .enumerate()
            .map(|(i, span)| Chunk {
                content: text[span.clone()].to_owned(),
                metadata: document.metadata.clone(),
                chunk_index: i,
                offset: span.start,
            })
            .collect()
    }

    /// Split every document with the strategy `format` maps to, preserving document order.
    #[must_use]
    pub fn split_documents(&self, documents: &[Document], format: &DocumentFormat) -> Vec<Chunk> {
        let strategy = format.split_strategy();
        documents
            .iter()
            .flat_map(|doc| self.split(doc, strategy))
            .collect()
    }
}

/// Greedily merge contiguous `units` while their total stays within `size` chars. Units
/// larger than `size` are split on their own with `fallback` separators.
fn merge_units(
    text: &str,
    units: impl Iterator<Item = Range<usize>>,
    size: usize,
    overlap: usize,
    fallback: &[&[Separator]],
) -> Vec<Range<usize>> {
    let mut spans = Vec::new();
    let mut current: Option<Range<usize>> = None;
    let mut current_chars = 0;

    for unit in units.filter(|u| !u.is_empty()) {
        let len = text[unit.clone()].chars().count();
        if len > size {
            if let Some(done) = current.take() {
                spans.push(done);
            }
            current_chars = 0;
            let base = unit.start;
            spans.extend(
                recursive::split_spans(&text[unit], size, overlap, fallback)
                    .into_iter()
                    .map(|r| r.start + base..r.end + base),
            );
            continue;
        }
        if let Some(open) = current.as_mut()
            && current_chars + len <= size
        {
            open.end = unit.end;
            current_chars += len;
            continue;
        }
        if let Some(done) = current.replace(unit) {
            spans.push(done);
        }
        current_chars = len;
    }

    if let Some(done) = current {
        spans.push(done);
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::types::DocumentMetadata;

    fn make_doc(content: &str) -> Document {
        Document {
            content: content.to_owned(),
            metadata: DocumentMetadata::new("test", "text/plain"),
        }
    }

    fn splitter(chunk_size: usize, chunk_overlap: usize) -> TextSplitter {
        TextSplitter::new(SplitterConfig {
            chunk_size,
            chunk_overlap,
        })
        .unwrap()
    }

    const ALL: [SplitStrategy; 4] = [
        SplitStrategy::Recursive,
        SplitStrategy::MarkdownHeader,
        SplitStrategy::Code,
        SplitStrategy::Token,
    ];

    #[test]
    fn overlap_must_be_smaller_than_size() {
        let err = TextSplitter::new(SplitterConfig {
            chunk_size: 10,
            chunk_overlap: 10,
        })
        .unwrap_err();
        assert!(matches!(err, DocumentError::Configuration(_)));
        assert!(
            TextSplitter::new(SplitterConfig {
                chunk_size: 0,
                chunk_overlap: 0,
            })
            .is_err()
        );
    }

    #[test]
    fn empty_document() {
        for strategy in ALL {
            assert!(splitter(10, 2).split(&make_doc(""), strategy).is_empty());
        }
    }

    #[test]
    fn short_document_is_single_chunk() {
        for strategy in ALL {
            let chunks = splitter(1000, 200).split(&make_doc("Short text."), strategy);
            assert_eq!(chunks.len(), 1);
            assert_eq!(chunks[0].content, "Short text.");
            assert_eq!(chunks[0].offset, 0);
            assert_eq!(chunks[0].chunk_index, 0);
        }
    }

    #[test]
    fn metadata_preserved() {
        let doc = make_doc(&"Some content. ".repeat(20));
        let chunks = splitter(50, 10).split(&doc, SplitStrategy::Recursive);
        assert!(chunks.len() > 1);
        assert!(chunks.iter().all(|c| c.metadata == doc.metadata));
    }

    #[test]
    fn split_documents_keeps_document_order() {
        let docs = vec![make_doc("first"), make_doc("second")];
        let chunks = splitter(100, 10).split_documents(&docs, &DocumentFormat::Text);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "first");
        assert_eq!(chunks[1].content, "second");
        assert!(chunks.iter().all(|c| c.chunk_index == 0));
    }

    #[test]
    fn default_config_keeps_200_chars_of_overlap_on_prose() {
        let text: String = (0..400)
            .map(|i| format!("Sentence number {i} talks about the weather in town. "))
            .collect();
        let doc = make_doc(&text);
        let chunks = TextSplitter::new(SplitterConfig::default())
            .unwrap()
            .split(&doc, SplitStrategy::Recursive);

        assert!(chunks.len() > 10);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 1000);
        }
        for pair in chunks.windows(2) {
            let prev_end = pair[0].offset + pair[0].content.len();
            let shared = text[pair[1].offset..prev_end].chars().count();
            assert!(shared >= 200, "shared {shared}");
        }
    }

    #[test]
    fn token_strategy_counts_subword_tokens() {
        // one word-boundary segment of several hundred tokens
        let identifier: String = (0..60).map(|i| format!("zqx{i}vbkw")).collect();
        let doc = make_doc(&identifier);
        let chunks = splitter(100, 10).split(&doc, SplitStrategy::Token);
        assert!(chunks.len() > 1, "{} chunks", chunks.len());
        let rebuilt: String = chunks.iter().map(|c| c.content.as_str()).collect();
        assert!(rebuilt.len() > identifier.len());
        let last = chunks.last().unwrap();
        assert_eq!(last.offset + last.content.len(), identifier.len());
    }

    #[test]
    fn merge_units_flushes_before_oversize_unit() {
        let text = "aa bb cc dd ee ff gg hh ii";
        let units = vec![0..3, 3..24, 24..text.len()];
        let spans = merge_units(text, units.into_iter(), 8, 2, recursive::TEXT_SEPARATORS);
        assert_eq!(spans.first(), Some(&(0..3)));
        assert_eq!(spans.last().map(|r| r.end), Some(text.len()));
    }

    mod proptest_splitter {
        use super::*;
        use proptest::prelude::*;

        fn strategy_strategy() -> impl Strategy<Value = SplitStrategy> {
            prop_oneof![
                Just(SplitStrategy::Recursive),
                Just(SplitStrategy::MarkdownHeader),
                Just(SplitStrategy::Code),
                Just(SplitStrategy::Token),
            ]
        }

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(300))]

            #[test]
            fn chunks_are_contiguous_substrings(
                content in "[a-zé#\\n .!?]{0,1500}",
                chunk_size in 2usize..300,
                overlap_pct in 0usize..90,
                strategy in strategy_strategy(),
            ) {
                let overlap = chunk_size * overlap_pct / 100;
                let doc = make_doc(&content);
                let chunks = splitter(chunk_size, overlap).split(&doc, strategy);

                prop_assert_eq!(content.is_empty(), chunks.is_empty());
                let mut last_offset = 0;
                for (i, chunk) in chunks.iter().enumerate() {
                    prop_assert_eq!(chunk.chunk_index, i);
                    prop_assert!(!chunk.content.is_empty());
                    prop_assert!(chunk.offset >= last_offset);
                    let end = chunk.offset + chunk.content.len();
                    prop_assert_eq!(&content[chunk.offset..end], chunk.content.as_str());
                    last_offset = chunk.offset;
                }
                if let Some(last) = chunks.last() {
                    prop_assert_eq!(last.offset + last.content.len(), content.len());
                }
            }

            #[test]
            fn recursive_chunks_respect_size_and_overlap(
                content in "[a-z\\n .]{1,2000}",
                chunk_size in 2usize..400,
                overlap_pct in 0usize..90,
            ) {
                let overlap = chunk_size * overlap_pct / 100;
                let doc = make_doc(&content);
                let chunks = splitter(chunk_size, overlap).split(&doc, SplitStrategy::Recursive);

                for chunk in &chunks {
                    prop_assert!(chunk.content.chars().count() <= chunk_size);
                }
                for pair in chunks.windows(2) {
                    let prev_end = pair[0].offset + pair[0].content.len();
                    prop_assert!(prev_end >= pair[1].offset);
                    let shared = content[pair[1].offset..prev_end].chars().count();
                    prop_assert!(shared >= overlap, "shared {} < overlap {}", shared, overlap);
                }
            }

            #[test]
            fn short_documents_are_one_chunk(
                content in "\\PC{1,200}",
                strategy in strategy_strategy(),
            ) {
                let doc = make_doc(&content);
                let chunks = splitter(200, 50).split(&doc, strategy);
                prop_assert_eq!(chunks.len(), 1);
                prop_assert_eq!(&chunks[0].content, &content);
            }
        }
    }
}
