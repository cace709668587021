//! Fixed windows of cl100k BPE tokens.
//!
//! Text is first cut at Unicode word boundaries. Each segment is then divided into pieces
//! that encode to a single token (or a single char that needs several tokens), so every
//! window boundary falls on a char boundary and window sizes are counted in real tokens.

use std::fmt;
use std::ops::Range;
use std::sync::OnceLock;

use tiktoken_rs::CoreBPE;
use unicode_segmentation::UnicodeSegmentation;

use crate::document::DocumentError;

static CL100K: OnceLock<CoreBPE> = OnceLock::new();

/// Shared handle to the cl100k encoder, loaded once per process.
#[derive(Clone, Copy)]
pub struct TokenCounter {
    bpe: &'static CoreBPE,
}

impl fmt::Debug for TokenCounter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TokenCounter(cl100k_base)")
    }
}

impl TokenCounter {
    /// # Errors
    ///
    /// Returns `DocumentError::Configuration` if the encoder tables cannot be loaded.
    pub fn cl100k() -> Result<Self, DocumentError> {
        if let Some(bpe) = CL100K.get() {
            return Ok(Self { bpe });
        }
        let bpe = tiktoken_rs::cl100k_base().map_err(|e| {
            DocumentError::Configuration(format!("failed to load cl100k tokenizer: {e}"))
        })?;
        Ok(Self {
            bpe: CL100K.get_or_init(|| bpe),
        })
    }

    #[must_use]
    pub fn count(&self, text: &str) -> usize {
        if text.is_empty() {
            0
        } else {
            self.bpe.encode_ordinary(text).len()
        }
    }

    /// Token-sized pieces of `text` as `(byte range, token count)`, in order and covering it.
    fn pieces(&self, text: &str) -> Vec<(Range<usize>, usize)> {
        let mut pieces = Vec::new();
        for (offset, segment) in text.split_word_bound_indices() {
            let count = self.count(segment);
            if count <= 1 || segment.chars().count() == 1 {
                pieces.push((offset..offset + segment.len(), count.max(1)));
                continue;
            }
            self.split_segment(segment, offset, &mut pieces);
        }
        pieces
    }

    /// Greedily cut `segment` into the longest char prefixes that encode to one token.
    fn split_segment(&self, segment: &str, base: usize, out: &mut Vec<(Range<usize>, usize)>) {
        let mut rest = segment;
        let mut start = base;
        while let Some(first) = rest.chars().next() {
            let mut end = first.len_utf8();
            let first_count = self.count(&rest[..end]);
            if first_count == 1 {
                for (i, c) in rest.char_indices().skip(1) {
                    if self.count(&rest[..i + c.len_utf8()]) > 1 {
                        break;
                    }
                    end = i + c.len_utf8();
                }
            }
            out.push((start..start + end, first_count.max(1)));
            start += end;
            rest = &rest[end..];
        }
    }
}

/// Windows of at most `size` tokens; each window starts as late as possible while still
/// sharing at least `overlap` tokens with the previous one.
pub(super) fn split_spans(
    counter: TokenCounter,
    text: &str,
    size: usize,
    overlap: usize,
) -> Vec<Range<usize>> {
    let pieces = counter.pieces(text);
    if pieces.is_empty() {
        return Vec::new();
    }
    let size = size.max(1);

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        let mut end = start;
        let mut total = 0;
        while end < pieces.len() && (end == start || total + pieces[end].1 <= size) {
            total += pieces[end].1;
            end += 1;
        }
        spans.push(pieces[start].0.start..pieces[end - 1].0.end);
        if end == pieces.len() {
            break;
        }

        let mut next = end;
        let mut shared = 0;
        while next > start + 1 && shared < overlap {
            next -= 1;
            shared += pieces[next].1;
        }
        start = next;
    }
    spans
}
