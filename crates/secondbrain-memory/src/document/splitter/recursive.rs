//! Character-budget splitter that prefers the coarsest available break.

use std::ops::Range;

pub(super) struct Separator {
    pattern: &'static str,
    /// Byte offset inside `pattern` where the chunk boundary falls.
    cut: usize,
}

const fn after(pattern: &'static str) -> Separator {
    Separator {
        pattern,
        cut: pattern.len(),
    }
}

/// Break before the keyword, keeping the leading newline with the previous chunk.
const fn before_keyword(pattern: &'static str) -> Separator {
    Separator { pattern, cut: 1 }
}

/// Paragraph, line, sentence end, word. A hard character cut is the implicit last level.
pub(super) const TEXT_SEPARATORS: &[&[Separator]] = &[
    &[after("\n\n")],
    &[after("\n")],
    &[after(". "), after("? "), after("! ")],
    &[after(" ")],
];

pub(super) const CODE_SEPARATORS: &[&[Separator]] = &[
    &[before_keyword("\nclass ")],
    &[before_keyword("\ndef ")],
    &[before_keyword("\n\tdef "), before_keyword("\n    def ")],
    &[after("\n\n")],
    &[after("\n")],
    &[after(" ")],
];

/// How far back (in chars) the next chunk start may move to land on a word start.
const SNAP_WINDOW: usize = 20;

/// Split `text` into byte ranges of at most `size` chars where consecutive ranges share at
/// least `overlap` chars. Requires `overlap < size`.
pub(super) fn split_spans(
    text: &str,
    size: usize,
    overlap: usize,
    levels: &[&[Separator]],
) -> Vec<Range<usize>> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let n = bounds.len() - 1;
    if n == 0 {
        return Vec::new();
    }
    let size = size.max(1);
    let overlap = overlap.min(size - 1);
    if n <= size {
        return vec![0..text.len()];
    }

    let mut spans = Vec::new();
    let mut start = 0;
    loop {
        if n - start <= size {
            spans.push(bounds[start]..text.len());
            break;
        }
        let max_end = start + size;
        let min_end = start + (overlap + 1).max(size / 2);
        let end = find_break(text, &bounds, start, min_end, max_end, levels).unwrap_or(max_end);
        spans.push(bounds[start]..bounds[end]);
        start = next_start(text, &bounds, start, end, overlap);
    }
    spans
}

/// Latest boundary of the highest-priority separator level landing in `[min_end, max_end]`.
fn find_break(
    text: &str,
    bounds: &[usize],
    start: usize,
    min_end: usize,
    max_end: usize,
    levels: &[&[Separator]],
) -> Option<usize> {
    let base = bounds[start];
    let window = &text[base..bounds[max_end]];
    for level in levels {
        let best = level
            .iter()
            .filter_map(|sep| window.rfind(sep.pattern).map(|b| base + b + sep.cut))
            .max();
        if let Some(byte) = best
            && let Ok(idx) = bounds.binary_search(&byte)
            && idx >= min_end
        {
            return Some(idx);
        }
    }
    None
}

fn char_at(text: &str, bounds: &[usize], idx: usize) -> Option<char> {
    text[bounds[idx]..].chars().next()
}

fn is_word_start(text: &str, bounds: &[usize], idx: usize) -> bool {
    idx == 0 || char_at(text, bounds, idx - 1).is_some_and(char::is_whitespace)
}

/// Step back `overlap` chars from `end`, then a little further to a word start if one is
/// close. Always strictly after `start`.
fn next_start(text: &str, bounds: &[usize], start: usize, end: usize, overlap: usize) -> usize {
    if overlap == 0 {
        return end;
    }
    let target = end - overlap;
    let floor = (start + 1).max(target.saturating_sub(SNAP_WINDOW));
    let mut idx = target;
    while idx > floor && !is_word_start(text, bounds, idx) {
        idx -= 1;
    }
    if is_word_start(text, bounds, idx) {
        idx
    } else {
        target
    }
}
