//! Heading-aware splitting for Markdown.

use std::ops::Range;

use pulldown_cmark::{Event, Parser, Tag};

use super::merge_units;
use super::recursive::TEXT_SEPARATORS;

/// Byte offsets where headings begin, excluding offset 0.
fn heading_starts(text: &str) -> Vec<usize> {
    let mut starts: Vec<usize> = Parser::new(text)
        .into_offset_iter()
        .filter_map(|(event, range)| {
            matches!(event, Event::Start(Tag::Heading { .. })).then_some(range.start)
        })
        .filter(|&start| start > 0 && start < text.len())
        .collect();
    starts.sort_unstable();
    starts.dedup();
    starts
}

/// Sections start at each heading; adjacent sections merge while they fit in `size` chars.
pub(super) fn split_spans(text: &str, size: usize, overlap: usize) -> Vec<Range<usize>> {
    let mut cuts = vec![0];
    cuts.extend(heading_starts(text));
    cuts.push(text.len());
    let sections = cuts.windows(2).map(|w| w[0]..w[1]);
    merge_units(text, sections, size, overlap, TEXT_SEPARATORS)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = "# Intro\nSome intro text.\n\n## Setup\nInstall things.\n\n## Usage\nRun it.\n";

    #[test]
    fn finds_heading_offsets() {
        let starts = heading_starts(DOC);
        assert_eq!(starts.len(), 2);
        assert!(DOC[starts[0]..].starts_with("## Setup"));
        assert!(DOC[starts[1]..].starts_with("## Usage"));
    }

    #[test]
    fn sections_become_chunks_when_they_do_not_fit_together() {
        let spans = split_spans(DOC, 30, 5);
        let parts: Vec<&str> = spans.iter().map(|r| &DOC[r.clone()]).collect();
        assert_eq!(parts.len(), 3, "{parts:?}");
        assert!(parts[0].starts_with("# Intro"));
        assert!(parts[1].starts_with("## Setup"));
        assert!(parts[2].starts_with("## Usage"));
    }

    #[test]
    fn small_sections_merge() {
        let spans = split_spans(DOC, 50, 5);
        let parts: Vec<&str> = spans.iter().map(|r| &DOC[r.clone()]).collect();
        assert_eq!(parts.len(), 2, "{parts:?}");
        assert!(parts[0].starts_with("# Intro"));
        assert!(parts[1].starts_with("## Setup"));
        assert!(parts[1].contains("## Usage"));
    }

    #[test]
    fn oversize_section_falls_back_to_recursive() {
        let body = "word ".repeat(40);
        let doc = format!("# Big\n{body}\n# Small\ntail\n");
        let spans = split_spans(&doc, 60, 10);
        assert!(spans.len() > 2);
        for r in &spans {
            assert!(doc[r.clone()].chars().count() <= 60);
        }
        assert!(doc[spans.last().unwrap().clone()].starts_with("# Small"));
    }

    #[test]
    fn text_without_headings_is_recursive() {
        let doc = "plain words only ".repeat(10);
        let spans = split_spans(&doc, 40, 8);
        assert!(spans.len() > 1);
    }
}
