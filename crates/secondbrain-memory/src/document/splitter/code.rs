//! Syntax-aware splitting for Python sources via tree-sitter.

use std::ops::Range;

use tree_sitter::{Parser, Tree};

use super::merge_units;
use super::recursive::{self, CODE_SEPARATORS};

fn parse(source: &str) -> Option<Tree> {
    let mut parser = Parser::new();
    parser
        .set_language(&tree_sitter_python::LANGUAGE.into())
        .ok()?;
    parser.parse(source, None)
}

/// Partition `source` at the ends of top-level syntax nodes. Gaps between nodes attach to the
/// following unit; trailing text attaches to the last one.
fn top_level_units(source: &str, tree: &Tree) -> Vec<Range<usize>> {
    let root = tree.root_node();
    let mut units = Vec::new();
    let mut prev = 0;
    let child_count = u32::try_from(root.named_child_count()).unwrap_or(u32::MAX);

    for i in 0..child_count {
        let Some(child) = root.named_child(i) else {
            continue;
        };
        let end = child.end_byte().min(source.len());
        if end > prev && source.is_char_boundary(end) {
            units.push(prev..end);
            prev = end;
        }
    }

    if prev < source.len() {
        match units.last_mut() {
            Some(last) => last.end = source.len(),
            None => units.push(prev..source.len()),
        }
    }
    units
}

pub(super) fn split_spans(source: &str, size: usize, overlap: usize) -> Vec<Range<usize>> {
    let Some(tree) = parse(source) else {
        tracing::debug!("python parse failed, using separator split");
        return recursive::split_spans(source, size, overlap, CODE_SEPARATORS);
    };
    let units = top_level_units(source, &tree);
    merge_units(source, units.into_iter(), size, overlap, CODE_SEPARATORS)
}
