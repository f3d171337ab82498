use crate::classifier::LineKind;
use crate::text::{word_count, RawText};
use crate::types::BlockKind;
use std::ops::Range;

/// Run of lines closed by a blank line (which it includes) or by the end of
/// the span. Chunk boundaries only ever fall between blocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomicBlock {
    pub start: usize,
    pub end: usize,
    pub words: usize,
    /// Kind of the first non-blank line; blank-only blocks are paragraphs
    pub kind: BlockKind,
}

impl AtomicBlock {
    #[must_use]
    pub const fn is_blank(&self) -> bool {
        self.words == 0
    }
}

/// Split `span` into atomic blocks.
///
/// `span` must start and end on line boundaries; `line_kinds` holds one
/// entry per line of `raw`.
#[must_use]
pub fn split_blocks(raw: &RawText, span: Range<usize>, line_kinds: &[LineKind]) -> Vec<AtomicBlock> {
    let lines = raw.lines();
    let first = lines.partition_point(|line| line.start < span.start);

    let mut blocks = Vec::new();
    let mut open: Option<(usize, Option<BlockKind>)> = None;

    for (index, line) in lines.iter().enumerate().skip(first) {
        if line.end > span.end {
            break;
        }
        let content = raw.line(*line);
        let blank = content.trim().is_empty();
        let (start, kind) = open.get_or_insert((line.start, None));
        if kind.is_none() && !blank {
            *kind = Some(
                line_kinds
                    .get(index)
                    .map_or(BlockKind::Paragraph, |k| k.block_kind()),
            );
        }

        if blank {
            blocks.push(close(raw, *start, line.end, *kind));
            open = None;
        }
    }

    if let Some((start, kind)) = open {
        blocks.push(close(raw, start, span.end, kind));
    }
    blocks
}

fn close(raw: &RawText, start: usize, end: usize, kind: Option<BlockKind>) -> AtomicBlock {
    AtomicBlock {
        start,
        end,
        words: word_count(raw.slice(start..end)),
        kind: kind.unwrap_or(BlockKind::Paragraph),
    }
}
