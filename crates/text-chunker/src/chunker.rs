use crate::blocks::{split_blocks, AtomicBlock};
use crate::classifier::LineKind;
use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::sections::SectionGroup;
use crate::text::RawText;
use crate::types::BlockKind;
use std::ops::Range;

/// A chunk span before enrichment and id assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DraftChunk {
    /// Index of the originating section group
    pub group: usize,
    /// 0-based position within that group
    pub index_in_section: usize,
    pub start: usize,
    pub end: usize,
    pub words: usize,
    /// Distinct kinds of the non-blank blocks, first appearance first
    pub kinds: Vec<BlockKind>,
}

/// Greedy block packer with whole-block overlap
pub struct Chunker {
    config: ChunkingConfig,
}

impl Chunker {
    /// Create a new chunker with configuration
    pub fn new(config: ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &ChunkingConfig {
        &self.config
    }

    /// Pack blocks into chunks, returned as block index ranges.
    ///
    /// A chunk closes before a block only when adding it would pass
    /// `max_chunk_words` and the chunk already holds `min_chunk_words`. The
    /// next chunk then starts with trailing blocks of the closed one, walked
    /// backwards until `overlap_words` is reached. A single block larger
    /// than the ceiling is never split, so such chunks may exceed it.
    ///
    /// A carry-over that alone meets the floor does not count toward it, so
    /// a re-included giant block cannot close one chunk per following block.
    #[must_use]
    pub fn pack(&self, blocks: &[AtomicBlock]) -> Vec<Range<usize>> {
        let ChunkingConfig {
            min_chunk_words,
            max_chunk_words,
            overlap_words,
            ..
        } = self.config;

        let mut ranges = Vec::new();
        let mut first = 0;
        let mut words = 0;
        let mut carried = 0;

        for (index, block) in blocks.iter().enumerate() {
            let counted = if carried >= min_chunk_words {
                words - carried
            } else {
                words
            };
            if words + block.words > max_chunk_words && counted >= min_chunk_words {
                ranges.push(first..index);

                let mut overlap_start = index;
                let mut overlap = 0;
                while overlap_start > first && overlap < overlap_words {
                    overlap_start -= 1;
                    overlap += blocks[overlap_start].words;
                }
                first = overlap_start;
                words = overlap;
                carried = overlap;
            }
            words += block.words;
        }

        if first < blocks.len() {
            ranges.push(first..blocks.len());
        }
        ranges
    }

    /// Chunk one section group; blank chunks are dropped
    #[must_use]
    pub fn chunk_group(
        &self,
        raw: &RawText,
        group_index: usize,
        group: &SectionGroup,
        line_kinds: &[LineKind],
    ) -> Vec<DraftChunk> {
        let blocks = split_blocks(raw, group.start..group.end, line_kinds);
        let mut drafts = Vec::new();

        for range in self.pack(&blocks) {
            let members = &blocks[range];
            let (Some(head), Some(tail)) = (members.first(), members.last()) else {
                continue;
            };
            let words: usize = members.iter().map(|b| b.words).sum();
            if words == 0 {
                continue;
            }

            let mut kinds = Vec::new();
            for block in members.iter().filter(|b| !b.is_blank()) {
                if !kinds.contains(&block.kind) {
                    kinds.push(block.kind);
                }
            }

            drafts.push(DraftChunk {
                group: group_index,
                index_in_section: drafts.len(),
                start: head.start,
                end: tail.end,
                words,
                kinds,
            });
        }

        log::debug!(
            "Section '{}': {} blocks -> {} chunks",
            group.anchor.title,
            blocks.len(),
            drafts.len()
        );
        drafts
    }

    /// Chunk every group in order
    #[must_use]
    pub fn chunk_groups(
        &self,
        raw: &RawText,
        groups: &[SectionGroup],
        line_kinds: &[LineKind],
    ) -> Vec<DraftChunk> {
        groups
            .iter()
            .enumerate()
            .flat_map(|(index, group)| self.chunk_group(raw, index, group, line_kinds))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sections::LeafSection;
    use pretty_assertions::assert_eq;

    fn blocks(words: &[usize]) -> Vec<AtomicBlock> {
        let mut start = 0;
        words
            .iter()
            .map(|w| {
                let block = AtomicBlock {
                    start,
                    end: start + 10,
                    words: *w,
                    kind: BlockKind::Paragraph,
                };
                start += 10;
                block
            })
            .collect()
    }

    fn chunker() -> Chunker {
        Chunker::new(ChunkingConfig::default()).unwrap()
    }

    #[test]
    fn closes_after_floor_and_overlaps_trailing_block() {
        // 500 + 900 = 1400 passes the ceiling only when block 3 is offered;
        // block 2 alone is added because 500 is below the floor
        let ranges = chunker().pack(&blocks(&[500, 900, 500]));
        assert_eq!(ranges, vec![0..2, 1..3]);
    }

    #[test]
    fn small_sections_stay_in_one_chunk() {
        assert_eq!(chunker().pack(&blocks(&[100, 200, 300])), vec![0..3]);
    }

    #[test]
    fn overlap_walks_back_whole_blocks_until_floor() {
        let ranges = chunker().pack(&blocks(&[700, 200, 100, 80, 1000]));
        // Closed chunk 0..4 (1080 words); 80 + 100 >= 150 re-included
        assert_eq!(ranges, vec![0..4, 2..5]);
    }

    #[test]
    fn giant_block_is_never_split() {
        let ranges = chunker().pack(&blocks(&[1500, 100]));
        // 1500 is added below the floor; the overlap then re-includes it whole
        assert_eq!(ranges, vec![0..1, 0..2]);
    }

    #[test]
    fn giant_block_is_carried_over_once() {
        let mut sizes = vec![1500];
        sizes.extend([10; 20]);
        let ranges = chunker().pack(&blocks(&sizes));
        assert_eq!(ranges, vec![0..1, 0..21]);
    }

    #[test]
    fn fresh_words_past_a_giant_carry_over_close_normally() {
        let mut sizes = vec![1500];
        sizes.extend([100; 9]);
        sizes.push(500);
        // 900 fresh words meet the floor, so the 500-word block opens a new chunk
        let ranges = chunker().pack(&blocks(&sizes));
        assert_eq!(ranges, vec![0..1, 0..10, 8..11]);
    }

    #[test]
    fn ceiling_not_enforced_below_floor() {
        assert_eq!(chunker().pack(&blocks(&[300, 2000, 10])), vec![0..2, 1..3]);
    }

    #[test]
    fn empty_input_packs_nothing() {
        assert!(chunker().pack(&[]).is_empty());
    }

    #[test]
    fn chunk_group_drops_blank_and_tracks_kinds() {
        let raw = RawText::from_text("\n\n- item one\n\nplain text here\n").unwrap();
        let kinds = vec![
            LineKind::Plain,
            LineKind::Plain,
            LineKind::Bullet,
            LineKind::Plain,
            LineKind::Plain,
        ];
        let group = SectionGroup {
            anchor: LeafSection {
                node: None,
                parent: None,
                title: "Full Text".to_string(),
                start: 0,
                end: raw.len(),
            },
            start: 0,
            end: raw.len(),
            members: Vec::new(),
        };

        let drafts = chunker().chunk_group(&raw, 3, &group, &kinds);
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].group, 3);
        assert_eq!(drafts[0].words, 6);
        assert_eq!(drafts[0].kinds, vec![BlockKind::Bullet, BlockKind::Paragraph]);
        assert_eq!((drafts[0].start, drafts[0].end), (0, raw.len()));

        let blank = RawText::from_text("\n\n\n").unwrap();
        let group = SectionGroup {
            start: 0,
            end: blank.len(),
            ..group
        };
        assert!(chunker().chunk_group(&blank, 0, &group, &[]).is_empty());
    }

    #[test]
    fn rejects_invalid_config() {
        let config = ChunkingConfig {
            overlap_words: 900,
            ..ChunkingConfig::default()
        };
        assert!(Chunker::new(config).is_err());
    }
}
