use crate::chunker::DraftChunk;
use crate::config::ChunkingConfig;
use crate::enrich::{BookMetadata, Enricher};
use crate::sections::SectionGroup;
use crate::text::{word_count, PartInfo, RawText};
use crate::toc::{NodeId, Toc};
use crate::types::ChunkRecord;
use serde::{Deserialize, Serialize};

/// Ancestry shared by every chunk of one section group
struct Ancestry {
    chapter_title: Option<String>,
    chapter_id: Option<NodeId>,
    subsection_path: String,
}

/// Turns draft spans into final records with sequential ids
pub struct RecordAssembler<'a> {
    toc: &'a Toc,
    enricher: &'a Enricher,
    config: &'a ChunkingConfig,
}

impl<'a> RecordAssembler<'a> {
    #[must_use]
    pub const fn new(toc: &'a Toc, enricher: &'a Enricher, config: &'a ChunkingConfig) -> Self {
        Self {
            toc,
            enricher,
            config,
        }
    }

    /// `{prefix}_{seq}` with a zero-padded, 1-based sequence number
    #[must_use]
    pub fn chunk_id(&self, sequence: usize) -> String {
        format!(
            "{}_{:0width$}",
            self.config.chunk_id_prefix,
            sequence,
            width = self.config.chunk_id_width
        )
    }

    /// Build records in production order; ids follow that order exactly
    #[must_use]
    pub fn assemble(
        &self,
        raw: &RawText,
        groups: &[SectionGroup],
        drafts: &[DraftChunk],
    ) -> Vec<ChunkRecord> {
        let ancestry: Vec<Ancestry> = groups.iter().map(|g| self.ancestry(g)).collect();

        drafts
            .iter()
            .enumerate()
            .filter_map(|(position, draft)| {
                let group = groups.get(draft.group)?;
                let lineage = ancestry.get(draft.group)?;
                let text = raw.slice(draft.start..draft.end);
                let enrichment = self.enricher.enrich(text);

                Some(ChunkRecord {
                    chunk_id: self.chunk_id(position + 1),
                    chapter_title: lineage.chapter_title.clone(),
                    chapter_id: lineage.chapter_id,
                    section_title: group.anchor.title.clone(),
                    section_id: group.anchor.node,
                    subsection_path: lineage.subsection_path.clone(),
                    start_offset: draft.start,
                    end_offset: draft.end,
                    chunk_index_in_section: draft.index_in_section,
                    token_estimate: word_count(text),
                    text: text.to_string(),
                    keywords: enrichment.keywords,
                    entities: enrichment.entities,
                    category: enrichment.category,
                    age_group: enrichment.age_group,
                    dosages: enrichment.dosages,
                    content_types: draft.kinds.clone(),
                    merged_section_ids: group.members.clone(),
                })
            })
            .collect()
    }

    fn ancestry(&self, group: &SectionGroup) -> Ancestry {
        let Some(id) = group.anchor.node else {
            return Ancestry {
                chapter_title: None,
                chapter_id: None,
                subsection_path: group.anchor.title.clone(),
            };
        };
        let chapter = self.toc.chapter_of(id);
        Ancestry {
            chapter_title: chapter.map(|node| node.title.clone()),
            chapter_id: chapter.map(|node| node.id),
            subsection_path: self.toc.path_titles(id).join(" > "),
        }
    }
}

/// Token-count summary over all records
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChunkStats {
    pub total_chunks: usize,
    pub total_tokens: usize,
    pub avg_token_estimate: f64,
    pub min_chunk_size: usize,
    pub max_chunk_size: usize,
}

impl ChunkStats {
    #[must_use]
    pub fn from_records(records: &[ChunkRecord]) -> Self {
        let sizes = || records.iter().map(|r| r.token_estimate);
        let total_tokens: usize = sizes().sum();
        #[allow(clippy::cast_precision_loss)]
        let avg_token_estimate = if records.is_empty() {
            0.0
        } else {
            total_tokens as f64 / records.len() as f64
        };
        Self {
            total_chunks: records.len(),
            total_tokens,
            avg_token_estimate,
            min_chunk_size: sizes().min().unwrap_or(0),
            max_chunk_size: sizes().max().unwrap_or(0),
        }
    }
}

impl std::fmt::Display for ChunkStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Tokens: {} | Avg: {:.1} | Range: {}-{}",
            self.total_chunks,
            self.total_tokens,
            self.avg_token_estimate,
            self.min_chunk_size,
            self.max_chunk_size
        )
    }
}

/// Chunks attributed to one chapter; `chapter_id` is `None` for text
/// outside any chapter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterCount {
    pub chapter_id: Option<NodeId>,
    pub chapter_title: Option<String>,
    pub chunks: usize,
}

/// Run-level report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunManifest {
    /// Byte length of the concatenated input
    pub total_bytes: usize,
    pub input_sha256: String,
    pub parts: Vec<PartInfo>,
    pub book: BookMetadata,
    pub toc_nodes: usize,
    pub leaf_sections: usize,
    pub section_groups: usize,
    #[serde(flatten)]
    pub stats: ChunkStats,
    /// In order of first appearance
    pub counts_per_chapter: Vec<ChapterCount>,
    pub warnings: Vec<String>,
}

/// Counts gathered by the pipeline before the manifest is built
#[derive(Debug, Clone, Copy, Default)]
pub struct StructureCounts {
    pub toc_nodes: usize,
    pub leaf_sections: usize,
    pub section_groups: usize,
}

impl RunManifest {
    /// Summarize a run. Input warnings come first, then structural ones.
    #[must_use]
    pub fn build(
        raw: &RawText,
        records: &[ChunkRecord],
        counts: StructureCounts,
        oversized_words: usize,
    ) -> Self {
        let mut warnings: Vec<String> = raw.warnings().to_vec();
        if counts.toc_nodes == 0 {
            warnings.push("No headings detected; document treated as a single section".to_string());
        }
        warnings.extend(
            records
                .iter()
                .filter(|r| r.token_estimate > oversized_words)
                .map(|r| format!("Chunk {} oversized: {}", r.chunk_id, r.token_estimate)),
        );

        let mut counts_per_chapter: Vec<ChapterCount> = Vec::new();
        for record in records {
            match counts_per_chapter
                .iter_mut()
                .find(|c| c.chapter_id == record.chapter_id)
            {
                Some(entry) => entry.chunks += 1,
                None => counts_per_chapter.push(ChapterCount {
                    chapter_id: record.chapter_id,
                    chapter_title: record.chapter_title.clone(),
                    chunks: 1,
                }),
            }
        }

        Self {
            total_bytes: raw.len(),
            input_sha256: raw.fingerprint(),
            parts: raw.parts().to_vec(),
            book: BookMetadata::extract(raw.as_str()),
            toc_nodes: counts.toc_nodes,
            leaf_sections: counts.leaf_sections,
            section_groups: counts.section_groups,
            stats: ChunkStats::from_records(records),
            counts_per_chapter,
            warnings,
        }
    }
}
