use crate::assemble::{RecordAssembler, RunManifest, StructureCounts};
use crate::chunker::Chunker;
use crate::classifier::LineClassifier;
use crate::config::PipelineConfig;
use crate::enrich::Enricher;
use crate::error::Result;
use crate::sections::{leaf_sections, merge_small_sections};
use crate::text::RawText;
use crate::toc::{scan_headings, Toc};
use crate::types::ChunkRecord;

/// Everything one run produces
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    pub toc: Toc,
    pub records: Vec<ChunkRecord>,
    pub manifest: RunManifest,
}

/// Classify, build the ToC, resolve leaves, chunk, enrich, assemble.
///
/// All patterns are compiled in [`Pipeline::new`]; [`Pipeline::run`] is a
/// pure function of its input.
pub struct Pipeline {
    config: PipelineConfig,
    classifier: LineClassifier,
    chunker: Chunker,
    enricher: Enricher,
}

impl Pipeline {
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            classifier: LineClassifier::new(&config.classifier)?,
            chunker: Chunker::new(config.chunking.clone())?,
            enricher: Enricher::new(&config.enrichment)?,
            config,
        })
    }

    /// Get configuration
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Heading scan and tree only
    #[must_use]
    pub fn toc(&self, raw: &RawText) -> Toc {
        let scan = scan_headings(raw, &self.classifier);
        Toc::build(scan.candidates, raw.len())
    }

    #[must_use]
    pub fn run(&self, raw: &RawText) -> PipelineOutput {
        let scan = scan_headings(raw, &self.classifier);
        let toc = Toc::build(scan.candidates, raw.len());
        if toc.is_empty() {
            log::warn!("No headings detected; chunking the whole document as one section");
        } else {
            log::info!(
                "Built ToC with {} nodes (max depth {})",
                toc.len(),
                toc.max_depth().unwrap_or(0)
            );
        }

        let chunking = &self.config.chunking;
        let sections = leaf_sections(&toc, raw.len(), chunking.keep_preamble);
        let groups = merge_small_sections(raw, &sections, chunking.small_section_words);
        log::info!(
            "Resolved {} leaf sections into {} section groups",
            sections.len(),
            groups.len()
        );

        let drafts = self.chunker.chunk_groups(raw, &groups, &scan.line_kinds);
        let records = RecordAssembler::new(&toc, &self.enricher, chunking).assemble(
            raw,
            &groups,
            &drafts,
        );

        let counts = StructureCounts {
            toc_nodes: toc.len(),
            leaf_sections: sections.len(),
            section_groups: groups.len(),
        };
        let manifest = RunManifest::build(raw, &records, counts, chunking.oversized_words);
        for record in records
            .iter()
            .filter(|r| r.token_estimate > chunking.oversized_words)
        {
            log::warn!(
                "Chunk {} oversized: {} words",
                record.chunk_id,
                record.token_estimate
            );
        }
        log::info!("{}", manifest.stats);

        PipelineOutput {
            toc,
            records,
            manifest,
        }
    }
}
