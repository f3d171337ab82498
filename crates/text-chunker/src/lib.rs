//! # Textbook Chunker
//!
//! Heading-tree recovery and block-aware chunking for large plain-text
//! textbooks.
//!
//! ## Philosophy
//!
//! The chunker turns an unstructured text dump into retrieval-ready records that:
//! - Carry their full chapter/section ancestry
//! - Never split a bullet list, table or caption across two chunks
//! - Overlap their neighbours so context survives a chunk boundary
//! - Come with entities, keywords and a category for filtering
//!
//! ## Architecture
//!
//! ```text
//! Text parts
//!     │
//!     ├──> RawText (concatenation + line index)
//!     │
//!     ├──> Line Classifier → heading candidates
//!     │
//!     ├──> Heading-Tree Builder → ToC forest
//!     │
//!     ├──> Leaf-Section Resolver
//!     │    ├─> Leaves by set difference
//!     │    └─> Small-section merge into section groups
//!     │
//!     ├──> Chunker
//!     │    ├─> Atomic blocks (blank-line delimited)
//!     │    └─> Greedy packing with whole-block overlap
//!     │
//!     └──> Record Assembler
//!          ├─> Metadata Enricher (entities, keywords, category)
//!          ├─> Sequential chunk ids
//!          └─> Run manifest
//! ```
//!
//! ## Example
//!
//! ```rust
//! use textbook_chunker::{Pipeline, PipelineConfig, RawText};
//!
//! let raw = RawText::from_text(
//!     "Chapter 1\nIntroduction\n\nFever is common in infants.\n",
//! ).unwrap();
//! let pipeline = Pipeline::new(PipelineConfig::default()).unwrap();
//! let output = pipeline.run(&raw);
//!
//! for record in &output.records {
//!     println!("{} [{}] {} words", record.chunk_id, record.subsection_path, record.token_estimate);
//! }
//! ```

mod assemble;
mod blocks;
mod chunker;
mod classifier;
mod config;
mod enrich;
mod error;
mod pipeline;
mod sections;
mod text;
mod toc;
mod types;

pub use assemble::{ChapterCount, ChunkStats, RecordAssembler, RunManifest, StructureCounts};
pub use blocks::{split_blocks, AtomicBlock};
pub use chunker::{Chunker, DraftChunk};
pub use classifier::{LineClass, LineClassifier, LineKind, LineRule, LineWindow};
pub use config::{
    ChunkingConfig, ClassifierConfig, EnrichmentConfig, EntityPatterns, KeywordGroup,
    PipelineConfig,
};
pub use enrich::{BookMetadata, Enricher, Enrichment};
pub use error::{ChunkerError, Result};
pub use pipeline::{Pipeline, PipelineOutput};
pub use sections::{
    leaf_sections, merge_small_sections, resolve_leaves, LeafSection, SectionGroup,
    FRONT_MATTER_TITLE, WHOLE_DOCUMENT_TITLE,
};
pub use text::{word_count, LineSpan, PartInfo, RawText, RawTextBuilder};
pub use toc::{scan_headings, HeadingCandidate, HeadingScan, NodeId, Toc, TocNode};
pub use types::{BlockKind, ChunkRecord, EntityCategory, EntitySet};
