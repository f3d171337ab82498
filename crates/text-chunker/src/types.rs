use crate::toc::NodeId;
use serde::{Deserialize, Serialize};

/// A finished chunk with ancestry and derived metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkRecord {
    /// Sequential run-wide id, e.g. `NELSON_000001`
    pub chunk_id: String,

    /// Nearest chapter (level 2) ancestor, if any
    pub chapter_title: Option<String>,
    pub chapter_id: Option<NodeId>,

    /// Originating leaf section (the flushing section for merge groups)
    pub section_title: String,
    pub section_id: Option<NodeId>,

    /// Root-to-section titles joined by `" > "`
    pub subsection_path: String,

    /// Byte span in the concatenated input
    pub start_offset: usize,
    pub end_offset: usize,

    /// 0-based position among chunks of the same section or merge group
    pub chunk_index_in_section: usize,

    /// Whitespace-delimited word count
    pub token_estimate: usize,

    pub text: String,

    pub keywords: Vec<String>,
    pub entities: EntitySet,

    /// Medical category from the ordered keyword table
    pub category: String,
    pub age_group: String,

    /// Dosage expressions found in the text
    #[serde(default)]
    pub dosages: Vec<String>,

    /// Distinct block kinds in document order of first appearance
    #[serde(default)]
    pub content_types: Vec<BlockKind>,

    /// Every section whose text went into this chunk
    #[serde(default)]
    pub merged_section_ids: Vec<NodeId>,
}

/// Kind of an atomic block, taken from its first line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockKind {
    Paragraph,
    Bullet,
    Table,
    Figure,
    Heading,
}

/// The seven entity categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityCategory {
    Diseases,
    Drugs,
    Organisms,
    Labs,
    Procedures,
    Vaccines,
    Abbreviations,
}

impl EntityCategory {
    /// All categories in output order
    pub const ALL: [Self; 7] = [
        Self::Diseases,
        Self::Drugs,
        Self::Organisms,
        Self::Labs,
        Self::Procedures,
        Self::Vaccines,
        Self::Abbreviations,
    ];

    /// Categories whose members also become keywords
    pub const KEYWORD_SOURCES: [Self; 3] = [Self::Diseases, Self::Drugs, Self::Organisms];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diseases => "diseases",
            Self::Drugs => "drugs",
            Self::Organisms => "organisms",
            Self::Labs => "labs",
            Self::Procedures => "procedures",
            Self::Vaccines => "vaccines",
            Self::Abbreviations => "abbreviations",
        }
    }
}

/// Per-chunk entity matches, each list sorted and deduplicated
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EntitySet {
    pub diseases: Vec<String>,
    pub drugs: Vec<String>,
    pub organisms: Vec<String>,
    pub labs: Vec<String>,
    pub procedures: Vec<String>,
    pub vaccines: Vec<String>,
    pub abbreviations: Vec<String>,
}

impl EntitySet {
    #[must_use]
    pub fn get(&self, category: EntityCategory) -> &[String] {
        match category {
            EntityCategory::Diseases => &self.diseases,
            EntityCategory::Drugs => &self.drugs,
            EntityCategory::Organisms => &self.organisms,
            EntityCategory::Labs => &self.labs,
            EntityCategory::Procedures => &self.procedures,
            EntityCategory::Vaccines => &self.vaccines,
            EntityCategory::Abbreviations => &self.abbreviations,
        }
    }

    pub fn get_mut(&mut self, category: EntityCategory) -> &mut Vec<String> {
        match category {
            EntityCategory::Diseases => &mut self.diseases,
            EntityCategory::Drugs => &mut self.drugs,
            EntityCategory::Organisms => &mut self.organisms,
            EntityCategory::Labs => &mut self.labs,
            EntityCategory::Procedures => &mut self.procedures,
            EntityCategory::Vaccines => &mut self.vaccines,
            EntityCategory::Abbreviations => &mut self.abbreviations,
        }
    }

    /// Total matches across all categories
    #[must_use]
    pub fn len(&self) -> usize {
        EntityCategory::ALL.iter().map(|c| self.get(*c).len()).sum()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
