use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};

/// Full configuration surface of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    /// Heading and marker recognition
    pub classifier: ClassifierConfig,

    /// Section merging, chunk budgets and record ids
    pub chunking: ChunkingConfig,

    /// Entity, keyword and category extraction
    pub enrichment: EnrichmentConfig,
}

impl PipelineConfig {
    /// Parse a config document. JSON is tried first, then TOML.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let config: Self = match serde_json::from_slice(bytes) {
            Ok(config) => config,
            Err(json_err) => {
                let utf8 = std::str::from_utf8(bytes)
                    .map_err(|err| ChunkerError::config_parse(format!("{json_err}; {err}")))?;
                toml::from_str(utf8).map_err(|toml_err| {
                    ChunkerError::config_parse(format!(
                        "config is not valid JSON ({json_err}) or TOML ({toml_err})"
                    ))
                })?
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.classifier.validate()?;
        self.chunking.validate()?;
        self.enrichment.validate()?;
        Ok(())
    }
}

/// Pattern lists and thresholds used by the line classifier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClassifierConfig {
    /// Level 1: "PART <roman>" alone on a line
    pub part_pattern: String,

    /// Level 2: "Chapter <n>" alone on a line
    pub chapter_pattern: String,

    /// Level 3: dotted number followed by a capitalized title.
    /// Group 1 is the section number, group 2 the title.
    pub numbered_pattern: String,

    /// Level 4: upper-case run-in heading
    pub all_caps_pattern: String,

    /// Level 5: short capitalized word sequence between blank lines
    pub title_case_pattern: String,

    /// Substrings that veto an all-caps heading (running headers and the like)
    pub heading_exclusions: Vec<String>,

    /// A continuation line must be shorter than this (in chars)
    pub continuation_max_chars: usize,

    /// How many following lines a rule may inspect
    pub lookahead_lines: usize,

    /// Inclusive length bounds for title-case headings (in chars)
    pub title_case_min_chars: usize,
    pub title_case_max_chars: usize,

    /// Figure caption starts
    pub figure_patterns: Vec<String>,

    /// Table caption starts
    pub table_patterns: Vec<String>,

    /// A window with more tabs than this is treated as a table
    pub table_min_tabs: usize,

    /// A window with more pipes than this is treated as a table
    pub table_min_pipes: usize,

    /// Bullet item starts
    pub bullet_patterns: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            part_pattern: r"(?i)^PART\s+([IVXLC]+)$".to_string(),
            chapter_pattern: r"(?i)^Chapter\s+(\d+)$".to_string(),
            numbered_pattern: r"^(\d+(?:\.\d+)+)\s+([A-Z].*)$".to_string(),
            all_caps_pattern: r"^[A-Z][A-Z\s\d\-.:,]{9,}$".to_string(),
            title_case_pattern: r"^[A-Z][a-z]+(?:\s+[A-Z][a-z]+)*$".to_string(),
            heading_exclusions: vec![
                "Chapter".to_string(),
                "PART".to_string(),
                "Downloaded for".to_string(),
            ],
            continuation_max_chars: 100,
            lookahead_lines: 5,
            title_case_min_chars: 4,
            title_case_max_chars: 59,
            figure_patterns: vec![
                r"(?i)^Fig\.\s*\d+".to_string(),
                r"(?i)^Figure\s+\d+".to_string(),
            ],
            table_patterns: vec![r"(?i)^Table\s+\d+".to_string()],
            table_min_tabs: 10,
            table_min_pipes: 5,
            bullet_patterns: vec![
                r"^\s*[•·▪▫▸▹‣⁃]\s+".to_string(),
                r"^\s*[-*]\s+".to_string(),
                r"^\s*\d+\.\s+".to_string(),
                r"^\s*[a-zA-Z]\.\s+".to_string(),
            ],
        }
    }
}

impl ClassifierConfig {
    fn validate(&self) -> Result<()> {
        if self.title_case_min_chars > self.title_case_max_chars {
            return Err(ChunkerError::invalid_config(format!(
                "title_case_min_chars ({}) cannot exceed title_case_max_chars ({})",
                self.title_case_min_chars, self.title_case_max_chars
            )));
        }
        if self.continuation_max_chars == 0 {
            return Err(ChunkerError::invalid_config(
                "continuation_max_chars must be > 0",
            ));
        }
        Ok(())
    }
}

/// Budgets for section merging and chunk packing, in whitespace-delimited words
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ChunkingConfig {
    /// Leaf sections below this many words are merged into the next sibling
    pub small_section_words: usize,

    /// A chunk is never closed before reaching this many words
    pub min_chunk_words: usize,

    /// Adding a block past this many words closes the chunk (once the floor is met)
    pub max_chunk_words: usize,

    /// Trailing words re-included at the start of the next chunk
    pub overlap_words: usize,

    /// Chunks above this size are reported in the manifest
    pub oversized_words: usize,

    /// Keep text before the first heading as a front-matter section
    pub keep_preamble: bool,

    /// Prefix of the sequential chunk id
    pub chunk_id_prefix: String,

    /// Zero-padded width of the chunk sequence number
    pub chunk_id_width: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            small_section_words: 250,
            min_chunk_words: 800,
            max_chunk_words: 1200,
            overlap_words: 150,
            oversized_words: 1600,
            keep_preamble: true,
            chunk_id_prefix: "NELSON".to_string(),
            chunk_id_width: 6,
        }
    }
}

impl ChunkingConfig {
    /// Smaller budgets, handy for short documents and tests
    pub fn compact() -> Self {
        Self {
            small_section_words: 25,
            min_chunk_words: 80,
            max_chunk_words: 120,
            overlap_words: 15,
            oversized_words: 160,
            ..Default::default()
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_words == 0 {
            return Err(ChunkerError::invalid_config("max_chunk_words must be > 0"));
        }

        if self.min_chunk_words > self.max_chunk_words {
            return Err(ChunkerError::invalid_config(format!(
                "min_chunk_words ({}) cannot exceed max_chunk_words ({})",
                self.min_chunk_words, self.max_chunk_words
            )));
        }

        if self.overlap_words >= self.min_chunk_words {
            return Err(ChunkerError::invalid_config(format!(
                "overlap_words ({}) must be below min_chunk_words ({})",
                self.overlap_words, self.min_chunk_words
            )));
        }

        if self.chunk_id_width == 0 {
            return Err(ChunkerError::invalid_config("chunk_id_width must be > 0"));
        }

        Ok(())
    }
}

/// Regex per entity category. The six lexical categories are matched as-is
/// (the defaults carry `(?i)`); the abbreviation pattern must expose the
/// abbreviation in group 1 and an optional parenthesized expansion in group 2.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EntityPatterns {
    pub diseases: String,
    pub drugs: String,
    pub organisms: String,
    pub labs: String,
    pub procedures: String,
    pub vaccines: String,
    pub abbreviations: String,
}

impl Default for EntityPatterns {
    fn default() -> Self {
        Self {
            diseases: concat!(
                r"(?i)\b(?:[a-z][a-z'-]*\s+){0,2}",
                r"(?:syndrome|disease|agenesis|dysgenesis|aplasia|hypoplasia|dysplasia|disorder|",
                r"anomaly|anomalies|malformation|atrophy|infection|inflammation|cancer|tumor|",
                r"carcinoma|sarcoma|lymphoma|leukemia|deficiency|insufficiency|failure|colic|",
                r"depression|amblyopia|strabismus)\b"
            )
            .to_string(),
            drugs: concat!(
                r"(?i)\b(?:alcohol|mercury|nicotine|aspirin|ibuprofen|acetaminophen|penicillin|",
                r"amoxicillin|insulin|progestins|thiopurine)\b"
            )
            .to_string(),
            organisms: concat!(
                r"(?i)\b(?:virus|bacteria|fungus|parasite|streptococcus|staphylococcus|",
                r"e\. coli|hiv|hcv|hbv)\b"
            )
            .to_string(),
            labs: concat!(
                r"(?i)\b(?:IQ|DNA|RNA|PCR|CT|MRI|ultrasound|ultrasonography|scintigraphy|glucose|",
                r"creatinine|hemoglobin|white blood cell|platelet|electrolytes|pH|pO2|pCO2|",
                r"methylation|acetylation)\b"
            )
            .to_string(),
            procedures: concat!(
                r"(?i)\b(?:surgery|resection|biopsy|incision|drainage|transplant|intubation|",
                r"catheterization|vaccination|immunization|therapy|treatment|management|",
                r"counseling|patching)\b"
            )
            .to_string(),
            vaccines: r"(?i)\b(?:vaccine|vaccination|immunization|dtap|mmr|ipv|hepb|hib|pcv|rv)\b"
                .to_string(),
            abbreviations: r"\b([A-Z]{2,})\b(?:\s*\(([^)]+)\))?".to_string(),
        }
    }
}

/// Named list of trigger terms; the first group with a hit wins
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordGroup {
    pub name: String,
    pub terms: Vec<String>,
}

impl KeywordGroup {
    fn new(name: &str, terms: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            terms: terms.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// Vocabularies for the metadata enricher
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnrichmentConfig {
    /// Most frequent words kept before merging entity terms
    pub keyword_top_n: usize,

    /// Final keyword list length cap
    pub keyword_cap: usize,

    /// Minimum keyword length (ASCII letters)
    pub keyword_min_len: usize,

    /// Words never reported as keywords
    pub stopwords: Vec<String>,

    /// Entity regex per category
    pub entities: EntityPatterns,

    /// A parenthesized expansion is kept only when longer than this (in chars)
    pub abbreviation_expansion_floor: usize,

    /// Ordered medical category lookup
    pub categories: Vec<KeywordGroup>,
    pub default_category: String,

    /// Ordered age group lookup
    pub age_groups: Vec<KeywordGroup>,
    pub default_age_group: String,

    /// Dosage expressions, matched against lower-cased text
    pub dosage_patterns: Vec<String>,
}

impl Default for EnrichmentConfig {
    fn default() -> Self {
        Self {
            keyword_top_n: 15,
            keyword_cap: 25,
            keyword_min_len: 5,
            stopwords: [
                "their", "there", "these", "those", "which", "where", "while", "after", "before",
                "would", "could", "should",
            ]
            .iter()
            .map(|w| (*w).to_string())
            .collect(),
            entities: EntityPatterns::default(),
            abbreviation_expansion_floor: 3,
            categories: vec![
                KeywordGroup::new(
                    "Infectious Diseases",
                    &[
                        "infection", "infectious", "bacteria", "virus", "antibiotic", "sepsis",
                        "meningitis", "pneumonia",
                    ],
                ),
                KeywordGroup::new(
                    "Respiratory",
                    &["respiratory", "asthma", "lung", "bronch", "pulmonary", "breathing"],
                ),
                KeywordGroup::new(
                    "Cardiovascular",
                    &["cardiac", "heart", "cardiovascular", "murmur", "hypertension", "circulation"],
                ),
                KeywordGroup::new(
                    "Gastroenterology",
                    &["gastro", "digestive", "liver", "intestinal", "stomach", "bowel", "hepatic"],
                ),
                KeywordGroup::new(
                    "Neurology",
                    &["neuro", "seizure", "brain", "nervous", "epilepsy", "cerebral"],
                ),
                KeywordGroup::new(
                    "Nephrology/Urology",
                    &["kidney", "renal", "urologic", "urology", "urinary", "bladder"],
                ),
                KeywordGroup::new(
                    "Endocrinology",
                    &["endocrine", "diabetes", "hormone", "thyroid", "adrenal", "insulin"],
                ),
                KeywordGroup::new(
                    "Hematology/Oncology",
                    &["hematology", "blood", "anemia", "leukemia", "cancer", "oncology", "lymphoma"],
                ),
                KeywordGroup::new(
                    "Dermatology",
                    &["dermatology", "skin", "rash", "eczema", "dermatitis", "lesion"],
                ),
                KeywordGroup::new(
                    "Adolescent Medicine",
                    &["adolescent", "puberty", "teenager", "teen"],
                ),
                KeywordGroup::new("Neonatology", &["newborn", "neonatal", "neonate", "birth"]),
                KeywordGroup::new(
                    "Growth and Development",
                    &["growth", "development", "developmental", "milestone"],
                ),
            ],
            default_category: "General Pediatrics".to_string(),
            age_groups: vec![
                KeywordGroup::new(
                    "Newborn (0-28 days)",
                    &["newborn", "neonatal", "neonate", "birth"],
                ),
                KeywordGroup::new("Infant (1-12 months)", &["infant", "infancy"]),
                KeywordGroup::new("Toddler (1-3 years)", &["toddler"]),
                KeywordGroup::new("Preschool (3-5 years)", &["preschool"]),
                KeywordGroup::new(
                    "School Age (5-12 years)",
                    &["school age", "school-age", "child"],
                ),
                KeywordGroup::new(
                    "Adolescent (12-18 years)",
                    &["adolescent", "teen", "puberty"],
                ),
            ],
            default_age_group: "All Ages".to_string(),
            dosage_patterns: vec![
                r"\d+\s*(?:mg|g|ml|mcg|units?)/kg".to_string(),
                r"\d+\s*(?:mg|g|ml|mcg|units?)\s*(?:per|/)\s*(?:kg|day)".to_string(),
                r"\d+\s*(?:mg|g|ml|mcg|units?)\s*(?:daily|bid|tid|qid)".to_string(),
            ],
        }
    }
}

impl EnrichmentConfig {
    fn validate(&self) -> Result<()> {
        if self.keyword_cap == 0 {
            return Err(ChunkerError::invalid_config("keyword_cap must be > 0"));
        }
        if self.keyword_min_len == 0 {
            return Err(ChunkerError::invalid_config("keyword_min_len must be > 0"));
        }
        Ok(())
    }
}
