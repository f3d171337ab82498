//! Per-chunk metadata: entities, keywords, category, age group, dosages.
//!
//! Every vocabulary comes from [`EnrichmentConfig`] and is compiled once in
//! [`Enricher::new`], so two enrichers with different tables can run side by
//! side.

use crate::config::{EnrichmentConfig, KeywordGroup};
use crate::error::{compile_pattern, Result};
use crate::types::{EntityCategory, EntitySet};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Everything derived from one chunk's text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Enrichment {
    pub keywords: Vec<String>,
    pub entities: EntitySet,
    pub category: String,
    pub age_group: String,
    pub dosages: Vec<String>,
}

struct LookupTable {
    groups: Vec<KeywordGroup>,
    fallback: String,
}

impl LookupTable {
    fn new(groups: &[KeywordGroup], fallback: &str) -> Self {
        let groups = groups
            .iter()
            .map(|group| KeywordGroup {
                name: group.name.clone(),
                terms: group.terms.iter().map(|t| t.to_lowercase()).collect(),
            })
            .collect();
        Self {
            groups,
            fallback: fallback.to_string(),
        }
    }

    /// First group with a term occurring in `lowered`
    fn lookup(&self, lowered: &str) -> &str {
        self.groups
            .iter()
            .find(|group| group.terms.iter().any(|term| lowered.contains(term.as_str())))
            .map_or(self.fallback.as_str(), |group| group.name.as_str())
    }
}

/// Compiled enrichment vocabularies
pub struct Enricher {
    lexical: Vec<(EntityCategory, Regex)>,
    abbreviations: Regex,
    expansion_floor: usize,
    word: Regex,
    stopwords: HashSet<String>,
    top_n: usize,
    cap: usize,
    categories: LookupTable,
    age_groups: LookupTable,
    dosages: Vec<Regex>,
}

impl Enricher {
    pub fn new(config: &EnrichmentConfig) -> Result<Self> {
        let patterns = &config.entities;
        let lexical = [
            (EntityCategory::Diseases, &patterns.diseases),
            (EntityCategory::Drugs, &patterns.drugs),
            (EntityCategory::Organisms, &patterns.organisms),
            (EntityCategory::Labs, &patterns.labs),
            (EntityCategory::Procedures, &patterns.procedures),
            (EntityCategory::Vaccines, &patterns.vaccines),
        ]
        .into_iter()
        .map(|(category, pattern)| {
            let scope = format!("enrichment.entities.{}", category.as_str());
            compile_pattern(&scope, pattern).map(|regex| (category, regex))
        })
        .collect::<Result<Vec<_>>>()?;

        let word = format!(r"\b[a-z]{{{},}}\b", config.keyword_min_len);

        Ok(Self {
            lexical,
            abbreviations: compile_pattern(
                "enrichment.entities.abbreviations",
                &patterns.abbreviations,
            )?,
            expansion_floor: config.abbreviation_expansion_floor,
            word: compile_pattern("enrichment.keyword_min_len", &word)?,
            stopwords: config.stopwords.iter().map(|w| w.to_lowercase()).collect(),
            top_n: config.keyword_top_n,
            cap: config.keyword_cap,
            categories: LookupTable::new(&config.categories, &config.default_category),
            age_groups: LookupTable::new(&config.age_groups, &config.default_age_group),
            dosages: config
                .dosage_patterns
                .iter()
                .map(|pattern| compile_pattern("enrichment.dosage_patterns", pattern))
                .collect::<Result<_>>()?,
        })
    }

    /// Run every extractor over `text`
    #[must_use]
    pub fn enrich(&self, text: &str) -> Enrichment {
        let lowered = text.to_lowercase();
        let entities = self.entities(text);
        Enrichment {
            keywords: self.keywords_lowered(&lowered, &entities),
            category: self.categories.lookup(&lowered).to_string(),
            age_group: self.age_groups.lookup(&lowered).to_string(),
            dosages: self.dosages_lowered(&lowered),
            entities,
        }
    }

    /// Entity matches per category.
    ///
    /// Lexical categories are lower-cased so matching is case-insensitive
    /// end to end; abbreviations keep their case and carry a parenthesized
    /// expansion when one longer than the floor follows.
    #[must_use]
    pub fn entities(&self, text: &str) -> EntitySet {
        let mut set = EntitySet::default();

        for (category, regex) in &self.lexical {
            let found: BTreeSet<String> = regex
                .find_iter(text)
                .map(|m| m.as_str().trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect();
            *set.get_mut(*category) = found.into_iter().collect();
        }

        let abbreviations: BTreeSet<String> = self
            .abbreviations
            .captures_iter(text)
            .filter_map(|caps| {
                let abbr = caps.get(1)?.as_str();
                Some(match caps.get(2).map(|m| m.as_str()) {
                    Some(expansion) if expansion.chars().count() > self.expansion_floor => {
                        format!("{abbr} ({expansion})")
                    }
                    _ => abbr.to_string(),
                })
            })
            .collect();
        set.abbreviations = abbreviations.into_iter().collect();

        set
    }

    /// Frequent words plus disease, drug and organism terms, sorted and capped
    #[must_use]
    pub fn keywords(&self, text: &str, entities: &EntitySet) -> Vec<String> {
        self.keywords_lowered(&text.to_lowercase(), entities)
    }

    fn keywords_lowered(&self, lowered: &str, entities: &EntitySet) -> Vec<String> {
        let mut counts: Vec<(&str, usize)> = Vec::new();
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for m in self.word.find_iter(lowered) {
            let word = m.as_str();
            if self.stopwords.contains(word) {
                continue;
            }
            match positions.get(word) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    positions.insert(word, counts.len());
                    counts.push((word, 1));
                }
            }
        }
        // Stable sort keeps first-seen order among equal counts
        counts.sort_by(|a, b| b.1.cmp(&a.1));

        let mut keywords: BTreeSet<String> = counts
            .iter()
            .take(self.top_n)
            .map(|(word, _)| (*word).to_string())
            .collect();
        for category in EntityCategory::KEYWORD_SOURCES {
            keywords.extend(entities.get(category).iter().map(|e| e.to_lowercase()));
        }
        keywords.into_iter().take(self.cap).collect()
    }

    /// First matching medical category, or the default
    #[must_use]
    pub fn category(&self, text: &str) -> &str {
        self.categories.lookup(&text.to_lowercase())
    }

    /// First matching age group, or the default
    #[must_use]
    pub fn age_group(&self, text: &str) -> &str {
        self.age_groups.lookup(&text.to_lowercase())
    }

    /// Dosage expressions, lower-cased, sorted and deduplicated
    #[must_use]
    pub fn dosages(&self, text: &str) -> Vec<String> {
        self.dosages_lowered(&text.to_lowercase())
    }

    fn dosages_lowered(&self, lowered: &str) -> Vec<String> {
        let found: BTreeSet<String> = self
            .dosages
            .iter()
            .flat_map(|regex| regex.find_iter(lowered).map(|m| m.as_str().to_string()))
            .collect();
        found.into_iter().collect()
    }
}

static EDITION_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(\d+)(?:st|nd|rd|th)\s+edition").expect("valid edition regex"),
        Regex::new(r"edition\s+(\d+)").expect("valid edition regex"),
    ]
});

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:copyright\s+)?©\s*(\d{4})").expect("valid year regex"));

/// Edition and copyright year sniffed from the whole book
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub edition: Option<String>,
    pub year: Option<String>,
}

impl BookMetadata {
    #[must_use]
    pub fn extract(text: &str) -> Self {
        let lowered = text.to_lowercase();
        let capture = |regex: &Regex| {
            regex
                .captures(&lowered)
                .and_then(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
        };
        Self {
            edition: EDITION_PATTERNS.iter().find_map(&capture),
            year: capture(&*YEAR_PATTERN),
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.edition.is_none() && self.year.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn enricher() -> Enricher {
        Enricher::new(&EnrichmentConfig::default()).unwrap()
    }

    #[test]
    fn lexical_entities_are_case_insensitive_and_sorted() {
        let entities = enricher().entities(
            "Acetaminophen or ibuprofen; acetaminophen again. Streptococcus infection after surgery.",
        );
        assert_eq!(entities.drugs, vec!["acetaminophen", "ibuprofen"]);
        assert_eq!(entities.organisms, vec!["streptococcus"]);
        assert_eq!(entities.procedures, vec!["surgery"]);
        assert_eq!(entities.diseases, vec!["streptococcus infection"]);
    }

    #[test]
    fn abbreviation_expansions_need_length() {
        let entities = enricher()
            .entities("Urinary tract infection (UTI) and CRP (C-reactive protein) or ABC (abc).");
        assert_eq!(
            entities.abbreviations,
            vec!["ABC", "CRP (C-reactive protein)", "UTI"]
        );
    }

    #[test]
    fn missing_matches_give_empty_lists() {
        let entities = enricher().entities("nothing to see here");
        assert!(entities.is_empty());
    }

    #[test]
    fn keywords_rank_by_frequency_then_first_seen() {
        let config = EnrichmentConfig {
            keyword_top_n: 2,
            ..Default::default()
        };
        let enricher = Enricher::new(&config).unwrap();
        let text = "zebra apple zebra mango apple mango kiwis";
        let keywords = enricher.keywords(text, &EntitySet::default());
        // zebra and apple tie with mango at two; the first two seen win
        assert_eq!(keywords, vec!["apple", "zebra"]);
    }

    #[test]
    fn keywords_merge_entities_and_skip_stopwords() {
        let enricher = enricher();
        let text = "Fever which should resolve. Acetaminophen helps fever.";
        let entities = enricher.entities(text);
        let keywords = enricher.keywords(text, &entities);
        assert_eq!(keywords, vec!["acetaminophen", "fever", "helps", "resolve"]);
    }

    #[test]
    fn keywords_are_capped() {
        let config = EnrichmentConfig {
            keyword_cap: 3,
            ..Default::default()
        };
        let enricher = Enricher::new(&config).unwrap();
        let keywords =
            enricher.keywords("alpha bravo charlie delta echoes foxtrot", &EntitySet::default());
        assert_eq!(keywords, vec!["alpha", "bravo", "charlie"]);
    }

    #[test]
    fn category_and_age_group_take_first_match() {
        let enricher = enricher();
        assert_eq!(
            enricher.category("Pneumonia with asthma in an infant"),
            "Infectious Diseases"
        );
        assert_eq!(enricher.category("General text"), "General Pediatrics");
        assert_eq!(enricher.age_group("The newborn infant"), "Newborn (0-28 days)");
        assert_eq!(enricher.age_group("Routine care"), "All Ages");
    }

    #[test]
    fn dosages_are_extracted() {
        let dosages = enricher().dosages("Give 10 mg/kg then 5 MG per day, or 2 mg bid.");
        assert_eq!(dosages, vec!["10 mg/kg", "2 mg bid", "5 mg per day"]);
    }

    #[test]
    fn enrich_combines_everything() {
        let enrichment = enricher()
            .enrich("Acetaminophen 10-15 mg/kg every 4-6 hours is recommended for newborn fever.");
        assert_eq!(enrichment.entities.drugs, vec!["acetaminophen"]);
        assert!(enrichment.keywords.contains(&"acetaminophen".to_string()));
        assert_eq!(enrichment.dosages, vec!["15 mg/kg"]);
        assert_eq!(enrichment.category, "Neonatology");
        assert_eq!(enrichment.age_group, "Newborn (0-28 days)");
    }

    #[test]
    fn book_metadata_sniffs_edition_and_year() {
        let meta = BookMetadata::extract("Nelson Textbook of Pediatrics, 21st Edition\nCopyright ©2020");
        assert_eq!(meta.edition.as_deref(), Some("21"));
        assert_eq!(meta.year.as_deref(), Some("2020"));
        assert!(BookMetadata::extract("no front matter").is_empty());
    }

    #[test]
    fn invalid_entity_pattern_is_reported() {
        let mut config = EnrichmentConfig::default();
        config.entities.drugs = "(".to_string();
        let err = Enricher::new(&config).err().map(|e| e.to_string());
        assert!(err.is_some_and(|msg| msg.contains("enrichment.entities.drugs")));
    }
}
