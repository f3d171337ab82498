//! Line classification.
//!
//! A [`LineClassifier`] is an ordered list of [`LineRule`]s; the first rule
//! that accepts a line decides its [`LineKind`]. Heading rules come first,
//! so a numbered or chapter heading always beats an all-caps reading of the
//! same line.

use crate::config::ClassifierConfig;
use crate::error::{compile_pattern, Result};
use crate::types::BlockKind;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// What a single line is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    /// "PART IV"
    Part,
    /// "Chapter 12"
    Chapter,
    /// "3.2 Clinical Manifestations"
    Numbered,
    /// "DIAGNOSIS AND TREATMENT"
    AllCaps,
    /// Short capitalized line between blank lines
    TitleCase,
    /// Figure caption start
    Figure,
    /// Table caption or delimiter-dense region
    Table,
    /// Bullet or enumerated item start
    Bullet,
    /// Prose
    Plain,
}

impl LineKind {
    /// ToC level for heading kinds (1 = part ... 5 = title case)
    #[must_use]
    pub const fn heading_level(self) -> Option<u8> {
        match self {
            Self::Part => Some(1),
            Self::Chapter => Some(2),
            Self::Numbered => Some(3),
            Self::AllCaps => Some(4),
            Self::TitleCase => Some(5),
            Self::Figure | Self::Table | Self::Bullet | Self::Plain => None,
        }
    }

    /// Block tag for an atomic block starting with this kind of line
    #[must_use]
    pub const fn block_kind(self) -> BlockKind {
        match self {
            Self::Part | Self::Chapter | Self::Numbered | Self::AllCaps | Self::TitleCase => {
                BlockKind::Heading
            }
            Self::Figure => BlockKind::Figure,
            Self::Table => BlockKind::Table,
            Self::Bullet => BlockKind::Bullet,
            Self::Plain => BlockKind::Paragraph,
        }
    }
}

/// Trimmed view of one line and its neighbours
#[derive(Debug, Clone, Copy)]
pub struct LineWindow<'a> {
    pub line: &'a str,
    /// `None` for the first line of the document
    pub previous: Option<&'a str>,
    /// Up to `lookahead` following lines
    pub following: &'a [&'a str],
}

impl<'a> LineWindow<'a> {
    /// Build the window for `lines[index]`
    #[must_use]
    pub fn at(lines: &'a [&'a str], index: usize, lookahead: usize) -> Self {
        let end = index.saturating_add(1).saturating_add(lookahead).min(lines.len());
        Self {
            line: lines[index],
            previous: index.checked_sub(1).map(|prev| lines[prev]),
            following: &lines[(index + 1).min(end)..end],
        }
    }

    /// First non-blank following line and its position in `following`
    fn next_non_blank(&self) -> Option<(usize, &'a str)> {
        self.following
            .iter()
            .enumerate()
            .find(|(_, line)| !line.is_empty())
            .map(|(idx, line)| (idx, *line))
    }
}

/// Outcome of classifying one line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClass {
    pub kind: LineKind,
    /// Normalized heading text (empty for non-headings)
    pub title: String,
    /// Captured identifier: roman numeral, chapter or section number
    pub number: Option<String>,
    /// Index into `LineWindow::following` of a line folded into the title
    pub continuation: Option<usize>,
}

impl LineClass {
    fn plain() -> Self {
        Self::marker(LineKind::Plain)
    }

    fn marker(kind: LineKind) -> Self {
        Self {
            kind,
            title: String::new(),
            number: None,
            continuation: None,
        }
    }
}

/// One entry of the priority list
pub trait LineRule: Send + Sync {
    fn kind(&self) -> LineKind;

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass>;
}

/// "PART n" / "Chapter n" alone on a line, optionally followed by a short
/// title line that is folded into the heading
struct CaptionedHeadingRule {
    kind: LineKind,
    pattern: Regex,
    separator: &'static str,
    vetoes: Vec<Regex>,
    continuation_max_chars: usize,
}

impl LineRule for CaptionedHeadingRule {
    fn kind(&self) -> LineKind {
        self.kind
    }

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass> {
        let caps = self.pattern.captures(window.line)?;
        let number = caps.get(1).map(|m| m.as_str().to_string());

        let mut title = window.line.to_string();
        let mut continuation = None;
        if let Some((idx, next)) = window.next_non_blank() {
            let short = next.chars().count() < self.continuation_max_chars;
            if short && !self.vetoes.iter().any(|veto| veto.is_match(next)) {
                title.push_str(self.separator);
                title.push_str(next);
                continuation = Some(idx);
            }
        }

        Some(LineClass {
            kind: self.kind,
            title,
            number,
            continuation,
        })
    }
}

struct NumberedRule {
    pattern: Regex,
}

impl LineRule for NumberedRule {
    fn kind(&self) -> LineKind {
        LineKind::Numbered
    }

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass> {
        let caps = self.pattern.captures(window.line)?;
        let number = caps.get(1).map(|m| m.as_str().to_string());
        let title = caps
            .get(2)
            .map_or(window.line, |m| m.as_str())
            .trim()
            .to_string();
        Some(LineClass {
            kind: LineKind::Numbered,
            title,
            number,
            continuation: None,
        })
    }
}

struct AllCapsRule {
    pattern: Regex,
    exclusions: Vec<String>,
}

impl LineRule for AllCapsRule {
    fn kind(&self) -> LineKind {
        LineKind::AllCaps
    }

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass> {
        if !self.pattern.is_match(window.line) {
            return None;
        }
        if self
            .exclusions
            .iter()
            .any(|needle| window.line.contains(needle.as_str()))
        {
            return None;
        }
        Some(LineClass {
            kind: LineKind::AllCaps,
            title: window.line.to_string(),
            number: None,
            continuation: None,
        })
    }
}

struct TitleCaseRule {
    pattern: Regex,
    min_chars: usize,
    max_chars: usize,
}

impl LineRule for TitleCaseRule {
    fn kind(&self) -> LineKind {
        LineKind::TitleCase
    }

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass> {
        let blank_above = window.previous.is_some_and(str::is_empty);
        let blank_below = window.following.first().is_some_and(|next| next.is_empty());
        if !blank_above || !blank_below {
            return None;
        }
        let len = window.line.chars().count();
        if len < self.min_chars || len > self.max_chars || !self.pattern.is_match(window.line) {
            return None;
        }
        Some(LineClass {
            kind: LineKind::TitleCase,
            title: window.line.to_string(),
            number: None,
            continuation: None,
        })
    }
}

/// Figure and bullet starts: any pattern on the line itself
struct MarkerRule {
    kind: LineKind,
    patterns: Vec<Regex>,
}

impl LineRule for MarkerRule {
    fn kind(&self) -> LineKind {
        self.kind
    }

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass> {
        self.patterns
            .iter()
            .any(|pattern| pattern.is_match(window.line))
            .then(|| LineClass::marker(self.kind))
    }
}

/// Table caption, or a run of lines dense with tab/pipe delimiters
struct TableRule {
    patterns: Vec<Regex>,
    min_tabs: usize,
    min_pipes: usize,
}

impl LineRule for TableRule {
    fn kind(&self) -> LineKind {
        LineKind::Table
    }

    fn classify(&self, window: &LineWindow<'_>) -> Option<LineClass> {
        if self.patterns.iter().any(|p| p.is_match(window.line)) {
            return Some(LineClass::marker(LineKind::Table));
        }
        // Density is measured up to the next blank line only
        let (tabs, pipes) = std::iter::once(window.line)
            .chain(window.following.iter().copied().take_while(|line| !line.is_empty()))
            .fold((0usize, 0usize), |(tabs, pipes), line| {
                (
                    tabs + line.matches('\t').count(),
                    pipes + line.matches('|').count(),
                )
            });
        (tabs > self.min_tabs || pipes > self.min_pipes).then(|| LineClass::marker(LineKind::Table))
    }
}

/// Ordered rule list; first match wins
pub struct LineClassifier {
    rules: Vec<Box<dyn LineRule>>,
    lookahead: usize,
}

impl LineClassifier {
    /// Compile the default rule order from configuration
    pub fn new(config: &ClassifierConfig) -> Result<Self> {
        let part = compile_pattern("classifier.part_pattern", &config.part_pattern)?;
        let chapter = compile_pattern("classifier.chapter_pattern", &config.chapter_pattern)?;
        let numbered = compile_pattern("classifier.numbered_pattern", &config.numbered_pattern)?;
        let continuation_vetoes = vec![part.clone(), chapter.clone(), numbered.clone()];

        let rules: Vec<Box<dyn LineRule>> = vec![
            Box::new(CaptionedHeadingRule {
                kind: LineKind::Part,
                pattern: part,
                separator: " ",
                vetoes: continuation_vetoes.clone(),
                continuation_max_chars: config.continuation_max_chars,
            }),
            Box::new(CaptionedHeadingRule {
                kind: LineKind::Chapter,
                pattern: chapter,
                separator: ": ",
                vetoes: continuation_vetoes,
                continuation_max_chars: config.continuation_max_chars,
            }),
            Box::new(NumberedRule { pattern: numbered }),
            Box::new(AllCapsRule {
                pattern: compile_pattern("classifier.all_caps_pattern", &config.all_caps_pattern)?,
                exclusions: config.heading_exclusions.clone(),
            }),
            Box::new(TitleCaseRule {
                pattern: compile_pattern(
                    "classifier.title_case_pattern",
                    &config.title_case_pattern,
                )?,
                min_chars: config.title_case_min_chars,
                max_chars: config.title_case_max_chars,
            }),
            Box::new(MarkerRule {
                kind: LineKind::Figure,
                patterns: compile_all("classifier.figure_patterns", &config.figure_patterns)?,
            }),
            Box::new(TableRule {
                patterns: compile_all("classifier.table_patterns", &config.table_patterns)?,
                min_tabs: config.table_min_tabs,
                min_pipes: config.table_min_pipes,
            }),
            Box::new(MarkerRule {
                kind: LineKind::Bullet,
                patterns: compile_all("classifier.bullet_patterns", &config.bullet_patterns)?,
            }),
        ];

        Ok(Self::with_rules(rules, config.lookahead_lines))
    }

    /// Custom rule order
    #[must_use]
    pub fn with_rules(rules: Vec<Box<dyn LineRule>>, lookahead: usize) -> Self {
        Self { rules, lookahead }
    }

    #[must_use]
    pub const fn lookahead(&self) -> usize {
        self.lookahead
    }

    /// Kinds in priority order
    #[must_use]
    pub fn rule_order(&self) -> Vec<LineKind> {
        self.rules.iter().map(|rule| rule.kind()).collect()
    }

    /// Classify `lines[index]`; `lines` are already trimmed
    #[must_use]
    pub fn classify_at(&self, lines: &[&str], index: usize) -> LineClass {
        self.classify(&LineWindow::at(lines, index, self.lookahead))
    }

    #[must_use]
    pub fn classify(&self, window: &LineWindow<'_>) -> LineClass {
        if window.line.is_empty() {
            return LineClass::plain();
        }
        self.rules
            .iter()
            .find_map(|rule| rule.classify(window))
            .unwrap_or_else(LineClass::plain)
    }
}

fn compile_all(scope: &str, patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|pattern| compile_pattern(scope, pattern))
        .collect()
}
