//! Heading-tree reconstruction.
//!
//! Headings arrive as a flat, document-ordered stream of candidates. The
//! tree is rebuilt with a monotonic stack: a new heading closes every open
//! heading at the same or a deeper level and becomes a child of whatever is
//! left on top. Nodes live in a single arena (`Vec<TocNode>`), addressed by
//! [`NodeId`], with parent links pointing strictly backwards.

use crate::classifier::{LineClassifier, LineKind};
use crate::text::RawText;
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

const NODE_ID_PREFIX: &str = "TOC_";

/// Arena index of a ToC node, rendered as `TOC_000042`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{NODE_ID_PREFIX}{:06}", self.0)
    }
}

impl FromStr for NodeId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix(NODE_ID_PREFIX)
            .and_then(|digits| digits.parse::<usize>().ok())
            .map(Self)
            .ok_or_else(|| format!("invalid node id: {s}"))
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// A heading line recognized by the classifier, before tree building
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingCandidate {
    pub level: u8,
    pub kind: LineKind,
    pub title: String,
    pub number: Option<String>,
    /// Byte offset of the heading line
    pub start_offset: usize,
}

/// Result of a single classification pass over the document
#[derive(Debug, Clone, Default)]
pub struct HeadingScan {
    /// Headings in document order
    pub candidates: Vec<HeadingCandidate>,
    /// Kind per physical line; folded continuation lines carry their
    /// heading's kind
    pub line_kinds: Vec<LineKind>,
}

/// Classify every line once and collect heading candidates.
///
/// A continuation line folded into a PART or Chapter title is consumed and
/// never classified on its own.
#[must_use]
pub fn scan_headings(raw: &RawText, classifier: &LineClassifier) -> HeadingScan {
    let lines: Vec<&str> = raw
        .lines()
        .iter()
        .map(|span| raw.line(*span).trim())
        .collect();

    let mut scan = HeadingScan {
        candidates: Vec::new(),
        line_kinds: vec![LineKind::Plain; lines.len()],
    };

    let mut index = 0;
    while index < lines.len() {
        let class = classifier.classify_at(&lines, index);
        scan.line_kinds[index] = class.kind;
        let mut next = index + 1;

        if let Some(level) = class.kind.heading_level() {
            if let Some(offset) = class.continuation {
                let folded = index + 1 + offset;
                scan.line_kinds[folded] = class.kind;
                next = folded + 1;
            }
            scan.candidates.push(HeadingCandidate {
                level,
                kind: class.kind,
                title: class.title,
                number: class.number,
                start_offset: raw.lines()[index].start,
            });
        }

        index = next;
    }

    log::debug!(
        "Classified {} lines, {} heading candidates",
        lines.len(),
        scan.candidates.len()
    );
    scan
}

/// One heading occurrence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TocNode {
    pub id: NodeId,
    pub level: u8,
    pub kind: LineKind,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<String>,
    pub start_offset: usize,
    pub end_offset: usize,
    pub parent_id: Option<NodeId>,
}

/// The reconstructed heading forest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Toc {
    nodes: Vec<TocNode>,
}

impl Toc {
    /// Build the forest from document-ordered candidates.
    ///
    /// Each node's span runs to the next node's start at any level; the last
    /// node ends at `doc_len`.
    #[must_use]
    pub fn build(candidates: Vec<HeadingCandidate>, doc_len: usize) -> Self {
        let mut nodes: Vec<TocNode> = Vec::with_capacity(candidates.len());
        let mut stack: Vec<(u8, NodeId)> = Vec::new();

        for candidate in candidates {
            while stack
                .last()
                .is_some_and(|(level, _)| *level >= candidate.level)
            {
                stack.pop();
            }

            let id = NodeId(nodes.len());
            nodes.push(TocNode {
                id,
                level: candidate.level,
                kind: candidate.kind,
                title: candidate.title,
                number: candidate.number,
                start_offset: candidate.start_offset,
                end_offset: doc_len,
                parent_id: stack.last().map(|(_, parent)| *parent),
            });
            stack.push((candidate.level, id));
        }

        for i in 1..nodes.len() {
            nodes[i - 1].end_offset = nodes[i].start_offset;
        }

        Self { nodes }
    }

    #[must_use]
    pub fn nodes(&self) -> &[TocNode] {
        &self.nodes
    }

    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&TocNode> {
        self.nodes.get(id.0)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The node itself, then each parent up to its root
    pub fn ancestors(&self, id: NodeId) -> impl Iterator<Item = &TocNode> + '_ {
        std::iter::successors(self.get(id), move |node| {
            node.parent_id.and_then(|parent| self.get(parent))
        })
    }

    /// Titles from the root down to `id`
    #[must_use]
    pub fn path_titles(&self, id: NodeId) -> Vec<&str> {
        let mut titles: Vec<&str> = self.ancestors(id).map(|node| node.title.as_str()).collect();
        titles.reverse();
        titles
    }

    /// Nearest level-2 node on the ancestor path, `id` included
    #[must_use]
    pub fn chapter_of(&self, id: NodeId) -> Option<&TocNode> {
        self.ancestors(id).find(|node| node.level == 2)
    }

    /// Deepest level present, if any
    #[must_use]
    pub fn max_depth(&self) -> Option<u8> {
        self.nodes.iter().map(|node| node.level).max()
    }
}
