use crate::text::{word_count, RawText};
use crate::toc::{NodeId, Toc, TocNode};
use std::collections::HashSet;

/// Title of the synthetic section holding text before the first heading
pub const FRONT_MATTER_TITLE: &str = "Front Matter";

/// Title of the synthetic section used when no heading was found
pub const WHOLE_DOCUMENT_TITLE: &str = "Full Text";

/// Smallest heading-delimited unit handed to the chunker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafSection {
    /// `None` for synthetic sections (front matter, whole document)
    pub node: Option<NodeId>,
    pub parent: Option<NodeId>,
    pub title: String,
    pub start: usize,
    pub end: usize,
}

impl LeafSection {
    fn from_node(node: &TocNode) -> Self {
        Self {
            node: Some(node.id),
            parent: node.parent_id,
            title: node.title.clone(),
            start: node.start_offset,
            end: node.end_offset,
        }
    }

    fn synthetic(title: &str, start: usize, end: usize) -> Self {
        Self {
            node: None,
            parent: None,
            title: title.to_string(),
            start,
            end,
        }
    }
}

/// Nodes never referenced as a parent, ordered by start offset
#[must_use]
pub fn resolve_leaves(toc: &Toc) -> Vec<&TocNode> {
    let parents: HashSet<NodeId> = toc.nodes().iter().filter_map(|n| n.parent_id).collect();
    let mut leaves: Vec<&TocNode> = toc
        .nodes()
        .iter()
        .filter(|node| !parents.contains(&node.id))
        .collect();
    leaves.sort_by_key(|node| node.start_offset);
    leaves
}

/// Leaf sections covering the document.
///
/// With an empty ToC the whole document is one synthetic section. Otherwise
/// text before the first heading becomes a front-matter section when
/// `keep_preamble` is set.
#[must_use]
pub fn leaf_sections(toc: &Toc, doc_len: usize, keep_preamble: bool) -> Vec<LeafSection> {
    let Some(first) = toc.nodes().first() else {
        return vec![LeafSection::synthetic(WHOLE_DOCUMENT_TITLE, 0, doc_len)];
    };

    let mut sections = Vec::new();
    if keep_preamble && first.start_offset > 0 {
        sections.push(LeafSection::synthetic(FRONT_MATTER_TITLE, 0, first.start_offset));
    }
    sections.extend(resolve_leaves(toc).into_iter().map(LeafSection::from_node));
    sections
}

/// Unit of chunking: one leaf section, possibly preceded by small siblings
/// merged into it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionGroup {
    /// Section that closed the group; supplies title and id
    pub anchor: LeafSection,
    /// Byte span from the first merged section to the anchor's end
    pub start: usize,
    pub end: usize,
    /// Ids of every real section in the group, in order
    pub members: Vec<NodeId>,
}

impl SectionGroup {
    #[must_use]
    pub fn is_merged(&self) -> bool {
        self.members.len() > 1
    }
}

struct MergeBuffer<'a> {
    sections: Vec<&'a LeafSection>,
    parent: Option<NodeId>,
}

impl<'a> MergeBuffer<'a> {
    fn into_group(self, anchor: &'a LeafSection) -> SectionGroup {
        let start = self.sections.first().map_or(anchor.start, |s| s.start);
        let members = self
            .sections
            .iter()
            .chain(std::iter::once(&anchor))
            .filter_map(|s| s.node)
            .collect();
        SectionGroup {
            anchor: anchor.clone(),
            start,
            end: anchor.end,
            members,
        }
    }

    /// Flush without a following section; the last buffered one anchors
    fn flush_alone(mut self) -> Option<SectionGroup> {
        let anchor = self.sections.pop()?;
        Some(self.into_group(anchor))
    }
}

/// Merge small leaf sections forward into the next sibling.
///
/// A section below `small_words` is buffered when the next leaf shares its
/// parent. Buffers never cross a parent boundary: a buffer facing a section
/// with a different parent is flushed on its own. Blank sections are skipped.
/// Consecutive leaves with one parent are adjacent in the text, so a group's
/// text is the raw slice `start..end`.
#[must_use]
pub fn merge_small_sections(
    raw: &RawText,
    sections: &[LeafSection],
    small_words: usize,
) -> Vec<SectionGroup> {
    let mut groups = Vec::new();
    let mut buffer: Option<MergeBuffer<'_>> = None;

    for (i, section) in sections.iter().enumerate() {
        let text = raw.slice(section.start..section.end);
        if text.trim().is_empty() {
            continue;
        }

        if buffer.as_ref().is_some_and(|b| b.parent != section.parent) {
            if let Some(group) = buffer.take().and_then(MergeBuffer::flush_alone) {
                groups.push(group);
            }
        }

        let words = word_count(text);
        let next_is_sibling = sections
            .get(i + 1)
            .is_some_and(|next| next.parent == section.parent);

        if words < small_words && next_is_sibling {
            log::debug!("Buffering small section '{}' ({words} words)", section.title);
            buffer
                .get_or_insert_with(|| MergeBuffer {
                    sections: Vec::new(),
                    parent: section.parent,
                })
                .sections
                .push(section);
            continue;
        }

        let group = match buffer.take() {
            Some(buffered) => buffered.into_group(section),
            None => MergeBuffer {
                sections: Vec::new(),
                parent: section.parent,
            }
            .into_group(section),
        };
        if group.is_merged() {
            log::debug!(
                "Merged {} sections into '{}'",
                group.members.len(),
                section.title
            );
        }
        groups.push(group);
    }

    if let Some(group) = buffer.and_then(MergeBuffer::flush_alone) {
        groups.push(group);
    }

    groups
}
