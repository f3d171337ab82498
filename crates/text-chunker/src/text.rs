use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::borrow::Cow;
use std::ops::Range;

/// One physical line of the document.
///
/// `start..end` covers the line including its terminator; `content_end`
/// excludes a trailing `\n` or `\r\n`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineSpan {
    pub start: usize,
    pub content_end: usize,
    pub end: usize,
}

/// Where one input part landed in the concatenated text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartInfo {
    /// Caller-supplied label (usually the file name)
    pub name: String,
    /// Byte range in the concatenated text
    pub start: usize,
    pub end: usize,
    /// True when undecodable bytes were replaced
    pub lossy_decoding: bool,
}

/// Immutable concatenation of all input parts plus a line index
#[derive(Debug, Clone)]
pub struct RawText {
    text: String,
    lines: Vec<LineSpan>,
    parts: Vec<PartInfo>,
    warnings: Vec<String>,
}

impl RawText {
    /// Start collecting parts
    #[must_use]
    pub fn builder() -> RawTextBuilder {
        RawTextBuilder::default()
    }

    /// Single in-memory part, mostly for tests and embedding callers
    pub fn from_text(text: &str) -> Result<Self> {
        Self::builder().push_part("memory", text.as_bytes()).build()
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.text.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    #[must_use]
    pub fn lines(&self) -> &[LineSpan] {
        &self.lines
    }

    /// Line content without its terminator
    #[must_use]
    pub fn line(&self, span: LineSpan) -> &str {
        &self.text[span.start..span.content_end]
    }

    #[must_use]
    pub fn slice(&self, range: Range<usize>) -> &str {
        &self.text[range]
    }

    #[must_use]
    pub fn parts(&self) -> &[PartInfo] {
        &self.parts
    }

    /// Non-fatal input problems (skipped parts, lossy decoding)
    #[must_use]
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    /// Hex SHA-256 of the concatenated text
    #[must_use]
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.text.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

/// Collects parts in order and records why any were skipped
#[derive(Debug, Default)]
pub struct RawTextBuilder {
    text: String,
    parts: Vec<PartInfo>,
    warnings: Vec<String>,
}

impl RawTextBuilder {
    /// Append a part. Undecodable bytes become U+FFFD; a missing final
    /// newline is added so the next part starts on its own line.
    #[must_use]
    pub fn push_part(mut self, name: impl Into<String>, bytes: &[u8]) -> Self {
        let name = name.into();
        if bytes.is_empty() {
            log::warn!("Skipping empty part {name}");
            self.warnings.push(format!("Part {name} is empty and was skipped"));
            return self;
        }

        let (decoded, lossy) = decode(bytes);
        if lossy {
            log::warn!("Part {name} contained invalid UTF-8; replaced undecodable bytes");
            self.warnings
                .push(format!("Part {name} contained invalid UTF-8 (replaced)"));
        }

        let start = self.text.len();
        self.text.push_str(&decoded);
        if !decoded.ends_with('\n') {
            self.text.push('\n');
        }
        self.parts.push(PartInfo {
            name,
            start,
            end: self.text.len(),
            lossy_decoding: lossy,
        });
        self
    }

    /// Record a part that could not be read at all
    #[must_use]
    pub fn skip_part(mut self, name: impl Into<String>, reason: impl AsRef<str>) -> Self {
        let name = name.into();
        log::warn!("Skipping part {name}: {}", reason.as_ref());
        self.warnings
            .push(format!("Part {name} skipped: {}", reason.as_ref()));
        self
    }

    /// Finish; fails only when no part contributed text
    pub fn build(self) -> Result<RawText> {
        if self.text.is_empty() {
            return Err(ChunkerError::EmptyInput);
        }
        let lines = index_lines(&self.text);
        Ok(RawText {
            text: self.text,
            lines,
            parts: self.parts,
            warnings: self.warnings,
        })
    }
}

fn decode(bytes: &[u8]) -> (Cow<'_, str>, bool) {
    match std::str::from_utf8(bytes) {
        Ok(text) => (Cow::Borrowed(text), false),
        Err(_) => (String::from_utf8_lossy(bytes), true),
    }
}

fn index_lines(text: &str) -> Vec<LineSpan> {
    let mut lines = Vec::new();
    let mut start = 0;
    for piece in text.split_inclusive('\n') {
        let end = start + piece.len();
        let content = piece
            .strip_suffix('\n')
            .map_or(piece, |rest| rest.strip_suffix('\r').unwrap_or(rest));
        lines.push(LineSpan {
            start,
            content_end: start + content.len(),
            end,
        });
        start = end;
    }
    lines
}

/// Whitespace-delimited word count, the budget unit for chunking
#[must_use]
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}
