use super::buffer::shift_offset;

/// Lexical role of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunKind {
    Text,
    /// `<`, `</`, `>`, `/>`, `<!--`, `-->` and similar.
    TagDelimiter,
    Name,
    Whitespace,
    AttrEquals,
    AttrQuote,
    AttrValue,
    /// Comment, doctype and bogus-tag content.
    RawTagText,
    /// Zero-length marker for a sub-fragment closed without characters.
    Null,
    /// Zero-length marker closing a tag.
    Sentinel,
}

/// Text classification of a content run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextClass {
    Plain,
    Space,
    NewLine,
    Tab,
    NonBreakingSpace,
    /// Decoded payload differs from the source span (character references,
    /// replaced NUL).
    Literal,
}

impl TextClass {
    pub fn is_collapsible(self) -> bool {
        matches!(self, TextClass::Space | TextClass::NewLine | TextClass::Tab)
    }
}

/// Immutable span of the shared buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Run {
    kind: RunKind,
    class: TextClass,
    start: usize,
    len: usize,
    literal: Option<char>,
}

impl Run {
    pub fn kind(&self) -> RunKind {
        self.kind
    }

    pub fn class(&self) -> TextClass {
        self.class
    }

    pub fn start(&self) -> usize {
        self.start
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn end(&self) -> usize {
        self.start + self.len
    }

    /// Decoded character for literal runs.
    pub fn literal(&self) -> Option<char> {
        self.literal
    }

    /// Whether the run contributes characters to a fragment's text.
    pub fn is_text_bearing(&self) -> bool {
        self.len > 0
    }

    /// Source text of the run. Empty if the run lies outside `text`.
    pub fn source<'t>(&self, text: &'t str) -> &'t str {
        text.get(self.start..self.end()).unwrap_or("")
    }
}

/// Append-only run list of the token being built.
#[derive(Debug, Default, Clone)]
pub struct RunStore {
    runs: Vec<Run>,
}

impl RunStore {
    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Run> {
        self.runs.get(index)
    }

    pub fn as_slice(&self) -> &[Run] {
        &self.runs
    }

    /// Runs in `[head, tail)`, clamped to the store.
    pub fn range(&self, head: usize, tail: usize) -> &[Run] {
        let tail = tail.min(self.runs.len());
        self.runs.get(head.min(tail)..tail).unwrap_or(&[])
    }

    pub(crate) fn append(&mut self, kind: RunKind, class: TextClass, start: usize, end: usize) {
        debug_assert!(end > start, "content runs are never empty");
        self.runs.push(Run {
            kind,
            class,
            start,
            len: end - start,
            literal: None,
        });
    }

    pub(crate) fn append_literal(&mut self, kind: RunKind, start: usize, end: usize, ch: char) {
        debug_assert!(end > start);
        self.runs.push(Run {
            kind,
            class: TextClass::Literal,
            start,
            len: end - start,
            literal: Some(ch),
        });
    }

    pub(crate) fn append_null(&mut self, at: usize) {
        self.push_marker(RunKind::Null, at);
    }

    pub(crate) fn append_sentinel(&mut self, at: usize) {
        self.push_marker(RunKind::Sentinel, at);
    }

    fn push_marker(&mut self, kind: RunKind, at: usize) {
        self.runs.push(Run {
            kind,
            class: TextClass::Plain,
            start: at,
            len: 0,
            literal: None,
        });
    }

    /// Drops the first `count` runs; the rest move to the front.
    pub(crate) fn drain_front(&mut self, count: usize) {
        let count = count.min(self.runs.len());
        self.runs.drain(..count);
    }

    pub(crate) fn rebase(&mut self, delta: isize) {
        for run in &mut self.runs {
            run.start = shift_offset(run.start, delta);
        }
    }

    pub(crate) fn clear(&mut self) {
        self.runs.clear();
    }
}
