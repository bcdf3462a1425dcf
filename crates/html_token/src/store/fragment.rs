use std::borrow::Cow;

use super::buffer::shift_offset;
use super::run::{Run, RunStore, TextClass};

/// How a fragment's runs are turned into text.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ReadMode {
    /// Source characters as they appear in the input.
    Source,
    /// Literal runs replaced by their decoded character.
    #[default]
    Decoded,
    /// Decoded, with each stretch of spaces, tabs and newlines written as a
    /// single space.
    Collapsed,
}

/// A logical string made of the runs `[head, tail)`.
///
/// `head_offset` is the buffer offset where the fragment was opened, so an
/// absent fragment still has a position.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Fragment {
    head: usize,
    head_offset: usize,
    tail: usize,
}

impl Fragment {
    pub(crate) fn open(head: usize, head_offset: usize) -> Self {
        Self {
            head,
            head_offset,
            tail: head,
        }
    }

    pub(crate) fn extend(&mut self, tail: usize) {
        debug_assert!(tail >= self.head);
        self.tail = tail;
    }

    pub(crate) fn truncate(&mut self, tail: usize) {
        self.tail = tail.clamp(self.head, self.tail);
    }

    pub(crate) fn shift_runs(&mut self, count: usize) {
        self.head = self.head.saturating_sub(count);
        self.tail = self.tail.saturating_sub(count);
    }

    pub(crate) fn rebase(&mut self, delta: isize) {
        self.head_offset = shift_offset(self.head_offset, delta);
    }

    pub fn head(&self) -> usize {
        self.head
    }

    pub fn tail(&self) -> usize {
        self.tail
    }

    pub fn head_offset(&self) -> usize {
        self.head_offset
    }

    pub fn run_count(&self) -> usize {
        self.tail - self.head
    }

    /// No run at all was appended: the sub-part never appeared.
    pub fn is_absent(&self) -> bool {
        self.head == self.tail
    }

    /// No text-bearing run was appended. Null runs keep a present but
    /// empty fragment distinguishable from an absent one.
    pub fn is_empty(&self, runs: &RunStore) -> bool {
        !self.runs(runs).iter().any(Run::is_text_bearing)
    }

    /// Exactly one text-bearing run whose source is its text.
    pub fn is_contiguous(&self, runs: &RunStore) -> bool {
        let mut bearing = self.runs(runs).iter().filter(|run| run.is_text_bearing());
        matches!(
            (bearing.next(), bearing.next()),
            (Some(run), None) if run.literal().is_none()
        )
    }

    pub fn runs<'r>(&self, runs: &'r RunStore) -> &'r [Run] {
        runs.range(self.head, self.tail)
    }

    /// Zero-copy text, available when the fragment is empty or contiguous.
    pub fn as_str<'t>(&self, runs: &RunStore, text: &'t str) -> Option<&'t str> {
        let mut bearing = self.runs(runs).iter().filter(|run| run.is_text_bearing());
        match (bearing.next(), bearing.next()) {
            (None, _) => Some(""),
            (Some(run), None) if run.literal().is_none() => Some(run.source(text)),
            _ => None,
        }
    }

    /// Reads the fragment, borrowing the buffer when no rewriting is needed.
    pub fn read<'t>(&self, runs: &RunStore, text: &'t str, mode: ReadMode) -> Cow<'t, str> {
        if let Some(s) = self.as_str(runs, text)
            && (mode != ReadMode::Collapsed || !s.bytes().any(|b| b.is_ascii_whitespace()))
        {
            return Cow::Borrowed(s);
        }
        let mut out = String::new();
        self.write_to(runs, text, mode, &mut out);
        Cow::Owned(out)
    }

    pub fn write_to(&self, runs: &RunStore, text: &str, mode: ReadMode, out: &mut String) {
        let mut in_space = false;
        for piece in self.pieces(runs, text) {
            match (mode, piece) {
                (ReadMode::Source, TextPiece::Source { text, .. })
                | (ReadMode::Source, TextPiece::Literal { source: text, .. }) => out.push_str(text),
                (ReadMode::Collapsed, TextPiece::Source { class, .. }) if class.is_collapsible() => {
                    if !in_space {
                        out.push(' ');
                        in_space = true;
                    }
                }
                (_, TextPiece::Source { text, .. }) => {
                    in_space = false;
                    out.push_str(text);
                }
                (_, TextPiece::Literal { ch, .. }) => {
                    in_space = false;
                    out.push(ch);
                }
            }
        }
    }

    /// Cursor over the text-bearing runs.
    pub fn pieces<'r, 't>(&self, runs: &'r RunStore, text: &'t str) -> Pieces<'r, 't> {
        Pieces {
            runs: self.runs(runs).iter(),
            text,
        }
    }
}

/// One step of a fragment cursor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextPiece<'t> {
    Source { text: &'t str, class: TextClass },
    Literal { ch: char, source: &'t str },
}

pub struct Pieces<'r, 't> {
    runs: std::slice::Iter<'r, Run>,
    text: &'t str,
}

impl<'t> Iterator for Pieces<'_, 't> {
    type Item = TextPiece<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let run = self.runs.next()?;
            if !run.is_text_bearing() {
                continue;
            }
            let source = run.source(self.text);
            return Some(match run.literal() {
                Some(ch) => TextPiece::Literal { ch, source },
                None => TextPiece::Source {
                    text: source,
                    class: run.class(),
                },
            });
        }
    }
}
