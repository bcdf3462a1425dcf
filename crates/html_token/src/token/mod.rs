//! The token record the builder mutates in place.
//!
//! One [`Token`] lives for the whole document. It is reset between tokens,
//! and its fragments point into the tokenizer's buffer, so anything a
//! consumer wants to keep past the next `parse()` must be copied out with
//! [`TokenView::to_owned_token`] or a [`TokenAssembler`].

mod owned;
mod progress;
mod view;

use encoding_rs::Encoding;

pub use owned::{OwnedAttribute, OwnedTag, OwnedToken, TokenAssembler};
pub use progress::{AttrProgress, Major, Piece, TagProgress};
pub use view::{AttributeView, TokenView};

use crate::names::{AttrId, TagId};
use crate::store::{Fragment, RunKind, RunStore, TextClass, shift_offset};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    Text,
    Tag,
    EndOfFile,
    /// The input stage switched encodings; see [`Token::encoding`].
    EncodingChange,
    /// The pipeline restarted from the beginning of the input.
    Restart,
    /// Injected markup begins; the consumer closes its open elements.
    OverlappedClose,
    /// Injected markup ended; the consumer reopens what it closed.
    OverlappedReopen,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TagFlags {
    pub end_tag: bool,
    /// `<br/>` style tag.
    pub empty_element: bool,
    /// The text directly before the tag ended in whitespace.
    pub after_space: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeEntry {
    id: AttrId,
    name: Fragment,
    value: Fragment,
    quote: Option<char>,
    progress: AttrProgress,
    start_offset: usize,
    first_run: usize,
}

impl AttributeEntry {
    pub(crate) fn begin(first_run: usize, start_offset: usize) -> Self {
        Self {
            id: AttrId::Unknown,
            name: Fragment::open(first_run, start_offset),
            value: Fragment::open(first_run, start_offset),
            quote: None,
            progress: AttrProgress::begin(),
            start_offset,
            first_run,
        }
    }

    pub fn id(&self) -> AttrId {
        self.id
    }

    pub fn name(&self) -> &Fragment {
        &self.name
    }

    pub fn value(&self) -> &Fragment {
        &self.value
    }

    pub fn quote(&self) -> Option<char> {
        self.quote
    }

    pub fn progress(&self) -> AttrProgress {
        self.progress
    }

    pub fn major(&self) -> Major {
        self.progress.major()
    }

    /// A value appeared in this part, possibly empty (`a=""`).
    pub fn has_value(&self) -> bool {
        !self.value.is_absent()
    }

    /// Buffer offset where the attribute (or its continuation) starts.
    pub fn start_offset(&self) -> usize {
        self.start_offset
    }

    pub(crate) fn first_run(&self) -> usize {
        self.first_run
    }

    pub(crate) fn set_id(&mut self, id: AttrId) {
        self.id = id;
    }

    pub(crate) fn set_quote(&mut self, quote: char) {
        self.quote = Some(quote);
    }

    pub(crate) fn name_mut(&mut self) -> &mut Fragment {
        &mut self.name
    }

    pub(crate) fn value_mut(&mut self) -> &mut Fragment {
        &mut self.value
    }

    pub(crate) fn progress_mut(&mut self) -> &mut AttrProgress {
        &mut self.progress
    }

    /// Moves the attribute to the front of a drained run list.
    pub(crate) fn shift_runs(&mut self, count: usize) {
        self.name.shift_runs(count);
        self.value.shift_runs(count);
        self.first_run = self.first_run.saturating_sub(count);
    }

    /// Starts the attribute's next part at `offset` with no runs.
    pub(crate) fn restart_part(&mut self, first_run: usize, offset: usize) {
        self.progress.next_part();
        self.name = Fragment::open(first_run, offset);
        self.value = Fragment::open(first_run, offset);
        self.start_offset = offset;
        self.first_run = first_run;
    }

    pub(crate) fn rebase(&mut self, delta: isize) {
        self.name.rebase(delta);
        self.value.rebase(delta);
        self.start_offset = shift_offset(self.start_offset, delta);
    }
}

#[derive(Debug, Default)]
pub struct Token {
    pub(crate) kind: Option<TokenKind>,
    pub(crate) runs: RunStore,
    pub(crate) whole: Fragment,
    pub(crate) tag: TagId,
    pub(crate) original_tag: TagId,
    pub(crate) flags: TagFlags,
    pub(crate) name: Fragment,
    pub(crate) unstructured: Fragment,
    pub(crate) attributes: Vec<AttributeEntry>,
    pub(crate) progress: TagProgress,
    pub(crate) encoding: Option<&'static Encoding>,
    pub(crate) overlapped: u32,
}

impl Token {
    pub fn kind(&self) -> Option<TokenKind> {
        self.kind
    }

    pub fn runs(&self) -> &RunStore {
        &self.runs
    }

    /// Every run of this part. For text tokens this is the text.
    pub fn whole(&self) -> &Fragment {
        &self.whole
    }

    /// Resolved identity, with aliases canonicalized.
    pub fn tag_id(&self) -> TagId {
        self.tag
    }

    /// Identity of the name as written.
    pub fn original_tag_id(&self) -> TagId {
        self.original_tag
    }

    pub fn flags(&self) -> TagFlags {
        self.flags
    }

    pub fn is_end_tag(&self) -> bool {
        self.flags.end_tag
    }

    pub fn is_empty_element(&self) -> bool {
        self.flags.empty_element
    }

    pub fn name(&self) -> &Fragment {
        &self.name
    }

    /// Comment, doctype and bogus-tag content.
    pub fn unstructured(&self) -> &Fragment {
        &self.unstructured
    }

    pub fn attributes(&self) -> &[AttributeEntry] {
        &self.attributes
    }

    pub fn progress(&self) -> TagProgress {
        self.progress
    }

    /// Major progress for tag tokens, `Major::None` otherwise.
    pub fn major(&self) -> Major {
        match self.kind {
            Some(TokenKind::Tag) => self.progress.major(),
            _ => Major::None,
        }
    }

    /// A tag token holding the entire tag.
    pub fn is_complete_tag(&self) -> bool {
        self.major() == Major::Complete
    }

    pub fn encoding(&self) -> Option<&'static Encoding> {
        self.encoding
    }

    /// Open element count carried by overlapped tokens.
    pub fn overlapped_count(&self) -> u32 {
        self.overlapped
    }

    /// Appends a run and grows the whole-part fragment over it. Returns the
    /// new run count, which is the tail for any fragment the run extends.
    pub(crate) fn push_run(
        &mut self,
        kind: RunKind,
        class: TextClass,
        start: usize,
        end: usize,
    ) -> usize {
        self.runs.append(kind, class, start, end);
        self.grow_whole()
    }

    pub(crate) fn push_literal(&mut self, kind: RunKind, start: usize, end: usize, ch: char) -> usize {
        self.runs.append_literal(kind, start, end, ch);
        self.grow_whole()
    }

    pub(crate) fn push_null(&mut self, at: usize) -> usize {
        self.runs.append_null(at);
        self.grow_whole()
    }

    pub(crate) fn push_sentinel(&mut self, at: usize) -> usize {
        self.runs.append_sentinel(at);
        self.grow_whole()
    }

    fn grow_whole(&mut self) -> usize {
        let tail = self.runs.len();
        self.whole.extend(tail);
        tail
    }

    pub(crate) fn reset(&mut self) {
        self.kind = None;
        self.runs.clear();
        self.whole = Fragment::default();
        self.tag = TagId::Unknown;
        self.original_tag = TagId::Unknown;
        self.flags = TagFlags::default();
        self.name = Fragment::default();
        self.unstructured = Fragment::default();
        self.attributes.clear();
        self.progress = TagProgress::default();
        self.encoding = None;
        self.overlapped = 0;
    }
}
