//! Token builder state machine.
//!
//! The scanner reports lexical events; the builder turns them into runs and
//! fragments of the single in-place [`Token`]. When the window fills up in
//! the middle of a tag, [`TokenBuilder::end_tag`] with `complete == false`
//! emits what has been seen so far and decides whether the in-flight
//! attribute is carried over (kept back and re-exposed whole in the next
//! part) or exposed partially. [`TokenBuilder::rewind_tag`] then prepares
//! the next part, and [`TokenBuilder::rebase`] follows buffer compaction.

use encoding_rs::Encoding;

use crate::error::TokenizerError;
use crate::names::{self, TagId};
use crate::store::{Fragment, RunKind, TextClass, shift_offset};
use crate::token::{AttributeEntry, TagFlags, TagProgress, Token, TokenKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum BuildState {
    Initial,
    Text,
    TagStarted,
    TagName,
    TagText,
    TagBeforeAttr,
    AttrName,
    AttrNameEnd,
    AttrValue,
    AttrValueEnd,
    Done,
}

impl BuildState {
    fn in_tag(self) -> bool {
        matches!(
            self,
            BuildState::TagStarted
                | BuildState::TagName
                | BuildState::TagText
                | BuildState::TagBeforeAttr
                | BuildState::AttrName
                | BuildState::AttrNameEnd
                | BuildState::AttrValue
                | BuildState::AttrValueEnd
        )
    }
}

/// Runs of the in-flight attribute held back from an incomplete part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct CarryOver {
    first_run: usize,
    offset: usize,
}

#[derive(Debug)]
pub(crate) struct TokenBuilder {
    token: Token,
    state: BuildState,
    in_flight: Option<AttributeEntry>,
    carry: Option<CarryOver>,
    max_attributes: usize,
    initial_attributes: usize,
    attributes_seen: usize,
    tag_name_split: bool,
    attr_name_split: bool,
}

impl TokenBuilder {
    pub(crate) fn new(max_attributes: usize, initial_attributes: usize) -> Self {
        Self {
            token: Token::default(),
            state: BuildState::Initial,
            in_flight: None,
            carry: None,
            max_attributes,
            initial_attributes: initial_attributes.clamp(1, max_attributes.max(1)),
            attributes_seen: 0,
            tag_name_split: false,
            attr_name_split: false,
        }
    }

    pub(crate) fn token(&self) -> &Token {
        &self.token
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.state == BuildState::Initial
    }

    pub(crate) fn has_text(&self) -> bool {
        self.state == BuildState::Text
    }

    pub(crate) fn in_tag(&self) -> bool {
        self.state.in_tag()
    }

    #[cfg(test)]
    pub(crate) fn in_flight(&self) -> Option<&AttributeEntry> {
        self.in_flight.as_ref()
    }

    pub(crate) fn reset(&mut self) {
        self.token.reset();
        self.state = BuildState::Initial;
        self.in_flight = None;
        self.carry = None;
        self.attributes_seen = 0;
        self.tag_name_split = false;
        self.attr_name_split = false;
    }

    pub(crate) fn start_text(&mut self, offset: usize) {
        debug_assert!(self.is_idle());
        self.token.kind = Some(TokenKind::Text);
        self.token.whole = Fragment::open(0, offset);
        self.state = BuildState::Text;
    }

    fn content_kind(&self) -> Option<RunKind> {
        match self.state {
            BuildState::Text => Some(RunKind::Text),
            BuildState::TagText => Some(RunKind::RawTagText),
            BuildState::AttrValue => Some(RunKind::AttrValue),
            _ => None,
        }
    }

    /// Appends content to whatever is open: text, unstructured tag text or
    /// an attribute value.
    pub(crate) fn append_content(&mut self, class: TextClass, start: usize, end: usize) {
        let Some(kind) = self.content_kind() else {
            debug_assert!(false, "content in state {:?}", self.state);
            return;
        };
        let tail = self.token.push_run(kind, class, start, end);
        self.extend_open(tail);
    }

    pub(crate) fn append_literal(&mut self, start: usize, end: usize, ch: char) {
        let Some(kind) = self.content_kind() else {
            debug_assert!(false, "literal in state {:?}", self.state);
            return;
        };
        let tail = self.token.push_literal(kind, start, end, ch);
        self.extend_open(tail);
    }

    fn extend_open(&mut self, tail: usize) {
        match self.state {
            BuildState::TagName => self.token.name.extend(tail),
            BuildState::TagText => self.token.unstructured.extend(tail),
            BuildState::AttrName => {
                if let Some(attr) = self.in_flight.as_mut() {
                    attr.name_mut().extend(tail);
                }
            }
            BuildState::AttrValue => {
                if let Some(attr) = self.in_flight.as_mut() {
                    attr.value_mut().extend(tail);
                }
            }
            _ => {}
        }
    }

    pub(crate) fn end_text(&mut self) {
        debug_assert!(self.has_text());
        self.state = BuildState::Done;
    }

    /// `id` is given for pseudo tags whose identity is known from the
    /// markup (`<!--`, `<!doctype`); element names resolve at name end.
    pub(crate) fn start_tag(
        &mut self,
        id: Option<TagId>,
        end_tag: bool,
        offset: usize,
        after_space: bool,
    ) {
        debug_assert!(self.is_idle());
        let token = &mut self.token;
        token.kind = Some(TokenKind::Tag);
        token.whole = Fragment::open(0, offset);
        token.flags = TagFlags {
            end_tag,
            empty_element: false,
            after_space,
        };
        let id = id.unwrap_or(TagId::Unknown);
        token.tag = id;
        token.original_tag = id;
        token.progress = TagProgress::begin();
        self.attributes_seen = 0;
        self.tag_name_split = false;
        self.state = BuildState::TagStarted;
    }

    /// Delimiters, whitespace, `=` and quotes: part of the tag, not of any
    /// sub-fragment.
    pub(crate) fn append_markup(&mut self, kind: RunKind, start: usize, end: usize) {
        debug_assert!(self.in_tag());
        self.token.push_run(kind, TextClass::Plain, start, end);
    }

    pub(crate) fn start_tag_name(&mut self, offset: usize) {
        self.token.name = Fragment::open(self.token.runs.len(), offset);
        self.token.progress.open_name();
        self.state = BuildState::TagName;
    }

    /// Name characters for the open tag or attribute name.
    pub(crate) fn append_name(&mut self, start: usize, end: usize) {
        debug_assert!(matches!(
            self.state,
            BuildState::TagName | BuildState::AttrName
        ));
        let tail = self.token.push_run(RunKind::Name, TextClass::Plain, start, end);
        self.extend_open(tail);
    }

    pub(crate) fn end_tag_name(&mut self, text: &str) {
        debug_assert_eq!(self.state, BuildState::TagName);
        let token = &mut self.token;
        if token.name.is_absent() {
            let tail = token.push_null(token.name.head_offset());
            token.name.extend(tail);
        }
        token.progress.close_name();
        if !token.original_tag.is_pseudo() {
            let id = if self.tag_name_split {
                TagId::Unknown
            } else {
                names::resolve_tag(&token.name, &token.runs, text)
            };
            token.original_tag = id;
            token.tag = id.canonical();
        }
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html_token.builder", "tag name resolved to {:?}", token.tag);
        self.state = BuildState::TagBeforeAttr;
    }

    pub(crate) fn start_tag_text(&mut self, offset: usize) {
        self.token.unstructured = Fragment::open(self.token.runs.len(), offset);
        self.token.progress.open_unstructured();
        self.state = BuildState::TagText;
    }

    pub(crate) fn end_tag_text(&mut self) {
        debug_assert_eq!(self.state, BuildState::TagText);
        let token = &mut self.token;
        if token.unstructured.is_absent() {
            let tail = token.push_null(token.unstructured.head_offset());
            token.unstructured.extend(tail);
        }
        token.progress.close_unstructured();
        self.state = BuildState::TagBeforeAttr;
    }

    pub(crate) fn start_attribute(&mut self, offset: usize) -> Result<(), TokenizerError> {
        debug_assert_eq!(self.state, BuildState::TagBeforeAttr);
        if self.attributes_seen >= self.max_attributes {
            log::debug!(
                target: "html_token.builder",
                "attribute limit {} exceeded at offset {offset}",
                self.max_attributes
            );
            return Err(TokenizerError::AttributeLimitExceeded {
                limit: self.max_attributes,
            });
        }
        self.attributes_seen += 1;
        self.in_flight = Some(AttributeEntry::begin(self.token.runs.len(), offset));
        self.attr_name_split = false;
        self.state = BuildState::AttrName;
        Ok(())
    }

    pub(crate) fn end_attribute_name(&mut self, text: &str) {
        debug_assert_eq!(self.state, BuildState::AttrName);
        let token = &mut self.token;
        if let Some(attr) = self.in_flight.as_mut() {
            if attr.name().is_absent() {
                let tail = token.push_null(attr.name().head_offset());
                attr.name_mut().extend(tail);
            }
            attr.progress_mut().close_name();
            let id = if self.attr_name_split {
                names::AttrId::Unknown
            } else {
                names::resolve_attribute(attr.name(), &token.runs, text)
            };
            attr.set_id(id);
        }
        self.state = BuildState::AttrNameEnd;
    }

    pub(crate) fn start_value(&mut self, offset: usize) {
        let head = self.token.runs.len();
        if let Some(attr) = self.in_flight.as_mut() {
            *attr.value_mut() = Fragment::open(head, offset);
            attr.progress_mut().open_value();
        }
        self.state = BuildState::AttrValue;
    }

    pub(crate) fn set_value_quote(&mut self, quote: char) {
        if let Some(attr) = self.in_flight.as_mut() {
            attr.set_quote(quote);
        }
    }

    pub(crate) fn end_value(&mut self) {
        debug_assert_eq!(self.state, BuildState::AttrValue);
        let token = &mut self.token;
        if let Some(attr) = self.in_flight.as_mut() {
            if attr.value().is_absent() {
                let tail = token.push_null(attr.value().head_offset());
                attr.value_mut().extend(tail);
            }
            attr.progress_mut().close_value();
        }
        self.state = BuildState::AttrValueEnd;
    }

    /// Commits the in-flight attribute, closing whatever is still open.
    pub(crate) fn end_attribute(&mut self, text: &str) {
        if self.state == BuildState::AttrName {
            self.end_attribute_name(text);
        }
        if self.state == BuildState::AttrValue {
            self.end_value();
        }
        if let Some(mut attr) = self.in_flight.take() {
            if !attr.progress().value().is_ended() {
                attr.progress_mut().close_value();
            }
            self.reserve_attribute_slot();
            self.token.attributes.push(attr);
        }
        self.state = BuildState::TagBeforeAttr;
    }

    /// Geometric growth from the initial capacity, capped at the limit.
    fn reserve_attribute_slot(&mut self) {
        let attrs = &mut self.token.attributes;
        if attrs.len() < attrs.capacity() {
            return;
        }
        let grown = if attrs.capacity() == 0 {
            self.initial_attributes
        } else {
            attrs.capacity().saturating_mul(2)
        };
        let target = grown.min(self.max_attributes).max(attrs.len() + 1);
        attrs.reserve_exact(target - attrs.len());
    }

    pub(crate) fn set_empty_element(&mut self) {
        self.token.flags.empty_element = true;
    }

    /// Ends the current tag part at `offset`.
    ///
    /// `complete` closes the tag. Otherwise the part is incomplete: an
    /// in-flight attribute spanning at most `carry_limit` bytes is held
    /// back for the next part, a longer one is exposed as it stands.
    pub(crate) fn end_tag(&mut self, complete: bool, offset: usize, text: &str, carry_limit: usize) {
        debug_assert!(self.in_tag());
        if complete {
            self.close_tag(offset, text);
        } else {
            self.split_tag(offset, carry_limit);
        }
    }

    fn close_tag(&mut self, offset: usize, text: &str) {
        match self.state {
            BuildState::TagName => self.end_tag_name(text),
            BuildState::TagText => self.end_tag_text(),
            BuildState::AttrName
            | BuildState::AttrNameEnd
            | BuildState::AttrValue
            | BuildState::AttrValueEnd => self.end_attribute(text),
            _ => {}
        }
        self.token.push_sentinel(offset);
        self.token.progress.end();
        self.carry = None;
        self.state = BuildState::Done;
    }

    fn split_tag(&mut self, offset: usize, carry_limit: usize) {
        self.carry = None;
        let Some(attr) = self.in_flight.as_ref() else {
            return;
        };
        let span = offset.saturating_sub(attr.start_offset());
        if span <= carry_limit {
            self.carry = Some(CarryOver {
                first_run: attr.first_run(),
                offset: attr.start_offset(),
            });
            self.token.whole.truncate(attr.first_run());
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(
                target: "html_token.builder",
                "carrying attribute of {span} bytes into the next part"
            );
        } else {
            let exposed = attr.clone();
            self.reserve_attribute_slot();
            self.token.attributes.push(exposed);
        }
    }

    /// Starts the next part of a tag emitted incomplete, resuming at
    /// `resume`. Returns the first buffer offset still referenced.
    pub(crate) fn rewind_tag(&mut self, resume: usize) -> usize {
        debug_assert!(self.in_tag());
        let carry = self.carry.take();
        let token = &mut self.token;
        let carried_from = carry.map_or(token.runs.len(), |carry| carry.first_run);
        token.runs.drain_front(carried_from);
        token.attributes.clear();
        token.progress.next_part();

        let head = token.runs.len();
        if token.progress.name().is_open() {
            self.tag_name_split = true;
        }
        token.name = Fragment::open(head, resume);
        token.unstructured = Fragment::open(head, resume);

        let retain = carry.map_or(resume, |carry| carry.offset);
        token.whole = Fragment::open(0, retain);
        token.whole.extend(head);

        if let Some(attr) = self.in_flight.as_mut() {
            match carry {
                Some(carry) => attr.shift_runs(carry.first_run),
                None => {
                    if attr.progress().name().is_open() {
                        self.attr_name_split = true;
                    }
                    attr.restart_part(head, resume);
                }
            }
        }
        retain
    }

    /// Shifts every stored buffer offset by `delta` after compaction.
    pub(crate) fn rebase(&mut self, delta: isize) {
        let token = &mut self.token;
        token.runs.rebase(delta);
        token.whole.rebase(delta);
        token.name.rebase(delta);
        token.unstructured.rebase(delta);
        for attr in &mut token.attributes {
            attr.rebase(delta);
        }
        if let Some(attr) = self.in_flight.as_mut() {
            attr.rebase(delta);
        }
        if let Some(carry) = self.carry.as_mut() {
            carry.offset = shift_offset(carry.offset, delta);
        }
    }

    pub(crate) fn make_end_of_file(&mut self) {
        self.make_marker(TokenKind::EndOfFile);
    }

    pub(crate) fn make_restart(&mut self) {
        self.make_marker(TokenKind::Restart);
    }

    pub(crate) fn make_encoding_change(&mut self, encoding: &'static Encoding) {
        self.make_marker(TokenKind::EncodingChange);
        self.token.encoding = Some(encoding);
    }

    pub(crate) fn make_overlapped(&mut self, kind: TokenKind, open_tags: u32) {
        debug_assert!(matches!(
            kind,
            TokenKind::OverlappedClose | TokenKind::OverlappedReopen
        ));
        self.make_marker(kind);
        self.token.overlapped = open_tags;
    }

    fn make_marker(&mut self, kind: TokenKind) {
        debug_assert!(self.is_idle());
        self.token.kind = Some(kind);
        self.state = BuildState::Done;
    }
}
