//! Lexical scanner.
//!
//! The scanner walks the buffer from its position up to the scan limit and
//! reports events to the [`TokenBuilder`]. It never consumes input whose
//! meaning depends on characters not yet buffered: such decisions wait for
//! more input, or are made with what is there once the input has ended.

use memchr::{memchr, memchr2, memchr3};

use crate::builder::TokenBuilder;
use crate::entities::{self, RefMatch};
use crate::error::TokenizerError;
use crate::names::{ContentModel, TagId};
use crate::store::{RunKind, TextClass, shift_offset};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScanState {
    Data,
    TagName,
    BeforeAttributeName,
    AttributeName,
    AfterAttributeName,
    BeforeAttributeValue,
    AttributeValueQuoted(u8),
    AttributeValueUnquoted,
    SelfClosingStartTag,
    CommentStart,
    Comment,
    Bogus,
    RawText { tag: TagId, rcdata: bool },
    PlainText,
}

#[derive(Clone, Copy, Debug)]
pub(crate) struct ScanInput<'a> {
    pub(crate) text: &'a str,
    /// Scanning stops here; bytes past it are not looked at.
    pub(crate) limit: usize,
    /// Nothing follows `limit`.
    pub(crate) at_end: bool,
}

impl ScanInput<'_> {
    fn bytes(&self) -> &[u8] {
        &self.text.as_bytes()[..self.limit]
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Step {
    /// The builder holds a finished token.
    Token,
    /// Everything buffered is consumed or waits on lookahead.
    NeedInput,
    /// Input ended and no token is open.
    Exhausted,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MatchResult {
    Matched,
    NeedMoreInput,
    NoMatch,
}

/// What a `<` starts.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Markup {
    StartTag,
    EndTag,
    /// `</>`, dropped.
    EmptyEndTag,
    BogusEndTag,
    Comment,
    Declaration { doctype: bool },
    ProcessingInstruction,
    Text,
}

fn match_prefix(bytes: &[u8], pattern: &[u8], fold_case: bool) -> MatchResult {
    let n = bytes.len().min(pattern.len());
    let same = if fold_case {
        bytes[..n].eq_ignore_ascii_case(&pattern[..n])
    } else {
        bytes[..n] == pattern[..n]
    };
    if !same {
        MatchResult::NoMatch
    } else if n < pattern.len() {
        MatchResult::NeedMoreInput
    } else {
        MatchResult::Matched
    }
}

/// Classifies the markup at the start of `bytes` (which begins with `<`).
/// `None` when more input is needed to decide.
fn classify_markup(bytes: &[u8], at_end: bool) -> Option<Markup> {
    let undecided = |fallback| if at_end { Some(fallback) } else { None };
    match bytes.get(1) {
        None => undecided(Markup::Text),
        Some(b'/') => match bytes.get(2) {
            None => undecided(Markup::Text),
            Some(b'>') => Some(Markup::EmptyEndTag),
            Some(b) if b.is_ascii_alphabetic() => Some(Markup::EndTag),
            Some(_) => Some(Markup::BogusEndTag),
        },
        Some(b'!') => {
            let comment = match_prefix(bytes, b"<!--", false);
            let doctype = match_prefix(bytes, b"<!doctype", true);
            if comment == MatchResult::Matched {
                Some(Markup::Comment)
            } else if doctype == MatchResult::Matched {
                Some(Markup::Declaration { doctype: true })
            } else if !at_end
                && (comment == MatchResult::NeedMoreInput || doctype == MatchResult::NeedMoreInput)
            {
                None
            } else {
                Some(Markup::Declaration { doctype: false })
            }
        }
        Some(b'?') => Some(Markup::ProcessingInstruction),
        Some(b) if b.is_ascii_alphabetic() => Some(Markup::StartTag),
        Some(_) => Some(Markup::Text),
    }
}

/// Whether `bytes` (starting at `<`) is the end tag closing raw text of
/// `name`.
fn match_raw_end(bytes: &[u8], name: &str, at_end: bool) -> MatchResult {
    let matched = match match_prefix(bytes, b"</", false) {
        MatchResult::Matched => match match_prefix(&bytes[2..], name.as_bytes(), true) {
            MatchResult::Matched => match bytes.get(2 + name.len()) {
                None => MatchResult::NeedMoreInput,
                Some(&b) if is_tag_space(b) || b == b'/' || b == b'>' => MatchResult::Matched,
                Some(_) => MatchResult::NoMatch,
            },
            other => other,
        },
        other => other,
    };
    matched.decided(at_end)
}

impl MatchResult {
    /// At end of input an undecided match is a mismatch.
    fn decided(self, at_end: bool) -> MatchResult {
        if at_end && self == MatchResult::NeedMoreInput {
            MatchResult::NoMatch
        } else {
            self
        }
    }
}

fn is_tag_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | 0x0c)
}

fn class_at(bytes: &[u8], i: usize) -> (TextClass, usize) {
    match bytes[i] {
        b' ' => (TextClass::Space, 1),
        b'\n' | b'\r' => (TextClass::NewLine, 1),
        b'\t' => (TextClass::Tab, 1),
        0xc2 if bytes.get(i + 1) == Some(&0xa0) => (TextClass::NonBreakingSpace, 2),
        _ => (TextClass::Plain, 1),
    }
}

/// Appends `[start, end)` split into runs of one text class each. Returns
/// the class of the last run.
fn push_classified(
    builder: &mut TokenBuilder,
    bytes: &[u8],
    start: usize,
    end: usize,
) -> Option<TextClass> {
    let mut at = start;
    let mut last = None;
    while at < end {
        let (class, width) = class_at(bytes, at);
        let mut run_end = at + width;
        while run_end < end {
            let (next, width) = class_at(bytes, run_end);
            if next != class {
                break;
            }
            run_end += width;
        }
        builder.append_content(class, at, run_end);
        last = Some(class);
        at = run_end;
    }
    last
}

#[derive(Debug)]
pub(crate) struct Scanner {
    state: ScanState,
    pos: usize,
    /// Text directly before the current position ended in whitespace.
    after_space: bool,
}

impl Scanner {
    pub(crate) fn new() -> Self {
        Self {
            state: ScanState::Data,
            pos: 0,
            after_space: false,
        }
    }

    pub(crate) fn pos(&self) -> usize {
        self.pos
    }

    pub(crate) fn state(&self) -> ScanState {
        self.state
    }

    /// Back to data content, e.g. after injected markup ends.
    pub(crate) fn reset_state(&mut self) {
        self.state = ScanState::Data;
        self.after_space = false;
    }

    pub(crate) fn rebase(&mut self, delta: isize) {
        self.pos = shift_offset(self.pos, delta);
    }

    /// Scans until a token is finished or the input runs out.
    pub(crate) fn step(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
    ) -> Result<Step, TokenizerError> {
        loop {
            #[cfg(any(test, feature = "debug-stats"))]
            log::trace!(target: "html_token.tokenizer", "scan {:?} @{}", self.state, self.pos);
            let step = match self.state {
                ScanState::Data => self.data(input, builder),
                ScanState::TagName => self.tag_name(input, builder),
                ScanState::BeforeAttributeName => self.before_attribute_name(input, builder)?,
                ScanState::AttributeName => self.attribute_name(input, builder),
                ScanState::AfterAttributeName => self.after_attribute_name(input, builder),
                ScanState::BeforeAttributeValue => self.before_attribute_value(input, builder),
                ScanState::AttributeValueQuoted(quote) => {
                    self.quoted_value(input, builder, quote)
                }
                ScanState::AttributeValueUnquoted => self.unquoted_value(input, builder),
                ScanState::SelfClosingStartTag => self.self_closing(input, builder),
                ScanState::CommentStart => self.comment_start(input, builder),
                ScanState::Comment => self.comment(input, builder),
                ScanState::Bogus => self.bogus(input, builder),
                ScanState::RawText { tag, rcdata } => self.raw_text(input, builder, tag, rcdata),
                ScanState::PlainText => self.plain_text(input, builder),
            };
            if let Some(step) = step {
                return Ok(step);
            }
        }
    }

    /// The buffered input ran out inside a tag.
    fn tag_out_of_input(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Step {
        if !input.at_end {
            return Step::NeedInput;
        }
        builder.end_tag(true, self.pos, input.text, 0);
        self.state = ScanState::Data;
        self.after_space = false;
        Step::Token
    }

    /// The buffered input ran out in text content.
    fn text_out_of_input(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Step {
        if !input.at_end {
            Step::NeedInput
        } else if builder.has_text() {
            builder.end_text();
            Step::Token
        } else {
            Step::Exhausted
        }
    }

    fn push_text(&mut self, builder: &mut TokenBuilder, bytes: &[u8], start: usize, end: usize) {
        if start == end {
            return;
        }
        self.begin_text(builder, start);
        if let Some(class) = push_classified(builder, bytes, start, end) {
            self.after_space = matches!(
                class,
                TextClass::Space | TextClass::NewLine | TextClass::Tab
            );
        }
    }

    fn begin_text(&mut self, builder: &mut TokenBuilder, at: usize) {
        if !builder.has_text() {
            builder.start_text(at);
        }
    }

    fn push_replacement(&mut self, builder: &mut TokenBuilder, at: usize) {
        builder.append_literal(at, at + 1, char::REPLACEMENT_CHARACTER);
        self.pos = at + 1;
        self.after_space = false;
    }

    /// Character reference at `at`. `None` once it is consumed. In text
    /// content (`in_text`) the consumed reference may start a text token.
    fn reference(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
        at: usize,
        in_text: bool,
    ) -> Option<Step> {
        let matched = entities::match_reference(&input.bytes()[at..], input.at_end);
        if matched == RefMatch::NeedMore {
            self.pos = at;
            return Some(Step::NeedInput);
        }
        if in_text {
            self.begin_text(builder, at);
        }
        match matched {
            RefMatch::Decoded { ch, len } => {
                builder.append_literal(at, at + len, ch);
                self.pos = at + len;
            }
            RefMatch::NeedMore => {}
            RefMatch::NotReference => {
                builder.append_content(TextClass::Plain, at, at + 1);
                self.pos = at + 1;
            }
        }
        self.after_space = false;
        None
    }

    fn data(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        loop {
            let found = memchr3(b'<', b'&', 0, &bytes[self.pos..]).map(|i| self.pos + i);
            let stop = found.unwrap_or(bytes.len());
            self.push_text(builder, bytes, self.pos, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.text_out_of_input(input, builder));
            };
            match bytes[at] {
                b'<' => match classify_markup(&bytes[at..], input.at_end) {
                    None => return Some(Step::NeedInput),
                    Some(Markup::Text) => {
                        self.push_text(builder, bytes, at, at + 1);
                        self.pos = at + 1;
                    }
                    Some(Markup::EmptyEndTag) => self.pos = at + 3,
                    Some(markup) => {
                        if builder.has_text() {
                            builder.end_text();
                            return Some(Step::Token);
                        }
                        self.open_markup(builder, markup, at);
                        return None;
                    }
                },
                b'&' => {
                    if let Some(step) = self.reference(input, builder, at, true) {
                        return Some(step);
                    }
                }
                _ => {
                    self.begin_text(builder, at);
                    self.push_replacement(builder, at);
                }
            }
        }
    }

    fn open_markup(&mut self, builder: &mut TokenBuilder, markup: Markup, at: usize) {
        let after_space = self.after_space;
        let (id, end_tag, delimiter) = match markup {
            Markup::StartTag => (None, false, 1),
            Markup::EndTag => (None, true, 2),
            Markup::Comment => (Some(TagId::Comment), false, 4),
            Markup::Declaration { doctype: true } => (Some(TagId::Doctype), false, 2),
            Markup::Declaration { doctype: false } | Markup::BogusEndTag => {
                (Some(TagId::Bogus), false, 2)
            }
            Markup::ProcessingInstruction => (Some(TagId::Bogus), false, 1),
            Markup::Text | Markup::EmptyEndTag => {
                debug_assert!(false, "{markup:?} does not open a tag");
                return;
            }
        };
        builder.start_tag(id, end_tag, at, after_space);
        builder.append_markup(RunKind::TagDelimiter, at, at + delimiter);
        self.pos = at + delimiter;
        match markup {
            Markup::StartTag | Markup::EndTag => {
                builder.start_tag_name(self.pos);
                self.state = ScanState::TagName;
            }
            Markup::Comment => {
                builder.start_tag_text(self.pos);
                self.state = ScanState::CommentStart;
            }
            _ => {
                builder.start_tag_text(self.pos);
                self.state = ScanState::Bogus;
            }
        }
    }

    /// Consumes the closing `>` (or comment terminator) of `len` bytes at
    /// the current position and finishes the tag.
    fn close_tag(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder, len: usize) -> Step {
        builder.append_markup(RunKind::TagDelimiter, self.pos, self.pos + len);
        self.pos += len;
        builder.end_tag(true, self.pos, input.text, 0);
        self.after_space = false;

        let token = builder.token();
        self.state = match token.tag_id() {
            tag if token.is_end_tag() || tag.is_pseudo() => ScanState::Data,
            tag => match tag.content_model() {
                ContentModel::Normal => ScanState::Data,
                ContentModel::RawText => ScanState::RawText { tag, rcdata: false },
                ContentModel::RcData => ScanState::RawText { tag, rcdata: true },
                ContentModel::PlainText => ScanState::PlainText,
            },
        };
        Step::Token
    }

    fn close_unstructured(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
        len: usize,
    ) -> Step {
        builder.end_tag_text();
        self.close_tag(input, builder, len)
    }

    fn skip_space(&mut self, bytes: &[u8], builder: &mut TokenBuilder) {
        let start = self.pos;
        let end = bytes[start..]
            .iter()
            .position(|&b| !is_tag_space(b))
            .map_or(bytes.len(), |i| start + i);
        if end > start {
            builder.append_markup(RunKind::Whitespace, start, end);
            self.pos = end;
        }
    }

    fn tag_name(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        let start = self.pos;
        let stop = bytes[start..]
            .iter()
            .position(|&b| is_tag_space(b) || b == b'/' || b == b'>')
            .map(|i| start + i);
        let end = stop.unwrap_or(bytes.len());
        if end > start {
            builder.append_name(start, end);
            self.pos = end;
        }
        if stop.is_none() {
            return Some(self.tag_out_of_input(input, builder));
        }
        builder.end_tag_name(input.text);
        self.state = ScanState::BeforeAttributeName;
        None
    }

    fn before_attribute_name(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
    ) -> Result<Option<Step>, TokenizerError> {
        let bytes = input.bytes();
        self.skip_space(bytes, builder);
        let Some(&b) = bytes.get(self.pos) else {
            return Ok(Some(self.tag_out_of_input(input, builder)));
        };
        match b {
            b'/' => {
                builder.append_markup(RunKind::TagDelimiter, self.pos, self.pos + 1);
                self.pos += 1;
                self.state = ScanState::SelfClosingStartTag;
            }
            b'>' => return Ok(Some(self.close_tag(input, builder, 1))),
            _ => {
                builder.start_attribute(self.pos)?;
                if b == b'=' {
                    builder.append_name(self.pos, self.pos + 1);
                    self.pos += 1;
                }
                self.state = ScanState::AttributeName;
            }
        }
        Ok(None)
    }

    fn attribute_name(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        let start = self.pos;
        let stop = bytes[start..]
            .iter()
            .position(|&b| is_tag_space(b) || matches!(b, b'/' | b'>' | b'='))
            .map(|i| start + i);
        let end = stop.unwrap_or(bytes.len());
        if end > start {
            builder.append_name(start, end);
            self.pos = end;
        }
        let Some(at) = stop else {
            return Some(self.tag_out_of_input(input, builder));
        };
        match bytes[at] {
            b'=' => {
                builder.end_attribute_name(input.text);
                builder.append_markup(RunKind::AttrEquals, at, at + 1);
                self.pos = at + 1;
                self.state = ScanState::BeforeAttributeValue;
            }
            b'/' | b'>' => {
                builder.end_attribute(input.text);
                self.state = ScanState::BeforeAttributeName;
            }
            _ => {
                builder.end_attribute_name(input.text);
                self.state = ScanState::AfterAttributeName;
            }
        }
        None
    }

    fn after_attribute_name(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
    ) -> Option<Step> {
        let bytes = input.bytes();
        self.skip_space(bytes, builder);
        let Some(&b) = bytes.get(self.pos) else {
            return Some(self.tag_out_of_input(input, builder));
        };
        if b == b'=' {
            builder.append_markup(RunKind::AttrEquals, self.pos, self.pos + 1);
            self.pos += 1;
            self.state = ScanState::BeforeAttributeValue;
        } else {
            builder.end_attribute(input.text);
            self.state = ScanState::BeforeAttributeName;
        }
        None
    }

    fn before_attribute_value(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
    ) -> Option<Step> {
        let bytes = input.bytes();
        self.skip_space(bytes, builder);
        let Some(&b) = bytes.get(self.pos) else {
            return Some(self.tag_out_of_input(input, builder));
        };
        match b {
            b'"' | b'\'' => {
                builder.append_markup(RunKind::AttrQuote, self.pos, self.pos + 1);
                self.pos += 1;
                builder.start_value(self.pos);
                builder.set_value_quote(char::from(b));
                self.state = ScanState::AttributeValueQuoted(b);
            }
            b'>' => {
                builder.start_value(self.pos);
                builder.end_value();
                builder.end_attribute(input.text);
                self.state = ScanState::BeforeAttributeName;
            }
            _ => {
                builder.start_value(self.pos);
                self.state = ScanState::AttributeValueUnquoted;
            }
        }
        None
    }

    fn quoted_value(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
        quote: u8,
    ) -> Option<Step> {
        let bytes = input.bytes();
        loop {
            let found = memchr3(quote, b'&', 0, &bytes[self.pos..]).map(|i| self.pos + i);
            let stop = found.unwrap_or(bytes.len());
            push_classified(builder, bytes, self.pos, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.tag_out_of_input(input, builder));
            };
            match bytes[at] {
                b'&' => {
                    if let Some(step) = self.reference(input, builder, at, false) {
                        return Some(step);
                    }
                }
                0 => self.push_replacement(builder, at),
                _ => {
                    builder.end_value();
                    builder.append_markup(RunKind::AttrQuote, at, at + 1);
                    builder.end_attribute(input.text);
                    self.pos = at + 1;
                    self.state = ScanState::BeforeAttributeName;
                    return None;
                }
            }
        }
    }

    fn unquoted_value(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        loop {
            let start = self.pos;
            let found = bytes[start..]
                .iter()
                .position(|&b| is_tag_space(b) || matches!(b, b'>' | b'&' | 0))
                .map(|i| start + i);
            let stop = found.unwrap_or(bytes.len());
            push_classified(builder, bytes, start, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.tag_out_of_input(input, builder));
            };
            match bytes[at] {
                b'&' => {
                    if let Some(step) = self.reference(input, builder, at, false) {
                        return Some(step);
                    }
                }
                0 => self.push_replacement(builder, at),
                _ => {
                    builder.end_value();
                    builder.end_attribute(input.text);
                    self.state = ScanState::BeforeAttributeName;
                    return None;
                }
            }
        }
    }

    fn self_closing(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        match input.bytes().get(self.pos) {
            None => Some(self.tag_out_of_input(input, builder)),
            Some(b'>') => {
                builder.set_empty_element();
                Some(self.close_tag(input, builder, 1))
            }
            Some(_) => {
                self.state = ScanState::BeforeAttributeName;
                None
            }
        }
    }

    fn comment_start(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let rest = &input.bytes()[self.pos..];
        match rest.first() {
            None => return Some(self.tag_out_of_input(input, builder)),
            Some(b'>') => return Some(self.close_unstructured(input, builder, 1)),
            Some(b'-') => match match_prefix(rest, b"->", false).decided(input.at_end) {
                MatchResult::Matched => return Some(self.close_unstructured(input, builder, 2)),
                MatchResult::NeedMoreInput => return Some(Step::NeedInput),
                MatchResult::NoMatch => {}
            },
            Some(_) => {}
        }
        self.state = ScanState::Comment;
        None
    }

    fn comment(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        loop {
            let found = memchr2(b'-', 0, &bytes[self.pos..]).map(|i| self.pos + i);
            let stop = found.unwrap_or(bytes.len());
            push_classified(builder, bytes, self.pos, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.tag_out_of_input(input, builder));
            };
            if bytes[at] == 0 {
                self.push_replacement(builder, at);
                continue;
            }
            let rest = &bytes[at..];
            let end = match_prefix(rest, b"-->", false).decided(input.at_end);
            let bang = match_prefix(rest, b"--!>", false).decided(input.at_end);
            if end == MatchResult::Matched {
                return Some(self.close_unstructured(input, builder, 3));
            }
            if bang == MatchResult::Matched {
                return Some(self.close_unstructured(input, builder, 4));
            }
            if end == MatchResult::NeedMoreInput || bang == MatchResult::NeedMoreInput {
                return Some(Step::NeedInput);
            }
            builder.append_content(TextClass::Plain, at, at + 1);
            self.pos = at + 1;
        }
    }

    fn bogus(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        loop {
            let found = memchr2(b'>', 0, &bytes[self.pos..]).map(|i| self.pos + i);
            let stop = found.unwrap_or(bytes.len());
            push_classified(builder, bytes, self.pos, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.tag_out_of_input(input, builder));
            };
            if bytes[at] == 0 {
                self.push_replacement(builder, at);
                continue;
            }
            return Some(self.close_unstructured(input, builder, 1));
        }
    }

    fn raw_text(
        &mut self,
        input: &ScanInput<'_>,
        builder: &mut TokenBuilder,
        tag: TagId,
        rcdata: bool,
    ) -> Option<Step> {
        let bytes = input.bytes();
        let name = tag.name().unwrap_or_default();
        loop {
            let found = memchr3(b'<', b'&', 0, &bytes[self.pos..]).map(|i| self.pos + i);
            let stop = found.unwrap_or(bytes.len());
            self.push_text(builder, bytes, self.pos, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.text_out_of_input(input, builder));
            };
            match bytes[at] {
                b'<' => match match_raw_end(&bytes[at..], name, input.at_end) {
                    MatchResult::Matched => {
                        self.state = ScanState::Data;
                        if builder.has_text() {
                            builder.end_text();
                            return Some(Step::Token);
                        }
                        return None;
                    }
                    MatchResult::NeedMoreInput => return Some(Step::NeedInput),
                    MatchResult::NoMatch => {
                        self.push_text(builder, bytes, at, at + 1);
                        self.pos = at + 1;
                    }
                },
                b'&' if rcdata => {
                    if let Some(step) = self.reference(input, builder, at, true) {
                        return Some(step);
                    }
                }
                b'&' => {
                    self.push_text(builder, bytes, at, at + 1);
                    self.pos = at + 1;
                }
                _ => {
                    self.begin_text(builder, at);
                    self.push_replacement(builder, at);
                }
            }
        }
    }

    fn plain_text(&mut self, input: &ScanInput<'_>, builder: &mut TokenBuilder) -> Option<Step> {
        let bytes = input.bytes();
        loop {
            let found = memchr(0, &bytes[self.pos..]).map(|i| self.pos + i);
            let stop = found.unwrap_or(bytes.len());
            self.push_text(builder, bytes, self.pos, stop);
            self.pos = stop;
            let Some(at) = found else {
                return Some(self.text_out_of_input(input, builder));
            };
            self.begin_text(builder, at);
            self.push_replacement(builder, at);
        }
    }
}
