use std::borrow::Cow;

use super::{AttrProgress, AttributeEntry, Major, OwnedToken, Token, TokenKind};
use crate::names::{AttrId, TagId};
use crate::store::{Fragment, ReadMode, RunStore};

/// A token paired with the buffer its runs point into.
#[derive(Clone, Copy, Debug)]
pub struct TokenView<'a> {
    token: &'a Token,
    text: &'a str,
}

impl<'a> TokenView<'a> {
    pub fn new(token: &'a Token, text: &'a str) -> Self {
        Self { token, text }
    }

    pub fn token(&self) -> &'a Token {
        self.token
    }

    /// Buffer text the runs index into.
    pub fn buffer(&self) -> &'a str {
        self.text
    }

    pub fn kind(&self) -> Option<TokenKind> {
        self.token.kind()
    }

    pub fn tag_id(&self) -> TagId {
        self.token.tag_id()
    }

    pub fn major(&self) -> Major {
        self.token.major()
    }

    pub fn read(&self, fragment: &Fragment, mode: ReadMode) -> Cow<'a, str> {
        fragment.read(self.token.runs(), self.text, mode)
    }

    /// Decoded text of a text token.
    pub fn text(&self) -> Cow<'a, str> {
        self.read(self.token.whole(), ReadMode::Decoded)
    }

    pub fn text_with(&self, mode: ReadMode) -> Cow<'a, str> {
        self.read(self.token.whole(), mode)
    }

    /// Tag name as written.
    pub fn name(&self) -> Cow<'a, str> {
        self.read(self.token.name(), ReadMode::Source)
    }

    /// Canonical lowercase name for known tags, else the source name.
    pub fn canonical_name(&self) -> Cow<'a, str> {
        match self.token.tag_id().name() {
            Some(name) => Cow::Borrowed(name),
            None => self.name(),
        }
    }

    pub fn unstructured(&self) -> Cow<'a, str> {
        self.read(self.token.unstructured(), ReadMode::Decoded)
    }

    /// Source form of the tag, for passthrough output.
    pub fn source(&self) -> Cow<'a, str> {
        self.read(self.token.whole(), ReadMode::Source)
    }

    pub fn attribute_count(&self) -> usize {
        self.token.attributes().len()
    }

    pub fn attribute(&self, index: usize) -> Option<AttributeView<'a>> {
        let entry = self.token.attributes().get(index)?;
        Some(AttributeView {
            entry,
            runs: self.token.runs(),
            text: self.text,
        })
    }

    pub fn attributes(&self) -> impl Iterator<Item = AttributeView<'a>> + use<'a> {
        let runs = self.token.runs();
        let text = self.text;
        self.token
            .attributes()
            .iter()
            .map(move |entry| AttributeView { entry, runs, text })
    }

    /// Copies this token (or tag part) out of the buffer.
    pub fn to_owned_token(&self) -> OwnedToken {
        OwnedToken::from_view(self)
    }
}

#[derive(Clone, Copy, Debug)]
pub struct AttributeView<'a> {
    entry: &'a AttributeEntry,
    runs: &'a RunStore,
    text: &'a str,
}

impl<'a> AttributeView<'a> {
    pub fn entry(&self) -> &'a AttributeEntry {
        self.entry
    }

    pub fn id(&self) -> AttrId {
        self.entry.id()
    }

    pub fn progress(&self) -> AttrProgress {
        self.entry.progress()
    }

    pub fn quote(&self) -> Option<char> {
        self.entry.quote()
    }

    pub fn has_value(&self) -> bool {
        self.entry.has_value()
    }

    pub fn name(&self) -> Cow<'a, str> {
        self.entry.name().read(self.runs, self.text, ReadMode::Source)
    }

    /// Canonical lowercase name for known attributes, else the source name.
    pub fn canonical_name(&self) -> Cow<'a, str> {
        match self.entry.id().name() {
            Some(name) => Cow::Borrowed(name),
            None => self.name(),
        }
    }

    /// Decoded value, `None` when the attribute has no value in this part.
    pub fn value(&self) -> Option<Cow<'a, str>> {
        self.value_with(ReadMode::Decoded)
    }

    pub fn value_with(&self, mode: ReadMode) -> Option<Cow<'a, str>> {
        if !self.entry.has_value() {
            return None;
        }
        Some(self.entry.value().read(self.runs, self.text, mode))
    }

    /// Streams the decoded value into `out`; returns whether a value exists.
    pub fn write_value_to(&self, out: &mut String) -> bool {
        if !self.entry.has_value() {
            return false;
        }
        self.entry
            .value()
            .write_to(self.runs, self.text, ReadMode::Decoded, out);
        true
    }
}
