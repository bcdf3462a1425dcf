use super::{TokenKind, TokenView};
use crate::names::{AttrId, TagId};

/// Token copied out of the buffer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OwnedToken {
    Text(String),
    Tag(OwnedTag),
    EndOfFile,
    EncodingChange(&'static str),
    Restart,
    OverlappedClose(u32),
    OverlappedReopen(u32),
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OwnedTag {
    pub id: TagId,
    /// Name as written.
    pub name: String,
    pub end_tag: bool,
    pub empty_element: bool,
    pub after_space: bool,
    pub attributes: Vec<OwnedAttribute>,
    pub unstructured: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OwnedAttribute {
    pub id: AttrId,
    pub name: String,
    /// Decoded value; `None` for a value-less attribute.
    pub value: Option<String>,
    pub quote: Option<char>,
}

impl OwnedToken {
    pub(crate) fn from_view(view: &TokenView<'_>) -> OwnedToken {
        let token = view.token();
        match token.kind() {
            Some(TokenKind::Text) | None => OwnedToken::Text(view.text().into_owned()),
            Some(TokenKind::Tag) => {
                let mut tag = OwnedTag::started(view);
                tag.append_part(view);
                tag.finish(view);
                OwnedToken::Tag(tag)
            }
            Some(TokenKind::EndOfFile) => OwnedToken::EndOfFile,
            Some(TokenKind::EncodingChange) => {
                OwnedToken::EncodingChange(token.encoding().map_or("", |enc| enc.name()))
            }
            Some(TokenKind::Restart) => OwnedToken::Restart,
            Some(TokenKind::OverlappedClose) => OwnedToken::OverlappedClose(token.overlapped_count()),
            Some(TokenKind::OverlappedReopen) => {
                OwnedToken::OverlappedReopen(token.overlapped_count())
            }
        }
    }
}

impl OwnedTag {
    fn started(view: &TokenView<'_>) -> OwnedTag {
        let token = view.token();
        let flags = token.flags();
        OwnedTag {
            id: token.tag_id(),
            end_tag: flags.end_tag,
            after_space: flags.after_space,
            ..OwnedTag::default()
        }
    }

    fn append_part(&mut self, view: &TokenView<'_>) {
        self.name.push_str(&view.name());
        self.unstructured.push_str(&view.unstructured());
        for attr in view.attributes() {
            let progress = attr.progress();
            if progress.name().is_begun_here() || self.attributes.is_empty() {
                self.attributes.push(OwnedAttribute {
                    id: attr.id(),
                    name: attr.name().into_owned(),
                    value: attr.value().map(|value| value.into_owned()),
                    quote: attr.quote(),
                });
                continue;
            }
            if let Some(last) = self.attributes.last_mut() {
                last.id = attr.id();
                last.name.push_str(&attr.name());
                if let Some(value) = attr.value() {
                    last.value.get_or_insert_with(String::new).push_str(&value);
                }
                if last.quote.is_none() {
                    last.quote = attr.quote();
                }
            }
        }
    }

    fn finish(&mut self, view: &TokenView<'_>) {
        let token = view.token();
        self.id = token.tag_id();
        self.empty_element = token.is_empty_element();
    }
}

/// Merges tag parts and adjacent text tokens into logical tokens.
///
/// A document tokenized with any window size or chunking assembles to the
/// same sequence.
#[derive(Debug, Default)]
pub struct TokenAssembler {
    tokens: Vec<OwnedToken>,
    open_tag: Option<OwnedTag>,
}

impl TokenAssembler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, view: TokenView<'_>) {
        match view.kind() {
            Some(TokenKind::Text) => {
                let text = view.text();
                if let Some(OwnedToken::Text(previous)) = self.tokens.last_mut() {
                    previous.push_str(&text);
                } else {
                    self.tokens.push(OwnedToken::Text(text.into_owned()));
                }
            }
            Some(TokenKind::Tag) => self.push_tag_part(&view),
            Some(_) => self.tokens.push(view.to_owned_token()),
            None => {}
        }
    }

    fn push_tag_part(&mut self, view: &TokenView<'_>) {
        let major = view.major();
        if major.is_begun_here() {
            self.open_tag = Some(OwnedTag::started(view));
        }
        let Some(tag) = self.open_tag.as_mut() else {
            log::debug!(target: "html_token.assembler", "tag part without a beginning");
            return;
        };
        tag.append_part(view);
        if major.is_ended_here()
            && let Some(mut tag) = self.open_tag.take()
        {
            tag.finish(view);
            self.tokens.push(OwnedToken::Tag(tag));
        }
    }

    pub fn tokens(&self) -> &[OwnedToken] {
        &self.tokens
    }

    pub fn into_tokens(self) -> Vec<OwnedToken> {
        self.tokens
    }
}
