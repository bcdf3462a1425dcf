//! Incremental, resumable HTML tokenizer for sanitizing untrusted markup.
//!
//! Token text is never copied out of the shared input buffer: tokens hold
//! runs and fragments that index into it, and consumers copy explicitly.
//! Tags that do not fit the buffer window are emitted in parts, carrying an
//! in-flight attribute across the boundary when it is short enough.
//!
//! The [`HtmlRewriter`] drives a [`Tokenizer`] and hands each complete tag
//! to a callback through a [`TagContext`].

pub mod chunker;
pub mod store;

mod builder;
mod config;
mod context;
mod entities;
mod error;
mod names;
mod rewriter;
mod token;
mod tokenizer;

pub use crate::config::{MIN_BUFFER_WINDOW, RewriterConfig, TokenizerConfig};
pub use crate::context::{AttributeHandle, TagContext, TagContextState, TagDecision};
pub use crate::entities::decode_named;
pub use crate::error::{InvalidOperation, RewriteError, TokenizerError};
pub use crate::names::{AttrId, ContentModel, TagId, lookup_attribute, lookup_tag};
pub use crate::rewriter::{HtmlRewriter, HtmlWriter, RewriteStatus, TagCallback};
pub use crate::token::{
    AttrProgress, AttributeEntry, AttributeView, Major, OwnedAttribute, OwnedTag, OwnedToken,
    Piece, TagFlags, TagProgress, Token, TokenAssembler, TokenKind, TokenView,
};
pub use crate::tokenizer::{
    ByteSource, DEFAULT_RESTART_HISTORY, InputSource, PushSource, SourceRead, StrSource,
    Tokenizer, TokenizerStats,
};

/// Tokenizes a whole document into owned tokens, ending with
/// [`OwnedToken::EndOfFile`].
pub fn tokenize(html: &str) -> Result<Vec<OwnedToken>, TokenizerError> {
    let mut tokenizer = Tokenizer::for_str(html);
    let mut tokens = Vec::new();
    while let Some(kind) = tokenizer.parse()? {
        tokens.push(tokenizer.view().to_owned_token());
        if kind == TokenKind::EndOfFile {
            break;
        }
    }
    Ok(tokens)
}
