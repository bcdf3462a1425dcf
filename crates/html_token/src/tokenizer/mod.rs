//! Pull tokenizer.
//!
//! [`Tokenizer::parse`] advances to the next token and leaves it in place;
//! [`Tokenizer::token`] and [`Tokenizer::view`] read it until the next call.
//!
//! Invariants:
//! - Chunk-equivalence: the token sequence does not depend on how the
//!   source delivers its input. Decisions that need lookahead wait for it,
//!   and the window only counts as full when it really holds a full window
//!   of input.
//! - Window: the buffer keeps everything from the start of the current
//!   token (or of a carried attribute). Consumed input is compacted away
//!   before reads and every stored offset is rebased.

mod scan;
mod source;

pub use source::{
    ByteSource, DEFAULT_RESTART_HISTORY, InputSource, PushSource, SourceRead, StrSource,
};

use std::collections::VecDeque;

use encoding_rs::Encoding;

use crate::builder::TokenBuilder;
use crate::config::TokenizerConfig;
use crate::error::TokenizerError;
use crate::store::{CharBuffer, shift_offset};
use crate::token::{Token, TokenKind, TokenView};
use scan::{ScanInput, ScanState, Scanner, Step};

/// Tokenizer instrumentation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TokenizerStats {
    pub tokens_emitted: u64,
    /// Tag parts emitted because the window filled up.
    pub partial_parts: u64,
    pub compactions: u64,
    pub bytes_read: u64,
}

/// What the previous `parse()` left in the builder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Returned {
    Nothing,
    Whole,
    TagPart,
}

/// Marker tokens waiting for the next token boundary.
#[derive(Clone, Copy, Debug)]
enum Pending {
    EncodingChange(&'static Encoding),
    OverlappedClose(u32),
    Restart,
}

/// Injected markup occupies the buffer up to `end`.
#[derive(Clone, Copy, Debug)]
struct Injection {
    end: usize,
    open_tags: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Fill {
    Data,
    Pending,
    Eof,
    WindowFull,
}

pub struct Tokenizer<S> {
    config: TokenizerConfig,
    source: S,
    buffer: CharBuffer,
    builder: TokenBuilder,
    scanner: Scanner,
    /// Buffer offset of the oldest byte still referenced.
    retain_from: usize,
    returned: Returned,
    pending: VecDeque<Pending>,
    injection: Option<Injection>,
    source_done: bool,
    /// EndOfFile was returned.
    finished: bool,
    restart_disabled: bool,
    stats: TokenizerStats,
}

impl<'a> Tokenizer<StrSource<'a>> {
    /// Tokenizes an in-memory document with the default configuration.
    pub fn for_str(text: &'a str) -> Self {
        Self::new(StrSource::new(text))
    }
}

impl<S: InputSource> Tokenizer<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, TokenizerConfig::default())
    }

    pub fn with_config(source: S, config: TokenizerConfig) -> Self {
        Self {
            buffer: CharBuffer::with_window(config.window()),
            builder: TokenBuilder::new(config.max_attributes, config.initial_attribute_capacity),
            scanner: Scanner::new(),
            config,
            source,
            retain_from: 0,
            returned: Returned::Nothing,
            pending: VecDeque::new(),
            injection: None,
            source_done: false,
            finished: false,
            restart_disabled: false,
            stats: TokenizerStats::default(),
        }
    }

    pub fn config(&self) -> &TokenizerConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Access to the source, e.g. to push more input into a
    /// [`PushSource`] between calls to [`Tokenizer::parse`].
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// The current token. Valid until the next `parse()`.
    pub fn token(&self) -> &Token {
        self.builder.token()
    }

    /// The current token with the buffer its runs point into.
    pub fn view(&self) -> TokenView<'_> {
        TokenView::new(self.builder.token(), self.buffer.as_str())
    }

    pub fn stats(&self) -> TokenizerStats {
        self.stats
    }

    /// Advances to the next token.
    ///
    /// `Ok(None)` means the source has nothing more for now, or EndOfFile
    /// was already returned.
    pub fn parse(&mut self) -> Result<Option<TokenKind>, TokenizerError> {
        self.finish_returned();
        if let Some(kind) = self.take_pending() {
            return Ok(Some(kind));
        }
        loop {
            let limit = self.injection.map_or(self.buffer.len(), |injection| injection.end);
            let input = ScanInput {
                text: self.buffer.as_str(),
                limit,
                at_end: self.injection.is_some() || self.source_done,
            };
            match self.scanner.step(&input, &mut self.builder)? {
                Step::Token => return Ok(self.emit(Returned::Whole)),
                Step::Exhausted => return Ok(self.exhausted()),
                Step::NeedInput => match self.fill() {
                    Fill::Data | Fill::Eof => {
                        if let Some(kind) = self.take_pending() {
                            return Ok(Some(kind));
                        }
                    }
                    Fill::Pending => return Ok(None),
                    Fill::WindowFull => return Ok(self.emit_partial()),
                },
            }
        }
    }

    /// Restart is possible while it has not been disabled and the source
    /// can rewind.
    pub fn can_restart(&self) -> bool {
        !self.restart_disabled && self.source.can_restart()
    }

    /// Rewinds to the beginning of the input. The next token is
    /// [`TokenKind::Restart`].
    pub fn restart(&mut self) -> Result<(), TokenizerError> {
        if !self.can_restart() {
            return Err(TokenizerError::RestartUnavailable);
        }
        log::debug!(target: "html_token.tokenizer", "restarting from the beginning of the input");
        self.source.restart();
        self.buffer.clear();
        self.builder.reset();
        self.scanner = Scanner::new();
        self.retain_from = 0;
        self.returned = Returned::Nothing;
        self.pending.clear();
        self.pending.push_back(Pending::Restart);
        self.injection = None;
        self.source_done = false;
        self.finished = false;
        Ok(())
    }

    /// Permanently gives up restart; the source may drop its history.
    pub fn disable_restart(&mut self) {
        self.restart_disabled = true;
        self.source.disable_restart();
    }

    /// Inserts `html` at the current position, between two tokens of data
    /// content.
    ///
    /// The following `parse()` calls yield `OverlappedClose(open_tags)`,
    /// the tokens of `html` (anything left open at its end is closed),
    /// `OverlappedReopen(open_tags)`, and then the original stream.
    pub fn inject(&mut self, html: &str, open_tags: u32) -> Result<(), TokenizerError> {
        let limit = self.config.injection_limit();
        if html.len() > limit {
            return Err(TokenizerError::InjectionTooLarge {
                len: html.len(),
                limit,
            });
        }
        self.finish_returned();
        if self.injection.is_some()
            || !self.builder.is_idle()
            || self.scanner.state() != ScanState::Data
        {
            return Err(TokenizerError::InjectionNotAtBoundary);
        }
        let at = self.scanner.pos();
        self.buffer.insert_str(at, html);
        self.injection = Some(Injection {
            end: at + html.len(),
            open_tags,
        });
        self.pending.push_back(Pending::OverlappedClose(open_tags));
        Ok(())
    }

    /// Releases what the previous `parse()` returned.
    fn finish_returned(&mut self) {
        match std::mem::replace(&mut self.returned, Returned::Nothing) {
            Returned::Nothing => {}
            Returned::Whole => {
                self.builder.reset();
                self.retain_from = self.scanner.pos();
            }
            Returned::TagPart => {
                self.retain_from = self.builder.rewind_tag(self.scanner.pos());
            }
        }
    }

    fn take_pending(&mut self) -> Option<TokenKind> {
        if !self.builder.is_idle() {
            return None;
        }
        match self.pending.pop_front()? {
            Pending::EncodingChange(encoding) => self.builder.make_encoding_change(encoding),
            Pending::OverlappedClose(open_tags) => self
                .builder
                .make_overlapped(TokenKind::OverlappedClose, open_tags),
            Pending::Restart => self.builder.make_restart(),
        }
        self.emit(Returned::Whole)
    }

    fn emit(&mut self, returned: Returned) -> Option<TokenKind> {
        self.returned = returned;
        self.stats.tokens_emitted += 1;
        let kind = self.builder.token().kind();
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(
            target: "html_token.tokenizer",
            "emit {kind:?} ({returned:?}) @{}",
            self.scanner.pos()
        );
        kind
    }

    /// Input ended with no token open.
    fn exhausted(&mut self) -> Option<TokenKind> {
        if let Some(injection) = self.injection.take() {
            self.scanner.reset_state();
            self.builder
                .make_overlapped(TokenKind::OverlappedReopen, injection.open_tags);
            return self.emit(Returned::Whole);
        }
        if self.finished {
            return None;
        }
        self.finished = true;
        self.builder.make_end_of_file();
        self.emit(Returned::Whole)
    }

    /// The window is full and the scanner needs more: emit what is open.
    fn emit_partial(&mut self) -> Option<TokenKind> {
        let pos = self.scanner.pos();
        if self.builder.has_text() {
            self.builder.end_text();
            return self.emit(Returned::Whole);
        }
        if self.builder.in_tag() {
            let carry_limit = self.config.window() / 2;
            self.builder
                .end_tag(false, pos, self.buffer.as_str(), carry_limit);
            log::debug!(
                target: "html_token.tokenizer",
                "tag exceeds the {} byte window, emitting a part at offset {pos}",
                self.config.window()
            );
            self.stats.partial_parts += 1;
            return self.emit(Returned::TagPart);
        }
        debug_assert!(false, "window full between tokens at offset {pos}");
        None
    }

    fn fill(&mut self) -> Fill {
        if self.source_done {
            return Fill::Eof;
        }
        if self.builder.is_idle() {
            self.retain_from = self.scanner.pos();
        }
        if self.retain_from >= self.config.window() / 2 {
            self.compact();
        }

        let mut read_any = false;
        loop {
            let room = self.buffer.room(self.retain_from);
            if room == 0 {
                return if read_any { Fill::Data } else { Fill::WindowFull };
            }
            match self.source.read(self.buffer.text_mut(), room) {
                SourceRead::Data(0) => {
                    return if read_any { Fill::Data } else { Fill::WindowFull };
                }
                SourceRead::Data(n) => {
                    read_any = true;
                    self.stats.bytes_read += n as u64;
                }
                SourceRead::Pending => {
                    return if read_any { Fill::Data } else { Fill::Pending };
                }
                SourceRead::Eof => {
                    self.source_done = true;
                    return if read_any { Fill::Data } else { Fill::Eof };
                }
                SourceRead::EncodingChange(encoding) => {
                    self.pending.push_back(Pending::EncodingChange(encoding));
                }
            }
        }
    }

    fn compact(&mut self) {
        let delta = self.buffer.compact(self.retain_from);
        if delta == 0 {
            return;
        }
        self.builder.rebase(delta);
        self.scanner.rebase(delta);
        if let Some(injection) = self.injection.as_mut() {
            injection.end = shift_offset(injection.end, delta);
        }
        self.retain_from = 0;
        self.stats.compactions += 1;
        #[cfg(any(test, feature = "debug-stats"))]
        log::trace!(target: "html_token.tokenizer", "compacted by {delta}");
    }
}

#[cfg(test)]
mod tests;
