//! Token consumer that writes normalized HTML and runs per-tag callbacks.
//!
//! The rewriter pulls tokens from a [`Tokenizer`]. Complete start tags (and
//! end tags whose start tag asked for it) go through the callback, which
//! decides via the [`TagContext`] whether the tag is written, deleted or
//! rewritten. Actions that reach past the tag itself, such as deleting the
//! matching end tag or the content in between, are tracked on a bounded
//! stack of open tags.

mod writer;

pub use writer::HtmlWriter;

use crate::config::RewriterConfig;
use crate::context::{TagContext, TagContextState, TagDecision};
use crate::error::{InvalidOperation, RewriteError};
use crate::names::{ContentModel, TagId};
use crate::token::{Major, Token, TokenKind, TokenView};
use crate::tokenizer::{InputSource, StrSource, Tokenizer};

/// Per-tag callback. A callback that decides nothing leaves the tag as
/// written in the input.
pub type TagCallback =
    Box<dyn FnMut(&mut TagContext<'_>, &mut HtmlWriter) -> Result<(), InvalidOperation>>;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RewriteStatus {
    /// The source has nothing more for now; push input and run again.
    NeedInput,
    Finished,
}

/// Identity used to match an end tag to its start tag.
#[derive(Clone, Debug, PartialEq, Eq)]
enum TagKey {
    Known(TagId),
    Named(String),
}

impl TagKey {
    fn of(view: &TokenView<'_>) -> TagKey {
        match view.tag_id() {
            TagId::Unknown => TagKey::Named(view.name().to_ascii_lowercase()),
            id => TagKey::Known(id),
        }
    }
}

#[derive(Clone, Debug)]
struct OpenTag {
    key: TagKey,
    delete_end_tag: bool,
    delete_inner: bool,
    invoke_end_callback: bool,
}

impl OpenTag {
    fn plain(key: TagKey) -> Self {
        Self {
            key,
            delete_end_tag: false,
            delete_inner: false,
            invoke_end_callback: false,
        }
    }

    fn has_actions(&self) -> bool {
        self.delete_end_tag || self.delete_inner || self.invoke_end_callback
    }
}

/// Result of handing one complete tag to the callback.
struct Outcome {
    written: bool,
    delete_end_tag: bool,
    delete_inner: bool,
    invoke_end_callback: bool,
}

impl Outcome {
    fn written() -> Self {
        Self {
            written: true,
            delete_end_tag: false,
            delete_inner: false,
            invoke_end_callback: false,
        }
    }
}

/// Everything except the tokenizer, so tokens can be borrowed from the
/// tokenizer while the output side is mutated.
struct Sink {
    config: RewriterConfig,
    writer: HtmlWriter,
    callback: Option<TagCallback>,
    context: TagContextState,
    open_tags: Vec<OpenTag>,
    /// Open tags whose content is being deleted.
    inner_deletes: usize,
    /// Inside raw-text content; whether its start tag was written.
    raw_text: Option<bool>,
    /// A tag longer than the window is arriving in parts; whether it is
    /// being written.
    streaming: Option<bool>,
}

pub struct HtmlRewriter<S> {
    tokenizer: Tokenizer<S>,
    sink: Sink,
    finished: bool,
}

impl<'a> HtmlRewriter<StrSource<'a>> {
    pub fn for_str(html: &'a str) -> Self {
        Self::new(StrSource::new(html))
    }
}

impl<S: InputSource> HtmlRewriter<S> {
    pub fn new(source: S) -> Self {
        Self::with_config(source, RewriterConfig::default())
    }

    pub fn with_config(source: S, config: RewriterConfig) -> Self {
        Self {
            tokenizer: Tokenizer::with_config(source, config.tokenizer),
            sink: Sink {
                config,
                writer: HtmlWriter::new(),
                callback: None,
                context: TagContextState::new(),
                open_tags: Vec::new(),
                inner_deletes: 0,
                raw_text: None,
                streaming: None,
            },
            finished: false,
        }
    }

    /// Installs the per-tag callback, replacing any previous one.
    pub fn set_callback<F>(&mut self, callback: F)
    where
        F: FnMut(&mut TagContext<'_>, &mut HtmlWriter) -> Result<(), InvalidOperation> + 'static,
    {
        self.sink.callback = Some(Box::new(callback));
    }

    pub fn tokenizer(&self) -> &Tokenizer<S> {
        &self.tokenizer
    }

    /// Access to the tokenizer, e.g. to push input into its source.
    pub fn tokenizer_mut(&mut self) -> &mut Tokenizer<S> {
        &mut self.tokenizer
    }

    /// Output written so far.
    pub fn output(&self) -> &str {
        self.sink.writer.as_str()
    }

    /// Hands the output written so far to the caller. Output that has left
    /// the rewriter cannot be taken back, so restart is disabled.
    pub fn take_output(&mut self) -> String {
        self.tokenizer.disable_restart();
        self.sink.writer.take()
    }

    pub fn can_restart(&self) -> bool {
        self.tokenizer.can_restart()
    }

    /// Rewinds the input; the output written so far is discarded on the
    /// next `run()`.
    pub fn restart(&mut self) -> Result<(), RewriteError> {
        self.tokenizer.restart()?;
        self.finished = false;
        Ok(())
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Consumes tokens until the source runs dry or the document ends.
    pub fn run(&mut self) -> Result<RewriteStatus, RewriteError> {
        if self.finished {
            return Ok(RewriteStatus::Finished);
        }
        while let Some(kind) = self.tokenizer.parse()? {
            match kind {
                TokenKind::Text => self.sink.text(&self.tokenizer.view()),
                TokenKind::Tag => self.sink.tag(self.tokenizer.view())?,
                TokenKind::EndOfFile => {
                    self.sink.writer.finish_tag(false);
                    self.finished = true;
                    return Ok(RewriteStatus::Finished);
                }
                TokenKind::Restart => self.sink.reset(),
                TokenKind::EncodingChange
                | TokenKind::OverlappedClose
                | TokenKind::OverlappedReopen => {}
            }
        }
        Ok(RewriteStatus::NeedInput)
    }

    /// Runs to the end and returns the whole output.
    pub fn finish(mut self) -> Result<String, RewriteError> {
        match self.run()? {
            RewriteStatus::Finished => {}
            RewriteStatus::NeedInput => {
                log::debug!(target: "html_token.rewriter", "source still pending at finish");
                self.sink.writer.finish_tag(false);
            }
        }
        Ok(self.take_output())
    }
}

impl Sink {
    fn reset(&mut self) {
        log::debug!(target: "html_token.rewriter", "restart: discarding {} bytes of output", self.writer.len());
        self.writer.clear();
        self.open_tags.clear();
        self.inner_deletes = 0;
        self.raw_text = None;
        self.streaming = None;
    }

    fn text(&mut self, view: &TokenView<'_>) {
        if self.inner_deletes > 0 {
            return;
        }
        match self.raw_text {
            Some(true) => self.writer.write_raw(&view.text()),
            _ => self.writer.write_text(&view.text()),
        }
    }

    fn tag(&mut self, view: TokenView<'_>) -> Result<(), RewriteError> {
        let token = view.token();
        if token.major() != Major::Complete {
            return self.tag_part(view);
        }
        self.raw_text = None;
        if token.tag_id().is_pseudo() {
            self.unstructured(&view);
            return Ok(());
        }
        if token.is_end_tag() {
            self.end_tag(view)
        } else {
            self.start_tag(view)
        }
    }

    fn unstructured(&mut self, view: &TokenView<'_>) {
        if self.inner_deletes > 0 {
            return;
        }
        match view.tag_id() {
            TagId::Comment if self.config.keep_comments => {
                self.writer.write_comment(&view.unstructured())
            }
            TagId::Doctype => self.writer.write_doctype(&view.unstructured()),
            _ => {}
        }
    }

    fn start_tag(&mut self, view: TokenView<'_>) -> Result<(), RewriteError> {
        let token = view.token();
        if self.inner_deletes > 0 {
            if is_tracked(token) {
                self.push_open(OpenTag::plain(TagKey::of(&view)))?;
            }
            return Ok(());
        }
        let outcome = self.dispatch(view)?;
        self.enter_content(token, outcome.written);
        let open = OpenTag {
            key: TagKey::of(&view),
            delete_end_tag: outcome.delete_end_tag,
            delete_inner: outcome.delete_inner,
            invoke_end_callback: outcome.invoke_end_callback,
        };
        if is_tracked(token) && (open.has_actions() || !self.open_tags.is_empty()) {
            self.push_open(open)?;
        }
        Ok(())
    }

    fn end_tag(&mut self, view: TokenView<'_>) -> Result<(), RewriteError> {
        let Some(index) = self.match_open(&view) else {
            if self.inner_deletes == 0 {
                write_tag(&mut self.writer, &view);
            }
            return Ok(());
        };
        let open = self.open_tags[index].clone();
        self.truncate_open(index);
        if self.inner_deletes > 0 || open.delete_end_tag {
            return Ok(());
        }
        if open.invoke_end_callback {
            self.dispatch(view)?;
        } else {
            write_tag(&mut self.writer, &view);
        }
        Ok(())
    }

    /// Runs the callback for a complete tag, or writes it when none is
    /// installed.
    fn dispatch(&mut self, view: TokenView<'_>) -> Result<Outcome, RewriteError> {
        let Some(callback) = self.callback.as_mut() else {
            write_tag(&mut self.writer, &view);
            return Ok(Outcome::written());
        };
        self.context.initialize(&view)?;
        let result = callback(&mut TagContext::new(&mut self.context, view), &mut self.writer);
        self.context.uninitialize();
        result?;

        let token = view.token();
        match self.context.decision() {
            TagDecision::Undefined => write_tag(&mut self.writer, &view),
            TagDecision::Written => {
                if self.context.copies_input_attributes() && !token.is_end_tag() {
                    for (index, attr) in view.attributes().enumerate() {
                        if !self.context.is_attribute_written(index) {
                            self.writer
                                .write_attribute(&attr.canonical_name(), attr.value().as_deref())?;
                        }
                    }
                }
                self.writer.finish_tag(token.is_empty_element());
            }
            TagDecision::Deleted => {}
        }
        Ok(Outcome {
            written: self.context.decision() != TagDecision::Deleted,
            delete_end_tag: self.context.deletes_end_tag(),
            delete_inner: self.context.deletes_inner_content(),
            invoke_end_callback: self.context.invokes_end_tag_callback(),
        })
    }

    /// A part of a tag longer than the window. The callback protocol only
    /// sees complete tags, so with a callback installed these tags are
    /// dropped.
    fn tag_part(&mut self, view: TokenView<'_>) -> Result<(), RewriteError> {
        let token = view.token();
        let major = token.major();
        if major.is_begun_here() {
            let id = token.tag_id();
            let keep = self.callback.is_none()
                && self.inner_deletes == 0
                && !id.is_pseudo()
                && token.progress().name().is_ended();
            if !keep && self.inner_deletes == 0 {
                log::debug!(
                    target: "html_token.rewriter",
                    "dropping {id:?} tag longer than the {} byte window",
                    self.config.tokenizer.buffer_window
                );
            }
            self.streaming = Some(keep);
            self.raw_text = None;
        }
        let Some(keep) = self.streaming else {
            return Ok(());
        };
        if keep {
            stream_part(&mut self.writer, &view);
        }
        if !major.is_ended_here() {
            return Ok(());
        }
        self.streaming = None;
        if token.tag_id().is_pseudo() {
            return Ok(());
        }
        if token.is_end_tag() {
            if let Some(index) = self.match_open(&view) {
                self.truncate_open(index);
            }
            return Ok(());
        }
        if self.inner_deletes == 0 {
            self.enter_content(token, keep);
        }
        if is_tracked(token) && !self.open_tags.is_empty() {
            self.push_open(OpenTag::plain(TagKey::of(&view)))?;
        }
        Ok(())
    }

    fn enter_content(&mut self, token: &Token, written: bool) {
        if token.is_end_tag() {
            return;
        }
        if matches!(
            token.tag_id().content_model(),
            ContentModel::RawText | ContentModel::PlainText
        ) {
            self.raw_text = Some(written);
        }
    }

    fn push_open(&mut self, open: OpenTag) -> Result<(), RewriteError> {
        let limit = self.config.max_open_tags;
        if self.open_tags.len() >= limit {
            return Err(RewriteError::NestingLimitExceeded { limit });
        }
        if open.delete_inner {
            self.inner_deletes += 1;
        }
        self.open_tags.push(open);
        Ok(())
    }

    fn match_open(&self, view: &TokenView<'_>) -> Option<usize> {
        if self.open_tags.is_empty() {
            return None;
        }
        let key = TagKey::of(view);
        self.open_tags.iter().rposition(|open| open.key == key)
    }

    /// Pops `index` and everything opened after it.
    fn truncate_open(&mut self, index: usize) {
        let removed = self.open_tags[index..]
            .iter()
            .filter(|open| open.delete_inner)
            .count();
        self.inner_deletes -= removed;
        self.open_tags.truncate(index);
    }
}

/// Tags that can have content and a matching end tag.
fn is_tracked(token: &Token) -> bool {
    !token.is_end_tag() && !token.is_empty_element() && !token.tag_id().is_void()
}

/// Writes a complete tag as it appeared in the input, normalized.
fn write_tag(writer: &mut HtmlWriter, view: &TokenView<'_>) {
    let token = view.token();
    writer.start_tag(&view.canonical_name(), token.is_end_tag());
    if !token.is_end_tag() {
        for attr in view.attributes() {
            writer.push_attribute(&attr.canonical_name(), attr.value().as_deref());
        }
    }
    writer.finish_tag(token.is_empty_element());
}

/// Writes one part of a tag that is arriving in parts.
fn stream_part(writer: &mut HtmlWriter, view: &TokenView<'_>) {
    let token = view.token();
    let major = token.major();
    if major.is_begun_here() {
        writer.start_tag(&view.canonical_name(), token.is_end_tag());
    }
    if !token.is_end_tag() {
        for attr in view.attributes() {
            let progress = attr.progress();
            if progress.name().is_begun_here() {
                if progress.name().is_ended() {
                    writer.push_attribute_name(&attr.canonical_name());
                } else {
                    writer.skip_attribute();
                }
            }
            if attr.has_value() {
                if progress.value().is_begun_here() {
                    writer.open_attribute_value();
                }
                if let Some(value) = attr.value() {
                    writer.append_attribute_value(&value);
                }
            }
            if progress.is_complete() {
                writer.close_attribute();
            }
        }
    }
    if major.is_ended_here() {
        writer.finish_tag(token.is_empty_element());
    }
}
