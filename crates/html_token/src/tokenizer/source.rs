//! Input stage: sources that append decoded text to the tokenizer buffer.

use std::collections::VecDeque;

use encoding_rs::{Decoder, Encoding, UTF_8};

/// Result of one [`InputSource::read`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceRead {
    /// `n` bytes were appended. `Data(0)` means the next character does not
    /// fit in the space offered.
    Data(usize),
    /// Nothing is available yet; more input may arrive later.
    Pending,
    /// The source switched to another encoding. Text read afterwards is
    /// decoded with it.
    EncodingChange(&'static Encoding),
    Eof,
}

/// Supplier of decoded characters.
pub trait InputSource {
    /// Appends at most `max` bytes of whole characters to `out`.
    fn read(&mut self, out: &mut String, max: usize) -> SourceRead;

    fn can_restart(&self) -> bool {
        false
    }

    /// Rewinds to the beginning of the input.
    fn restart(&mut self) {}

    /// Restart will never be requested again; history may be dropped.
    fn disable_restart(&mut self) {}
}

/// Largest prefix of `text` not longer than `max` bytes that ends on a
/// character boundary.
fn whole_chars(text: &str, max: usize) -> usize {
    if max >= text.len() {
        return text.len();
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    end
}

/// A complete document held in memory.
#[derive(Clone, Debug)]
pub struct StrSource<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> StrSource<'a> {
    pub fn new(text: &'a str) -> Self {
        Self { text, pos: 0 }
    }
}

impl InputSource for StrSource<'_> {
    fn read(&mut self, out: &mut String, max: usize) -> SourceRead {
        let rest = &self.text[self.pos..];
        if rest.is_empty() {
            return SourceRead::Eof;
        }
        let n = whole_chars(rest, max);
        out.push_str(&rest[..n]);
        self.pos += n;
        SourceRead::Data(n)
    }

    fn can_restart(&self) -> bool {
        true
    }

    fn restart(&mut self) {
        self.pos = 0;
    }
}

/// Text pushed by the caller in chunks as it arrives.
#[derive(Debug, Default)]
pub struct PushSource {
    chunks: VecDeque<String>,
    /// Bytes of the front chunk already handed out.
    front_pos: usize,
    closed: bool,
}

impl PushSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, chunk: &str) {
        debug_assert!(!self.closed, "push after close");
        if !chunk.is_empty() {
            self.chunks.push_back(chunk.to_owned());
        }
    }

    /// No more chunks will be pushed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl InputSource for PushSource {
    fn read(&mut self, out: &mut String, max: usize) -> SourceRead {
        let mut written = 0;
        while let Some(front) = self.chunks.front() {
            let rest = &front[self.front_pos..];
            let n = whole_chars(rest, max - written);
            out.push_str(&rest[..n]);
            written += n;
            self.front_pos += n;
            if self.front_pos < front.len() {
                return SourceRead::Data(written);
            }
            self.chunks.pop_front();
            self.front_pos = 0;
        }
        if written > 0 {
            SourceRead::Data(written)
        } else if self.closed {
            SourceRead::Eof
        } else {
            SourceRead::Pending
        }
    }
}

/// Default restart history of a [`ByteSource`].
pub const DEFAULT_RESTART_HISTORY: usize = 1024 * 1024;

/// Bytes pushed by the caller, decoded with `encoding_rs`.
///
/// A byte-order mark at the start of the input selects its encoding. While
/// restart is possible every byte is kept, so the input can be decoded
/// again from the start, for example after [`ByteSource::set_encoding`].
/// Once more than the history limit has been pushed the history is
/// dropped and restart is no longer possible.
pub struct ByteSource {
    encoding: &'static Encoding,
    decoder: Decoder,
    bytes: Vec<u8>,
    /// Next byte handed to the decoder.
    pos: usize,
    closed: bool,
    bom_checked: bool,
    finished: bool,
    keep_history: bool,
    history_limit: usize,
    /// Decoder output; only the prefix written by the last decode is read.
    scratch: Vec<u8>,
}

impl std::fmt::Debug for ByteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ByteSource")
            .field("encoding", &self.encoding.name())
            .field("buffered", &(self.bytes.len() - self.pos))
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl Default for ByteSource {
    fn default() -> Self {
        Self::new(UTF_8)
    }
}

impl ByteSource {
    pub fn new(encoding: &'static Encoding) -> Self {
        Self {
            encoding,
            decoder: encoding.new_decoder_without_bom_handling(),
            bytes: Vec::new(),
            pos: 0,
            closed: false,
            bom_checked: false,
            finished: false,
            keep_history: true,
            history_limit: DEFAULT_RESTART_HISTORY,
            scratch: Vec::new(),
        }
    }

    pub fn encoding(&self) -> &'static Encoding {
        self.encoding
    }

    /// Encoding used after the next restart, and from here on when nothing
    /// has been decoded yet.
    pub fn set_encoding(&mut self, encoding: &'static Encoding) {
        self.encoding = encoding;
        if self.pos == 0 {
            self.decoder = encoding.new_decoder_without_bom_handling();
        }
    }

    /// Bytes kept for restart before the history is dropped.
    pub fn with_history_limit(mut self, limit: usize) -> Self {
        self.history_limit = limit;
        self
    }

    pub fn history_limit(&self) -> usize {
        self.history_limit
    }

    pub fn push(&mut self, bytes: &[u8]) {
        debug_assert!(!self.closed, "push after close");
        self.bytes.extend_from_slice(bytes);
        if self.keep_history && self.bytes.len() > self.history_limit {
            log::debug!(
                target: "html_token.source",
                "input passed the {} byte restart history, restart disabled",
                self.history_limit
            );
            self.drop_history();
        }
    }

    fn drop_history(&mut self) {
        self.keep_history = false;
        self.bytes.drain(..self.pos);
        self.pos = 0;
    }

    pub fn close(&mut self) {
        self.closed = true;
    }

    /// Returns the encoding a leading byte-order mark selects, skipping the
    /// mark. `None` while too few bytes are buffered to tell.
    fn sniff_bom(&mut self) -> Option<Option<&'static Encoding>> {
        const BOMS: [&[u8]; 3] = [b"\xEF\xBB\xBF", b"\xFE\xFF", b"\xFF\xFE"];
        let head = &self.bytes[self.pos..];
        if let Some((encoding, len)) = Encoding::for_bom(head) {
            self.bom_checked = true;
            self.pos += len;
            return Some(Some(encoding));
        }
        if !self.closed && head.len() < 3 && BOMS.iter().any(|bom| bom.starts_with(head)) {
            return None;
        }
        self.bom_checked = true;
        Some(None)
    }
}

impl InputSource for ByteSource {
    fn read(&mut self, out: &mut String, max: usize) -> SourceRead {
        if self.finished {
            return SourceRead::Eof;
        }
        if !self.bom_checked {
            match self.sniff_bom() {
                None => return SourceRead::Pending,
                Some(Some(found)) => {
                    self.decoder = found.new_decoder_without_bom_handling();
                    if found != self.encoding {
                        log::debug!(
                            target: "html_token.source",
                            "byte order mark selects {}",
                            found.name()
                        );
                        self.encoding = found;
                        return SourceRead::EncodingChange(found);
                    }
                }
                Some(None) => {}
            }
        }

        let last = self.closed;
        if self.pos == self.bytes.len() && !last {
            return SourceRead::Pending;
        }
        if self.scratch.len() < max {
            self.scratch.resize(max, 0);
        }
        let (result, read, written, _) =
            self.decoder
                .decode_to_utf8(&self.bytes[self.pos..], &mut self.scratch[..max], last);
        self.pos += read;
        // The decoder only writes whole UTF-8 sequences.
        out.push_str(&String::from_utf8_lossy(&self.scratch[..written]));
        if !self.keep_history {
            self.bytes.drain(..self.pos);
            self.pos = 0;
        }

        match result {
            encoding_rs::CoderResult::InputEmpty if last => {
                self.finished = true;
                if written > 0 {
                    SourceRead::Data(written)
                } else {
                    SourceRead::Eof
                }
            }
            encoding_rs::CoderResult::InputEmpty if written == 0 => SourceRead::Pending,
            _ => SourceRead::Data(written),
        }
    }

    fn can_restart(&self) -> bool {
        self.keep_history
    }

    fn restart(&mut self) {
        self.pos = 0;
        self.finished = false;
        self.bom_checked = false;
        self.decoder = self.encoding.new_decoder_without_bom_handling();
    }

    fn disable_restart(&mut self) {
        self.drop_history();
    }
}
