//! Tokenizer and rewriter configuration.

/// Smallest inspection window the tokenizer accepts.
pub const MIN_BUFFER_WINDOW: usize = 256;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenizerConfig {
    /// Bytes of decoded input kept in view at once. Tags longer than this
    /// are emitted in parts. Values below [`MIN_BUFFER_WINDOW`] are raised
    /// to it.
    pub buffer_window: usize,
    /// Maximum attributes per tag, counted across all parts of the tag.
    pub max_attributes: usize,
    /// First allocation of the attribute list; it grows geometrically up to
    /// `max_attributes`.
    pub initial_attribute_capacity: usize,
    /// Upper bound for [`crate::Tokenizer::inject`]; never more than half
    /// the window.
    pub max_injection_len: usize,
}

impl Default for TokenizerConfig {
    fn default() -> Self {
        Self {
            buffer_window: 16 * 1024,
            max_attributes: 256,
            initial_attribute_capacity: 8,
            max_injection_len: 4 * 1024,
        }
    }
}

impl TokenizerConfig {
    pub fn with_window(buffer_window: usize) -> Self {
        Self {
            buffer_window,
            ..Self::default()
        }
    }

    pub(crate) fn window(&self) -> usize {
        self.buffer_window.max(MIN_BUFFER_WINDOW)
    }

    pub(crate) fn injection_limit(&self) -> usize {
        self.max_injection_len.min(self.window() / 2)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RewriterConfig {
    pub tokenizer: TokenizerConfig,
    /// Write comments to the output instead of dropping them.
    pub keep_comments: bool,
    /// Bound on tags tracked for pending end-tag actions.
    pub max_open_tags: usize,
}

impl Default for RewriterConfig {
    fn default() -> Self {
        Self {
            tokenizer: TokenizerConfig::default(),
            keep_comments: false,
            max_open_tags: 512,
        }
    }
}
