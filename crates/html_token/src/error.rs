//! Error types surfaced by the tokenizer, the tag callback protocol and the
//! rewriter.
//!
//! Malformed markup is never an error: the scanner resolves it with the
//! empty-closure rules. Errors are reserved for resource limits and for
//! consumer misuse of the protocol.

use std::fmt;

/// Fatal tokenizer failure returned from [`crate::Tokenizer::parse`] and the
/// driver operations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TokenizerError {
    /// A single tag carried more attributes than
    /// [`crate::TokenizerConfig::max_attributes`].
    AttributeLimitExceeded { limit: usize },
    /// Injected markup is larger than the injection bound.
    InjectionTooLarge { len: usize, limit: usize },
    /// Injection was requested while a token was still being assembled, or
    /// outside plain data content.
    InjectionNotAtBoundary,
    /// `restart()` was called after restart was disabled, or the source
    /// cannot rewind.
    RestartUnavailable,
}

impl fmt::Display for TokenizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenizerError::AttributeLimitExceeded { limit } => {
                write!(f, "tag exceeds the attribute limit of {limit}")
            }
            TokenizerError::InjectionTooLarge { len, limit } => {
                write!(f, "injected markup of {len} bytes exceeds the limit of {limit}")
            }
            TokenizerError::InjectionNotAtBoundary => {
                f.write_str("injection is only allowed between tokens in data content")
            }
            TokenizerError::RestartUnavailable => f.write_str("restart is not available"),
        }
    }
}

impl std::error::Error for TokenizerError {}

/// Misuse of the tag callback protocol.
///
/// These are consumer bugs, never caused by input markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InvalidOperation {
    /// The tag was already written or deleted.
    AlreadyDecided,
    /// The attribute handle belongs to an earlier tag.
    StaleAttributeHandle,
    AttributeIndexOutOfRange,
    /// The tag context was used outside its initialize/uninitialize window.
    OutsideCallback,
    /// The context was initialized with something other than a complete
    /// tag.
    IncompleteTag,
    /// An attribute write was attempted before the tag itself was written.
    TagNotWritten,
    /// An attribute value write was not preceded by an attribute name write.
    AttributeNameNotWritten,
}

impl fmt::Display for InvalidOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = match self {
            InvalidOperation::AlreadyDecided => "tag was already written or deleted",
            InvalidOperation::StaleAttributeHandle => "attribute handle belongs to another tag",
            InvalidOperation::AttributeIndexOutOfRange => "attribute index out of range",
            InvalidOperation::OutsideCallback => "tag context used outside its callback",
            InvalidOperation::IncompleteTag => "tag context needs a complete tag",
            InvalidOperation::TagNotWritten => "attribute written before its tag",
            InvalidOperation::AttributeNameNotWritten => {
                "attribute value written without an attribute name"
            }
        };
        f.write_str(msg)
    }
}

impl std::error::Error for InvalidOperation {}

/// Failure while rewriting a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewriteError {
    Tokenizer(TokenizerError),
    Callback(InvalidOperation),
    /// Too many open tags carried pending end-tag actions at once.
    NestingLimitExceeded { limit: usize },
}

impl fmt::Display for RewriteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RewriteError::Tokenizer(err) => write!(f, "tokenizer error: {err}"),
            RewriteError::Callback(err) => write!(f, "invalid tag callback operation: {err}"),
            RewriteError::NestingLimitExceeded { limit } => {
                write!(f, "more than {limit} tracked open tags")
            }
        }
    }
}

impl std::error::Error for RewriteError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RewriteError::Tokenizer(err) => Some(err),
            RewriteError::Callback(err) => Some(err),
            RewriteError::NestingLimitExceeded { .. } => None,
        }
    }
}

impl From<TokenizerError> for RewriteError {
    fn from(err: TokenizerError) -> Self {
        RewriteError::Tokenizer(err)
    }
}

impl From<InvalidOperation> for RewriteError {
    fn from(err: InvalidOperation) -> Self {
        RewriteError::Callback(err)
    }
}
