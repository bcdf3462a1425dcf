//! Shared character buffer, run list and fragments.
//!
//! Every piece of token text is a run: a span of the buffer tagged with its
//! lexical kind and text class. Fragments group consecutive runs into one
//! logical string. Nothing here copies characters out of the buffer until a
//! reader asks for an owned value.

mod buffer;
mod fragment;
mod run;

pub use buffer::CharBuffer;
pub use fragment::{Fragment, Pieces, ReadMode, TextPiece};
pub use run::{Run, RunKind, RunStore, TextClass};

pub(crate) use buffer::shift_offset;
