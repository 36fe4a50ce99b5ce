//! Source position tracking and mapping for luna-instrument.
//!
//! This crate provides the position plumbing shared by the assertion rewriter
//! and the coverage remapper:
//! - converting offsets to 1-based line / 0-based column positions and back
//! - recording text edits and deriving a position-preserving map from them
//! - decoding inline revision 3 source maps and querying them with a bias
//!
//! All offsets, columns and lengths are measured in UTF-16 code units, the
//! unit JavaScript engines use for string indices and coverage ranges.

mod builder;
mod decoded;
mod edits;
mod error;
mod line_index;
mod lookup;
mod span;
pub mod vlq;

pub use builder::{Mapping, SourceMap, SourceMapBuilder};
pub use decoded::{DecodedSourceMap, RawSourceMap, Token, TokenOrigin, INLINE_MARKER};
pub use edits::{TextEdit, TextEdits};
pub use error::SourceMapError;
pub use line_index::{utf16_len, LineIndex, SourcePosition};
pub use lookup::{Bias, LookupSession, OriginalPosition, OriginalPositionLookup};
pub use span::{CharOffset, Span};
