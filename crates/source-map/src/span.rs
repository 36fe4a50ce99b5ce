//! Offset spans in UTF-16 code units.

use serde::{Deserialize, Serialize};
use text_size::TextSize;

/// An offset into a source string, in UTF-16 code units.
pub type CharOffset = TextSize;

/// A half-open `[start, end)` range of offsets.
///
/// Serialized as `{"start": n, "end": n}`, the shape browser drivers use for
/// executed ranges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Span {
    pub start: CharOffset,
    pub end: CharOffset,
}

impl Span {
    #[inline]
    pub fn new(start: impl Into<CharOffset>, end: impl Into<CharOffset>) -> Self {
        Self {
            start: start.into(),
            end: end.into(),
        }
    }

    /// Number of code units covered.
    #[inline]
    pub fn len(&self) -> TextSize {
        self.end - self.start
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }

    /// Returns true if `offset` lies inside this span.
    #[inline]
    pub fn contains(&self, offset: CharOffset) -> bool {
        self.start <= offset && offset < self.end
    }

    /// Returns true if this span and `other` share at least one offset.
    #[inline]
    pub fn overlaps(&self, other: Span) -> bool {
        self.start < other.end && other.start < self.end
    }
}
