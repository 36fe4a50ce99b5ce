//! Biased lookups of original positions.

use crate::decoded::{DecodedSourceMap, Token};
use crate::line_index::SourcePosition;
use std::ops::Range;

/// Tie-break rule for positions without an exact mapping segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Bias {
    /// Use the closest segment at or before the position.
    #[default]
    GreatestLowerBound,
    /// Use the closest segment at or after the position ("nearest following").
    LeastUpperBound,
}

/// A resolved location in an original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OriginalPosition {
    /// Index of the original source in the map's `sources`.
    pub source: usize,
    /// 1-based line.
    pub line: u32,
    /// 0-based column.
    pub column: u32,
}

impl OriginalPosition {
    /// Returns the line/column part of this position.
    #[inline]
    pub fn position(&self) -> SourcePosition {
        SourcePosition::new(self.line, self.column)
    }
}

/// Resolves generated positions to original positions.
pub trait OriginalPositionLookup {
    /// Returns the original position for a generated position, or `None` when
    /// no segment on the same generated line satisfies the bias or the chosen
    /// segment has no original location.
    fn original_position_for(&self, position: SourcePosition, bias: Bias) -> Option<OriginalPosition>;
}

/// A lookup session over a decoded map.
///
/// The session borrows the map, so it cannot outlive the pass it was opened for.
#[derive(Debug)]
pub struct LookupSession<'a> {
    map: &'a DecodedSourceMap,
    /// `lines[i]` is the token range of generated line `i + 1`.
    lines: Vec<Range<usize>>,
}

impl<'a> LookupSession<'a> {
    pub(crate) fn new(map: &'a DecodedSourceMap) -> Self {
        let tokens = map.tokens();
        let line_count = tokens.last().map_or(0, |t| t.generated.line as usize);
        let mut lines = vec![0..0; line_count];

        let mut start = 0;
        while start < tokens.len() {
            let line = tokens[start].generated.line;
            let end = start + tokens[start..].partition_point(|t| t.generated.line == line);
            if let Some(slot) = (line as usize).checked_sub(1).and_then(|i| lines.get_mut(i)) {
                *slot = start..end;
            }
            start = end;
        }

        Self { map, lines }
    }

    /// Returns the map this session reads from.
    pub fn map(&self) -> &'a DecodedSourceMap {
        self.map
    }

    /// Returns the path of the source at `index`.
    pub fn source(&self, index: usize) -> Option<&'a str> {
        self.map.source(index)
    }

    fn line_tokens(&self, line: u32) -> &'a [Token] {
        let tokens = self.map.tokens();
        (line as usize)
            .checked_sub(1)
            .and_then(|i| self.lines.get(i))
            .map_or(&[][..], |range| &tokens[range.clone()])
    }
}

impl OriginalPositionLookup for LookupSession<'_> {
    fn original_position_for(&self, position: SourcePosition, bias: Bias) -> Option<OriginalPosition> {
        let tokens = self.line_tokens(position.line);
        let token = match bias {
            Bias::GreatestLowerBound => {
                let idx = tokens.partition_point(|t| t.generated.column <= position.column);
                tokens.get(idx.checked_sub(1)?)
            }
            Bias::LeastUpperBound => {
                let idx = tokens.partition_point(|t| t.generated.column < position.column);
                tokens.get(idx)
            }
        }?;

        let origin = token.original?;
        Some(OriginalPosition {
            source: origin.source as usize,
            line: origin.line,
            column: origin.column,
        })
    }
}
