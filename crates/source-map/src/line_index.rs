//! Line index for offset ↔ line/column conversion.

use crate::CharOffset;
use serde::{Deserialize, Serialize};
use text_size::TextSize;

/// A position in a text blob: 1-based line, 0-based column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SourcePosition {
    /// 1-indexed line number.
    pub line: u32,
    /// 0-indexed column, in UTF-16 code units.
    pub column: u32,
}

impl SourcePosition {
    /// Creates a new position.
    #[inline]
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl Default for SourcePosition {
    fn default() -> Self {
        Self::new(1, 0)
    }
}

/// Returns the length of `text` in UTF-16 code units.
pub fn utf16_len(text: &str) -> u32 {
    text.chars().map(|c| c.len_utf16() as u32).sum()
}

/// An index for conversion between offsets and line/column positions.
///
/// The index stores the offset of the start of each line, enabling O(log n)
/// lookups in both directions.
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// `line_starts[i]` is the offset where line `i + 1` begins.
    line_starts: Vec<CharOffset>,
    len: CharOffset,
}

impl LineIndex {
    /// Creates a new line index from source text.
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![TextSize::from(0)];
        let mut offset = 0u32;

        for c in text.chars() {
            offset += c.len_utf16() as u32;
            if c == '\n' {
                line_starts.push(TextSize::from(offset));
            }
        }

        Self {
            line_starts,
            len: TextSize::from(offset),
        }
    }

    /// Returns the number of lines in the source.
    #[inline]
    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Returns the length of the indexed text.
    #[inline]
    pub fn len(&self) -> CharOffset {
        self.len
    }

    /// Returns true if the indexed text is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == TextSize::from(0)
    }

    /// Converts an offset to a position.
    ///
    /// Returns `None` if the offset is past the end of the text.
    pub fn position(&self, offset: CharOffset) -> Option<SourcePosition> {
        if offset > self.len {
            return None;
        }

        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line - 1,
        };
        let column = u32::from(offset) - u32::from(self.line_starts[line]);

        Some(SourcePosition::new(line as u32 + 1, column))
    }

    /// Converts a position back to an offset.
    ///
    /// The column is clamped to the length of its line (newline excluded) and
    /// lines past the end of the text resolve to the end of the text.
    pub fn offset(&self, position: SourcePosition) -> CharOffset {
        let line = position.line.max(1);
        let (Some(start), Some(end)) = (self.line_start(line), self.line_end(line)) else {
            return self.len;
        };

        let column = position.column.min(u32::from(end - start));
        start + TextSize::from(column)
    }

    /// Returns the offset where a 1-based line starts.
    pub fn line_start(&self, line: u32) -> Option<CharOffset> {
        let index = (line as usize).checked_sub(1)?;
        self.line_starts.get(index).copied()
    }

    /// Returns the offset where a 1-based line ends (before the newline).
    pub fn line_end(&self, line: u32) -> Option<CharOffset> {
        let index = (line as usize).checked_sub(1)?;
        if index >= self.line_starts.len() {
            return None;
        }

        let end = self
            .line_starts
            .get(index + 1)
            .map(|&next| next - TextSize::from(1))
            .unwrap_or(self.len);

        Some(end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_single_line() {
        let index = LineIndex::new("hello world");
        assert_eq!(index.line_count(), 1);
        assert_eq!(
            index.position(TextSize::from(0)),
            Some(SourcePosition::new(1, 0))
        );
        assert_eq!(
            index.position(TextSize::from(5)),
            Some(SourcePosition::new(1, 5))
        );
        assert_eq!(
            index.position(TextSize::from(11)),
            Some(SourcePosition::new(1, 11))
        );
        assert_eq!(index.position(TextSize::from(12)), None);
    }

    #[test]
    fn test_multiple_lines() {
        let index = LineIndex::new("hello\nworld\nfoo");
        assert_eq!(index.line_count(), 3);

        assert_eq!(
            index.position(TextSize::from(5)),
            Some(SourcePosition::new(1, 5))
        );
        assert_eq!(
            index.position(TextSize::from(6)),
            Some(SourcePosition::new(2, 0))
        );
        assert_eq!(
            index.position(TextSize::from(10)),
            Some(SourcePosition::new(2, 4))
        );
        assert_eq!(
            index.position(TextSize::from(12)),
            Some(SourcePosition::new(3, 0))
        );
    }

    #[test]
    fn test_position_inside_function_body() {
        let code = "function something() {\n    const something = true;\n    return something;\n}";
        let index = LineIndex::new(code);
        assert_eq!(
            index.position(TextSize::from(30)),
            Some(SourcePosition::new(2, 7))
        );
    }

    #[test]
    fn test_offset_clamps_column_to_line() {
        let index = LineIndex::new("ab\ncdef\n");
        assert_eq!(index.offset(SourcePosition::new(1, 99)), TextSize::from(2));
        assert_eq!(index.offset(SourcePosition::new(2, 3)), TextSize::from(6));
        assert_eq!(index.offset(SourcePosition::new(3, 0)), TextSize::from(8));
        assert_eq!(index.offset(SourcePosition::new(40, 2)), TextSize::from(8));
    }

    #[test]
    fn test_utf16_columns() {
        // 'é' is one UTF-16 unit, '😀' is two.
        let index = LineIndex::new("é😀x\ny");
        assert_eq!(index.len(), TextSize::from(6));
        assert_eq!(
            index.position(TextSize::from(3)),
            Some(SourcePosition::new(1, 3))
        );
        assert_eq!(
            index.position(TextSize::from(5)),
            Some(SourcePosition::new(2, 0))
        );
        assert_eq!(utf16_len("é😀x"), 4);
    }

    #[test]
    fn test_line_start_and_end() {
        let index = LineIndex::new("hello\nworld\n");
        assert_eq!(index.line_start(1), Some(TextSize::from(0)));
        assert_eq!(index.line_start(2), Some(TextSize::from(6)));
        assert_eq!(index.line_start(3), Some(TextSize::from(12)));
        assert_eq!(index.line_start(0), None);
        assert_eq!(index.line_end(1), Some(TextSize::from(5)));
        assert_eq!(index.line_end(3), Some(TextSize::from(12)));
        assert_eq!(index.line_end(4), None);
    }

    proptest! {
        #[test]
        fn prop_offset_roundtrip(text in "[a-z \n\té😀]{0,64}", seed in any::<u32>()) {
            let index = LineIndex::new(&text);
            let len = u32::from(index.len());
            let offset = TextSize::from(seed % (len + 1));

            // Offsets inside a surrogate pair have no position of their own.
            let prefix: String = text
                .chars()
                .scan(0u32, |acc, c| {
                    let start = *acc;
                    *acc += c.len_utf16() as u32;
                    Some((start, c))
                })
                .take_while(|(start, _)| *start < u32::from(offset))
                .map(|(_, c)| c)
                .collect();
            prop_assume!(utf16_len(&prefix) == u32::from(offset));

            let position = index.position(offset).unwrap();
            prop_assert_eq!(index.offset(position), offset);
        }
    }
}
