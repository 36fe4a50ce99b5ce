//! Ordered text edits applied against an immutable original buffer.

use crate::builder::{SourceMap, SourceMapBuilder};
use crate::line_index::utf16_len;
use crate::Span;
use std::ops::Range;
use text_size::TextSize;

/// Replacement of a byte range of the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
    /// Byte range in the original text.
    pub range: Range<usize>,
    /// Text that replaces the range.
    pub replacement: String,
}

/// A list of non-overlapping edits against one original text.
///
/// The position map of the edited text is derived from the edit list when
/// the edits are applied; the original text is never mutated.
#[derive(Debug, Clone, Default)]
pub struct TextEdits {
    edits: Vec<TextEdit>,
}

impl TextEdits {
    /// Creates an empty edit list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a replacement of `range` (byte offsets) with `replacement`.
    pub fn replace(&mut self, range: Range<usize>, replacement: impl Into<String>) {
        self.edits.push(TextEdit {
            range,
            replacement: replacement.into(),
        });
    }

    /// Returns the number of recorded edits.
    #[inline]
    pub fn len(&self) -> usize {
        self.edits.len()
    }

    /// Returns true if no edit was recorded.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.edits.is_empty()
    }

    /// Returns the recorded edits in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &TextEdit> {
        self.edits.iter()
    }

    /// Applies the edits to `original`, returning the edited text and a map
    /// from edited offsets back to original offsets.
    ///
    /// Edits must not overlap and must fall on character boundaries.
    pub fn apply(&self, original: &str) -> (String, SourceMap) {
        let mut edits: Vec<&TextEdit> = self.edits.iter().collect();
        edits.sort_by_key(|edit| edit.range.start);

        let mut output = String::with_capacity(original.len());
        let mut builder = SourceMapBuilder::new();
        let mut cursor = 0usize;
        let mut original_offset = TextSize::from(0);

        for edit in edits {
            debug_assert!(edit.range.start >= cursor, "overlapping text edits");

            let unchanged = &original[cursor..edit.range.start];
            builder.add_source(original_offset, unchanged);
            output.push_str(unchanged);
            original_offset += TextSize::from(utf16_len(unchanged));

            let replaced_len = utf16_len(&original[edit.range.clone()]);
            let replaced = Span::new(original_offset, original_offset + TextSize::from(replaced_len));
            builder.add_transformed(replaced, &edit.replacement);
            output.push_str(&edit.replacement);
            original_offset = replaced.end;

            cursor = edit.range.end;
        }

        let rest = &original[cursor..];
        builder.add_source(original_offset, rest);
        output.push_str(rest);

        (output, builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_apply_without_edits_is_identity() {
        let (text, map) = TextEdits::new().apply("abc\ndef");
        assert_eq!(text, "abc\ndef");
        assert_eq!(map.len(), 1);
        assert_eq!(
            map.original_position(TextSize::from(5)),
            Some(TextSize::from(5))
        );
    }

    #[test]
    fn test_apply_tracks_offsets_after_growth() {
        let original = "x = 1;\nassert(x);\ny = 2;\n";
        let mut edits = TextEdits::new();
        edits.replace(7..17, "const a = x;\nassert(a);");

        let (text, map) = edits.apply(original);
        assert_eq!(text, "x = 1;\nconst a = x;\nassert(a);\ny = 2;\n");

        // Before the edit: identity.
        assert_eq!(
            map.original_position(TextSize::from(2)),
            Some(TextSize::from(2))
        );
        // Inside the replacement: start of the replaced statement.
        assert_eq!(
            map.original_position(TextSize::from(20)),
            Some(TextSize::from(7))
        );
        // After the edit: shifted back by the growth.
        let y = text.find("y = 2").unwrap() as u32;
        assert_eq!(
            map.original_position(TextSize::from(y)),
            Some(TextSize::from(18))
        );
    }

    #[test]
    fn test_apply_sorts_edits() {
        let mut edits = TextEdits::new();
        edits.replace(4..5, "B");
        edits.replace(0..1, "A");
        let (text, _) = edits.apply("a + b");
        assert_eq!(text, "A + B");
        assert_eq!(edits.len(), 2);
    }
}
