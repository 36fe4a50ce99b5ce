//! Source map builder for tracking position mappings during transformation.

use crate::decoded::{DecodedSourceMap, Token, TokenOrigin};
use crate::line_index::{utf16_len, LineIndex};
use crate::{CharOffset, Span};
use text_size::TextSize;

/// A single mapping from generated position to original position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Mapping {
    /// The span in the generated output.
    pub generated: Span,
    /// The span in the original source.
    pub original: Span,
    /// Whether the generated text is a copy of the original text.
    pub verbatim: bool,
}

/// A source map that tracks position mappings from generated code back to original source.
#[derive(Debug, Clone, Default)]
pub struct SourceMap {
    /// List of mappings, sorted by generated position.
    mappings: Vec<Mapping>,
}

impl SourceMap {
    /// Returns the number of mappings in this source map.
    #[inline]
    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    /// Returns true if this source map has no mappings.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    /// Finds the original position corresponding to a generated position.
    ///
    /// Positions inside replaced text resolve to the start of the text they
    /// replaced. Returns `None` if no mapping covers the given position.
    pub fn original_position(&self, generated: CharOffset) -> Option<CharOffset> {
        let mapping = self.find_mapping_for_generated(generated)?;
        if !mapping.verbatim {
            return Some(mapping.original.start);
        }

        let offset_in_span = u32::from(generated) - u32::from(mapping.generated.start);
        Some(mapping.original.start + TextSize::from(offset_in_span))
    }

    /// Finds the mapping that contains the given generated position.
    fn find_mapping_for_generated(&self, generated: CharOffset) -> Option<&Mapping> {
        let idx = match self
            .mappings
            .binary_search_by(|m| m.generated.start.cmp(&generated))
        {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };

        self.mappings
            .get(idx)
            .filter(|m| m.generated.contains(generated))
    }

    /// Renders this map as a revision 3 source map for a single original file.
    ///
    /// Verbatim text gets one segment per character; replaced text maps each
    /// of its generated lines to the start of the original text it replaced.
    pub fn to_decoded(&self, generated: &str, original: &str, source: &str) -> DecodedSourceMap {
        let generated_index = LineIndex::new(generated);
        let original_index = LineIndex::new(original);
        let mut tokens = Vec::new();

        for mapping in &self.mappings {
            let start = u32::from(mapping.generated.start);
            let end = u32::from(mapping.generated.end);
            let verbatim = mapping.verbatim;

            for offset in start..end {
                let Some(position) = generated_index.position(TextSize::from(offset)) else {
                    break;
                };
                if !verbatim && offset != start && position.column != 0 {
                    continue;
                }

                let original_offset = if verbatim {
                    mapping.original.start + TextSize::from(offset - start)
                } else {
                    mapping.original.start
                };
                let Some(original_position) = original_index.position(original_offset) else {
                    continue;
                };

                tokens.push(Token {
                    generated: position,
                    original: Some(TokenOrigin {
                        source: 0,
                        line: original_position.line,
                        column: original_position.column,
                        name: None,
                    }),
                });
            }
        }

        tokens.dedup_by_key(|token| token.generated);
        DecodedSourceMap::new(vec![source.to_string()], vec![original.to_string()], tokens)
    }
}

/// Collects mappings while an edited text is assembled front to back.
#[derive(Debug, Default)]
pub struct SourceMapBuilder {
    mappings: Vec<Mapping>,
    /// Current position in the generated output.
    generated_offset: CharOffset,
}

impl SourceMapBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, original: Span, generated_len: u32, verbatim: bool) {
        let generated_end = self.generated_offset + TextSize::from(generated_len);
        self.mappings.push(Mapping {
            generated: Span::new(self.generated_offset, generated_end),
            original,
            verbatim,
        });
        self.generated_offset = generated_end;
    }

    /// Adds text copied unchanged from `original_start`.
    pub fn add_source(&mut self, original_start: CharOffset, text: &str) {
        let len = utf16_len(text);
        if len == 0 {
            return;
        }
        let original = Span::new(original_start, original_start + TextSize::from(len));
        self.push(original, len, true);
    }

    /// Adds text that replaces the `original` span.
    pub fn add_transformed(&mut self, original: Span, generated_text: &str) {
        self.push(original, utf16_len(generated_text), false);
    }

    pub fn build(mut self) -> SourceMap {
        self.mappings.sort_by_key(|m| m.generated.start);
        SourceMap {
            mappings: self.mappings,
        }
    }
}
