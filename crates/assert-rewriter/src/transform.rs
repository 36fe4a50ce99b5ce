//! File-level assertion rewriting.

use crate::descriptor::{AssertionDescriptor, StatementSource, Temporaries};
use crate::error::{RewriteError, StatementError};
use crate::expr::parse_assertion;
use crate::scan::StatementScanner;
use source_map::{
    utf16_len, DecodedSourceMap, LineIndex, SourceMap, SourceMapError, SourcePosition, TextEdits,
};
use text_size::TextSize;

/// Callee rewritten when no other is configured.
pub const DEFAULT_CALLEE: &str = "t.assert";

/// Options for [`Rewriter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteOptions {
    /// Assertion entry point, e.g. `t.assert`.
    pub callee: String,
}

impl Default for RewriteOptions {
    fn default() -> Self {
        Self {
            callee: DEFAULT_CALLEE.to_string(),
        }
    }
}

/// Output of a successful rewrite.
#[derive(Debug, Clone)]
pub struct TransformOutput {
    /// The rewritten code.
    pub code: String,
    /// Map from rewritten offsets back to original offsets.
    pub source_map: SourceMap,
    /// Number of statements that were rewritten.
    pub rewritten: usize,
}

impl TransformOutput {
    /// Renders the position map as a revision 3 source map naming `file` as
    /// the single original source.
    pub fn decoded_map(&self, original: &str, file: &str) -> DecodedSourceMap {
        self.source_map.to_decoded(&self.code, original, file)
    }

    /// Returns the rewritten code with its source map appended inline.
    pub fn code_with_inline_map(&self, original: &str, file: &str) -> Result<String, SourceMapError> {
        let comment = self.decoded_map(original, file).to_inline_comment()?;
        let mut code = self.code.clone();
        if !code.ends_with('\n') {
            code.push('\n');
        }
        code.push_str(&comment);
        code.push('\n');
        Ok(code)
    }
}

/// Rewrites assertion statements of one configured callee.
#[derive(Debug, Clone)]
pub struct Rewriter {
    options: RewriteOptions,
    scanner: StatementScanner,
}

impl Rewriter {
    /// Creates a rewriter, compiling the statement pattern for the callee.
    pub fn new(options: RewriteOptions) -> Result<Self, RewriteError> {
        if options.callee.trim().is_empty() {
            return Err(RewriteError::EmptyCallee);
        }
        let scanner =
            StatementScanner::new(&options.callee).map_err(|source| RewriteError::InvalidCallee {
                callee: options.callee.clone(),
                source,
            })?;
        Ok(Self { options, scanner })
    }

    /// Returns the options this rewriter was built with.
    pub fn options(&self) -> &RewriteOptions {
        &self.options
    }

    /// Rewrites every accepted assertion statement in `source`.
    ///
    /// Returns `Ok(None)` when nothing was rewritten, so callers can keep the
    /// original text and skip building a map.
    pub fn transform(&self, source: &str, file: &str) -> Result<Option<TransformOutput>, RewriteError> {
        if u32::try_from(source.len()).is_err() {
            return Err(RewriteError::SourceTooLarge(source.len()));
        }

        let matches = self.scanner.scan(source);
        if matches.is_empty() {
            return Ok(None);
        }

        let line_index = LineIndex::new(source);
        let mut edits = TextEdits::new();
        let mut index = 0;

        for statement in matches {
            let offset = TextSize::from(utf16_len(&source[..statement.range.start]));
            let position = line_index.position(offset).unwrap_or_default();

            let descriptor = match describe(statement.text, file, position) {
                Ok(descriptor) => descriptor,
                Err(err) => {
                    tracing::warn!(
                        file,
                        line = position.line,
                        column = position.column,
                        "leaving assertion unchanged: {err}"
                    );
                    continue;
                }
            };

            index += 1;
            let replacement = self.replacement(&descriptor, Temporaries::new(index));
            tracing::debug!(file, index, line = position.line, "rewriting assertion");
            edits.replace(statement.range, replacement);
        }

        if edits.is_empty() {
            return Ok(None);
        }

        let (code, source_map) = edits.apply(source);
        Ok(Some(TransformOutput {
            code,
            source_map,
            rewritten: index,
        }))
    }

    /// Builds the replacement text for one statement.
    ///
    /// Each operand is evaluated once, in its original order, into a
    /// temporary before the entry point is called with the descriptor.
    pub fn replacement(&self, descriptor: &AssertionDescriptor, temporaries: Temporaries) -> String {
        let mut code = format!("const {} = {};", temporaries.left(), descriptor.left.code);
        if let Some(right) = descriptor.right() {
            code.push_str(&format!("\nconst {} = {};", temporaries.right(), right.code));
        }

        code.push_str(&format!(
            "\n{}({}",
            self.options.callee,
            descriptor.to_literal(&temporaries)
        ));
        if let Some(message) = &descriptor.message {
            code.push_str(", ");
            code.push_str(message);
        }
        code.push_str(");");
        code
    }
}

/// Builds the descriptor for one assertion statement.
pub fn describe(
    statement: &str,
    file: &str,
    position: SourcePosition,
) -> Result<AssertionDescriptor, StatementError> {
    let parsed = parse_assertion(statement)?;
    Ok(AssertionDescriptor {
        source: StatementSource {
            code: statement.to_string(),
            file: file.to_string(),
            position,
        },
        left: parsed.left,
        comparison: parsed.comparison,
        message: parsed.message,
    })
}

/// Rewrites `t.assert` statements in `source` with default options.
pub fn transform(source: &str, file: &str) -> Result<Option<TransformOutput>, RewriteError> {
    Rewriter::new(RewriteOptions::default())?.transform(source, file)
}
