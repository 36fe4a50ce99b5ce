//! Two-phase scan for assertion statements.
//!
//! The first phase lexes comment and string spans; the second matches the
//! assertion pattern and rejects matches that start inside one of those spans.

use logos::Logos;
use regex::Regex;
use std::ops::Range;

/// Lexical regions that cannot contain a rewritable statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Logos)]
enum Region {
    #[regex(r"//[^\n]*", allow_greedy = true)]
    LineComment,

    #[regex(r"/\*([^*]|\*+[^*/])*\*+/")]
    BlockComment,

    #[regex(r#""([^"\\\n]|\\[^\n]|\\\n)*""#)]
    DoubleQuoted,

    #[regex(r"'([^'\\\n]|\\[^\n]|\\\n)*'")]
    SingleQuoted,

    /// Template literal, substitutions included.
    #[regex(r"`([^`\\]|\\[^\n]|\\\n)*`")]
    Template,

    #[regex(r#"[^/"'`]+"#)]
    Code,

    #[token("/")]
    Slash,
}

impl Region {
    fn is_masked(self) -> bool {
        !matches!(self, Region::Code | Region::Slash)
    }
}

/// Returns the byte ranges of comments and string literals in `source`, in
/// source order.
pub fn masked_regions(source: &str) -> Vec<Range<usize>> {
    let mut lexer = Region::lexer(source);
    let mut regions = Vec::new();

    while let Some(token) = lexer.next() {
        // Unterminated literals lex as errors and are left unmasked.
        if let Ok(region) = token {
            if region.is_masked() {
                regions.push(lexer.span());
            }
        }
    }

    regions
}

/// An assertion statement found by [`StatementScanner::scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementMatch<'src> {
    /// Byte range of the statement, newline excluded.
    pub range: Range<usize>,
    /// Statement text.
    pub text: &'src str,
}

/// Finds single-line assertion statements outside comments and strings.
#[derive(Debug, Clone)]
pub struct StatementScanner {
    pattern: Regex,
}

impl StatementScanner {
    /// Builds a scanner for statements calling `callee`.
    pub fn new(callee: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(\b{}\([^\n]*?\);?)\r?\n", regex::escape(callee)))?;
        Ok(Self { pattern })
    }

    /// Returns every accepted statement in source order.
    ///
    /// A statement must end right before a newline; a match starting inside a
    /// comment or a string literal is rejected.
    pub fn scan<'src>(&self, source: &'src str) -> Vec<StatementMatch<'src>> {
        let masked = masked_regions(source);

        self.pattern
            .captures_iter(source)
            .filter_map(|captures| captures.get(1))
            .filter(|statement| {
                let start = statement.start();
                let inside = masked
                    .binary_search_by(|region| {
                        if region.end <= start {
                            std::cmp::Ordering::Less
                        } else if region.start > start {
                            std::cmp::Ordering::Greater
                        } else {
                            std::cmp::Ordering::Equal
                        }
                    })
                    .is_ok();
                if inside {
                    tracing::debug!(offset = start, "skipping assertion inside comment or string");
                }
                !inside
            })
            .map(|statement| StatementMatch {
                range: statement.range(),
                text: statement.as_str(),
            })
            .collect()
    }
}
