//! Stack trace remapping through a script's source map.

use crate::attribute::RawScriptCoverage;
use crate::error::CoverageError;
use source_map::{Bias, DecodedSourceMap, LookupSession, OriginalPositionLookup, SourcePosition};
use std::borrow::Cow;

/// Rewrites `(path:line:column)` suffixes of `trace` to original positions,
/// using the inline source map of the first captured script.
///
/// Without captured coverage the trace is returned unchanged.
pub fn apply_source_map_to_trace(
    trace: &str,
    coverage: &[RawScriptCoverage],
) -> Result<String, CoverageError> {
    let Some(script) = coverage.first() else {
        return Ok(trace.to_string());
    };

    let map = DecodedSourceMap::from_inline(&script.text)?;
    let session = map.session();
    Ok(remap_trace(trace, &session))
}

/// Rewrites each line of `trace` whose final parenthesized group is a
/// resolvable `path:line:column` reference.
pub fn remap_trace(trace: &str, session: &LookupSession<'_>) -> String {
    trace
        .split('\n')
        .map(|line| remap_line(line, session))
        .collect::<Vec<_>>()
        .join("\n")
}

fn remap_line<'a>(line: &'a str, session: &LookupSession<'_>) -> Cow<'a, str> {
    let Some(body) = line.strip_suffix(')') else {
        return Cow::Borrowed(line);
    };
    let Some(open) = body.rfind('(') else {
        return Cow::Borrowed(line);
    };

    let mut parts = body[open + 1..].rsplitn(3, ':');
    let (Some(column), Some(line_number), Some(_path)) = (parts.next(), parts.next(), parts.next())
    else {
        return Cow::Borrowed(line);
    };
    let (Ok(line_number), Ok(column)) = (line_number.parse::<u32>(), column.parse::<u32>()) else {
        return Cow::Borrowed(line);
    };

    let resolved = session
        .original_position_for(SourcePosition::new(line_number, column), Bias::LeastUpperBound)
        .and_then(|position| Some((session.source(position.source)?, position)));
    match resolved {
        Some((source, position)) => Cow::Owned(format!(
            "{}({}:{}:{})",
            &line[..open],
            source,
            position.line,
            position.column
        )),
        None => {
            tracing::debug!(line, "no original position for trace line");
            Cow::Borrowed(line)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use source_map::{Token, TokenOrigin};

    fn map() -> DecodedSourceMap {
        let token = |line, column, source, original_line, original_column| Token {
            generated: SourcePosition::new(line, column),
            original: Some(TokenOrigin {
                source,
                line: original_line,
                column: original_column,
                name: None,
            }),
        };
        DecodedSourceMap::new(
            vec!["src/a.js".into(), "src/b.js".into()],
            vec!["a\n".into(), "b\n".into()],
            vec![token(3, 4, 0, 10, 2), token(7, 0, 1, 1, 0)],
        )
    }

    #[test]
    fn test_trailing_group_is_rewritten() {
        let map = map();
        let trace = "Error: nope\n    at check (http://localhost/bundle.js:3:1)\n    at http://localhost/bundle.js:3:1";
        assert_eq!(
            remap_trace(trace, &map.session()),
            "Error: nope\n    at check (src/a.js:10:2)\n    at http://localhost/bundle.js:3:1"
        );
    }

    #[test]
    fn test_only_the_last_group_is_touched() {
        let map = map();
        let trace = "    at Object.<anonymous> (eval) (bundle.js:7:0)";
        assert_eq!(
            remap_trace(trace, &map.session()),
            "    at Object.<anonymous> (eval) (src/b.js:1:0)"
        );
    }

    #[test]
    fn test_short_or_unresolved_groups_are_unchanged() {
        let map = map();
        for line in [
            "    at run (bundle.js:3)",
            "    at run (native)",
            "    at run (bundle.js:x:y)",
            "    at run (bundle.js:5:0)",
        ] {
            assert_eq!(remap_trace(line, &map.session()), line);
        }
    }

    #[test]
    fn test_empty_coverage_returns_trace() {
        let trace = "    at run (bundle.js:3:1)";
        assert_eq!(apply_source_map_to_trace(trace, &[]).unwrap(), trace);
    }
}
