//! Attribution of generated-script coverage ranges to original sources.

use crate::error::CoverageError;
use crate::options::CoverageOptions;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use source_map::{
    Bias, DecodedSourceMap, LineIndex, OriginalPosition, OriginalPositionLookup, SourcePosition,
    Span,
};

/// Coverage captured for one generated script, as reported by the browser
/// driver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawScriptCoverage {
    /// URL the script was loaded from.
    pub url: String,
    /// Full script text, inline source map included.
    pub text: String,
    /// Executed ranges in script coordinates.
    pub ranges: Vec<Span>,
}

/// Executed ranges of one original source, in that source's own offsets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSourceCoverage {
    /// Path of the original source.
    pub url: String,
    /// Ranges in the order they were attributed.
    pub ranges: Vec<Span>,
    /// Original source text.
    pub text: String,
}

/// Decodes the inline source map of `coverage` and attributes its ranges to
/// the original sources.
pub fn resolve_source_map(
    coverage: &RawScriptCoverage,
    options: &CoverageOptions,
) -> Result<Vec<PerSourceCoverage>, CoverageError> {
    let map = DecodedSourceMap::from_inline(&coverage.text)?;
    let session = map.session();
    attribute_ranges(&map, &session, &coverage.text, &coverage.ranges, options)
}

/// Attributes `ranges` of the generated `text` to the sources of `map`.
///
/// Both ends of a range are looked up with nearest-following bias. A range
/// whose ends fall in different sources is split into one piece per run of
/// lines that resolve to the same source. Ranges that resolve to nothing are
/// dropped. Excluded sources are removed only after every range has been
/// attributed; the remaining records keep the order of the map's `sources`.
pub fn attribute_ranges<L>(
    map: &DecodedSourceMap,
    lookup: &L,
    text: &str,
    ranges: &[Span],
    options: &CoverageOptions,
) -> Result<Vec<PerSourceCoverage>, CoverageError>
where
    L: OriginalPositionLookup + ?Sized,
{
    let generated = LineIndex::new(text);
    let mut records: IndexMap<usize, Record> = map
        .sources()
        .iter()
        .zip(map.sources_content())
        .enumerate()
        .map(|(index, (url, text))| (index, Record::new(url, text)))
        .collect();

    for range in ranges {
        let (Some(start), Some(end)) = (generated.position(range.start), generated.position(range.end))
        else {
            tracing::debug!(
                start = u32::from(range.start),
                end = u32::from(range.end),
                "dropping range outside the script"
            );
            continue;
        };

        for piece in split_range(lookup, start, end) {
            let record = records
                .get_mut(&piece.source)
                .ok_or(CoverageError::UnknownSource(piece.source))?;
            record.push(&piece);
        }
    }

    records.retain(|_, record| {
        let excluded = options.is_excluded(&record.coverage.url);
        if excluded {
            tracing::debug!(url = %record.coverage.url, "removing excluded source");
        }
        !excluded
    });

    Ok(records.into_values().map(|record| record.coverage).collect())
}

/// A contiguous part of a range within one original source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Piece {
    source: usize,
    start: SourcePosition,
    end: PieceEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PieceEnd {
    /// An exact original position.
    At(SourcePosition),
    /// The end of an original line.
    LineEnd(u32),
}

fn split_range<L>(lookup: &L, start: SourcePosition, end: SourcePosition) -> Vec<Piece>
where
    L: OriginalPositionLookup + ?Sized,
{
    let resolved_start = lookup.original_position_for(start, Bias::LeastUpperBound);
    let resolved_end = lookup.original_position_for(end, Bias::LeastUpperBound);

    match (resolved_start, resolved_end) {
        (None, None) => {
            tracing::debug!(?start, ?end, "dropping range without original source");
            Vec::new()
        }
        (Some(first), Some(last)) if first.source == last.source => vec![Piece {
            source: first.source,
            start: first.position(),
            end: PieceEnd::At(last.position()),
        }],
        _ => walk_lines(lookup, start, end, resolved_end),
    }
}

/// Splits a range that crosses sources by resolving the start of each
/// generated line it covers.
fn walk_lines<L>(
    lookup: &L,
    start: SourcePosition,
    end: SourcePosition,
    resolved_end: Option<OriginalPosition>,
) -> Vec<Piece>
where
    L: OriginalPositionLookup + ?Sized,
{
    // (source, first position, last observed position)
    let mut runs: Vec<(usize, SourcePosition, SourcePosition)> = Vec::new();

    for line in start.line..=end.line {
        let column = if line == start.line { start.column } else { 0 };
        if line == end.line && line != start.line && end.column == 0 {
            break;
        }

        let Some(found) = lookup.original_position_for(SourcePosition::new(line, column), Bias::LeastUpperBound)
        else {
            continue;
        };

        match runs.last_mut() {
            Some((source, _, last)) if *source == found.source => *last = found.position(),
            _ => runs.push((found.source, found.position(), found.position())),
        }
    }

    let count = runs.len();
    runs.into_iter()
        .enumerate()
        .map(|(i, (source, first, last))| {
            let end = match resolved_end {
                Some(resolved) if i + 1 == count && resolved.source == source => {
                    PieceEnd::At(resolved.position())
                }
                _ => PieceEnd::LineEnd(last.line),
            };
            Piece {
                source,
                start: first,
                end,
            }
        })
        .collect()
}

struct Record {
    coverage: PerSourceCoverage,
    index: LineIndex,
}

impl Record {
    fn new(url: &str, text: &str) -> Self {
        Self {
            coverage: PerSourceCoverage {
                url: url.to_string(),
                ranges: Vec::new(),
                text: text.to_string(),
            },
            index: LineIndex::new(text),
        }
    }

    fn push(&mut self, piece: &Piece) {
        let start = self.index.offset(piece.start);
        let end = match piece.end {
            PieceEnd::At(position) => self.index.offset(position),
            PieceEnd::LineEnd(line) => self.index.line_end(line).unwrap_or(self.index.len()),
        };
        self.coverage.ranges.push(Span::new(start, end.max(start)));
    }
}
