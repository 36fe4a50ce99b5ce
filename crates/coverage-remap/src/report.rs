//! Per-file coverage reports.

use crate::convert::FunctionCoverage;
use crate::error::CoverageError;
use crate::options::CoverageOptions;
use camino::{Utf8Path, Utf8PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use source_map::{utf16_len, SourcePosition, Span};
use text_size::TextSize;

/// Coverage reports keyed by absolute file path.
pub type CoverageMap = IndexMap<String, FileCoverage>;

/// A start/end pair of positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub start: SourcePosition,
    pub end: SourcePosition,
}

/// Statement, function and branch coverage of one file.
///
/// Keys of the maps are stringified indices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCoverage {
    pub path: String,
    pub statement_map: IndexMap<String, Location>,
    pub s: IndexMap<String, u32>,
    pub fn_map: IndexMap<String, serde_json::Value>,
    pub f: IndexMap<String, u32>,
    pub branch_map: IndexMap<String, serde_json::Value>,
    pub b: IndexMap<String, Vec<u32>>,
}

impl FileCoverage {
    /// Creates an empty report for `path`.
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            statement_map: IndexMap::new(),
            s: IndexMap::new(),
            fn_map: IndexMap::new(),
            f: IndexMap::new(),
            branch_map: IndexMap::new(),
            b: IndexMap::new(),
        }
    }

    /// Returns statement totals for this file.
    pub fn summary(&self) -> StatementSummary {
        StatementSummary {
            total: self.s.len(),
            covered: self.s.values().filter(|&&hits| hits > 0).count(),
        }
    }
}

/// Covered and total statement counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct StatementSummary {
    pub total: usize,
    pub covered: usize,
}

impl StatementSummary {
    /// Percentage of covered statements; 100 for a file without statements.
    pub fn percent(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            self.covered as f64 * 100.0 / self.total as f64
        }
    }
}

/// Builds the report of one file from its executed ranges.
pub trait ReportGenerator {
    /// Returns a map with the report of `path`, keyed by its absolute path.
    fn generate(
        &self,
        path: &str,
        text: &str,
        functions: &[FunctionCoverage],
    ) -> Result<CoverageMap, CoverageError>;
}

/// Reports every non-blank line as one statement.
///
/// A statement is hit when any executed range overlaps its text.
#[derive(Debug, Clone, Default)]
pub struct LineReportGenerator {
    root: Option<Utf8PathBuf>,
}

impl LineReportGenerator {
    /// Creates a generator resolving relative paths against `root`.
    pub fn new(root: Option<Utf8PathBuf>) -> Self {
        Self { root }
    }

    /// Creates a generator from coverage options.
    pub fn from_options(options: &CoverageOptions) -> Self {
        Self::new(options.root.clone())
    }

    fn resolve_path(&self, path: &str) -> String {
        let path = path.strip_prefix("file://").unwrap_or(path);
        match &self.root {
            Some(root) if Utf8Path::new(path).is_relative() => root.join(path).into_string(),
            _ => path.to_string(),
        }
    }
}

impl ReportGenerator for LineReportGenerator {
    fn generate(
        &self,
        path: &str,
        text: &str,
        functions: &[FunctionCoverage],
    ) -> Result<CoverageMap, CoverageError> {
        let path = self.resolve_path(path);
        let executed: Vec<Span> = functions
            .iter()
            .flat_map(|function| &function.ranges)
            .filter(|range| range.count > 0)
            .map(|range| Span::new(range.start_offset, range.end_offset))
            .collect();

        let mut file = FileCoverage::new(path.clone());
        let mut line_start = 0u32;

        for (number, raw_line) in (1u32..).zip(text.split('\n')) {
            let line = raw_line.strip_suffix('\r').unwrap_or(raw_line);
            let content = line.trim_start();

            if !content.trim_end().is_empty() {
                let indent = utf16_len(&line[..line.len() - content.len()]);
                let width = indent + utf16_len(content.trim_end());
                let statement = Span::new(
                    TextSize::from(line_start + indent),
                    TextSize::from(line_start + width),
                );
                let hit = executed.iter().any(|range| range.overlaps(statement));

                let key = file.statement_map.len().to_string();
                file.statement_map.insert(
                    key.clone(),
                    Location {
                        start: SourcePosition::new(number, indent),
                        end: SourcePosition::new(number, width),
                    },
                );
                file.s.insert(key, u32::from(hit));
            }

            line_start += utf16_len(raw_line) + 1;
        }

        Ok(CoverageMap::from([(path, file)]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convert::CoverageRange;
    use pretty_assertions::assert_eq;

    fn functions(ranges: &[(u32, u32)]) -> Vec<FunctionCoverage> {
        vec![FunctionCoverage {
            ranges: ranges
                .iter()
                .map(|&(start_offset, end_offset)| CoverageRange {
                    start_offset,
                    end_offset,
                    count: 1,
                })
                .collect(),
            is_block_coverage: true,
        }]
    }

    #[test]
    fn test_lines_become_statements() {
        let text = "const a = 1;\n\n  if (a) {\n    run();\n  }\n";
        // Covers `const a = 1;` and `if (a) {`.
        let report = LineReportGenerator::default()
            .generate("/src/a.js", text, &functions(&[(0, 12), (16, 24)]))
            .unwrap();

        let file = &report["/src/a.js"];
        assert_eq!(file.statement_map.len(), 4);
        assert_eq!(
            file.statement_map["1"],
            Location {
                start: SourcePosition::new(3, 2),
                end: SourcePosition::new(3, 10),
            }
        );
        let hits: Vec<u32> = file.s.values().copied().collect();
        assert_eq!(hits, vec![1, 1, 0, 0]);
        assert_eq!(file.summary(), StatementSummary { total: 4, covered: 2 });
    }

    #[test]
    fn test_relative_paths_resolve_against_root() {
        let generator = LineReportGenerator::new(Some(Utf8PathBuf::from("/work")));
        let report = generator.generate("src/a.js", "a;\n", &functions(&[])).unwrap();
        assert!(report.contains_key("/work/src/a.js"));

        let report = generator.generate("/abs/a.js", "a;\n", &functions(&[])).unwrap();
        assert!(report.contains_key("/abs/a.js"));
    }

    #[test]
    fn test_report_serializes_istanbul_keys() {
        let report = LineReportGenerator::default()
            .generate("/a.js", "x;\n", &functions(&[(0, 2)]))
            .unwrap();
        let json = serde_json::to_value(&report["/a.js"]).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "path": "/a.js",
                "statementMap": {"0": {"start": {"line": 1, "column": 0}, "end": {"line": 1, "column": 2}}},
                "s": {"0": 1},
                "fnMap": {},
                "f": {},
                "branchMap": {},
                "b": {}
            })
        );
    }

    #[test]
    fn test_summary_percent() {
        assert_eq!(StatementSummary { total: 4, covered: 1 }.percent(), 25.0);
        assert_eq!(StatementSummary::default().percent(), 100.0);
    }
}
