//! Human-readable output.

use crate::commands::RewriteSummary;
use coverage_remap::{CoverageMap, StatementSummary};

fn plural(count: usize, word: &str) -> String {
    if count == 1 {
        format!("{count} {word}")
    } else {
        format!("{count} {word}s")
    }
}

/// Formats the line printed after a `rewrite` run.
pub fn format_rewrite_summary(summary: &RewriteSummary) -> String {
    format!(
        "luna-instrument rewrote {} in {} ({} scanned)",
        plural(summary.assertions, "assertion"),
        plural(summary.rewritten_files, "file"),
        summary.files
    )
}

/// Formats a statement coverage table with one row per file and a total.
pub fn format_summary(report: &CoverageMap) -> String {
    let width = report
        .keys()
        .map(|path| path.len())
        .chain(std::iter::once("All files".len()))
        .max()
        .unwrap_or_default();

    let mut out = format!("{:<width$}  {:>9}  {:>7}\n", "File", "Stmts", "% Stmts");
    let mut total = StatementSummary::default();

    for (path, file) in report {
        let summary = file.summary();
        total.total += summary.total;
        total.covered += summary.covered;
        out.push_str(&row(path, &summary, width));
    }
    out.push_str(&row("All files", &total, width));
    out
}

fn row(label: &str, summary: &StatementSummary, width: usize) -> String {
    format!(
        "{:<width$}  {:>9}  {:>7.2}\n",
        label,
        format!("{}/{}", summary.covered, summary.total),
        summary.percent()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use coverage_remap::FileCoverage;
    use pretty_assertions::assert_eq;

    fn file(path: &str, hits: &[u32]) -> FileCoverage {
        let mut file = FileCoverage::new(path);
        for (i, &hit) in hits.iter().enumerate() {
            file.s.insert(i.to_string(), hit);
        }
        file
    }

    #[test]
    fn test_rewrite_summary() {
        let summary = RewriteSummary {
            files: 3,
            rewritten_files: 1,
            assertions: 4,
        };
        assert_eq!(
            format_rewrite_summary(&summary),
            "luna-instrument rewrote 4 assertions in 1 file (3 scanned)"
        );
    }

    #[test]
    fn test_coverage_summary_table() {
        let mut report = CoverageMap::new();
        report.insert("/src/one.js".to_string(), file("/src/one.js", &[1, 1, 0, 0]));
        report.insert("/src/two.js".to_string(), file("/src/two.js", &[]));

        let expected = "\
File             Stmts  % Stmts
/src/one.js        2/4    50.00
/src/two.js        0/0   100.00
All files          2/4    50.00
";
        assert_eq!(format_summary(&report), expected);
    }
}
