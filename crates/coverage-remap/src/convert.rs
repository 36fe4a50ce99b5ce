//! Conversion of attributed coverage into runtime and report shapes.

use crate::attribute::{resolve_source_map, PerSourceCoverage, RawScriptCoverage};
use crate::error::CoverageError;
use crate::options::CoverageOptions;
use crate::report::{CoverageMap, ReportGenerator};
use serde::{Deserialize, Serialize};

/// An executed range in runtime coverage form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoverageRange {
    pub start_offset: u32,
    pub end_offset: u32,
    /// Always 1: ranges record presence, not hit counts.
    pub count: u32,
}

/// A block of ranges reported as one function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCoverage {
    pub ranges: Vec<CoverageRange>,
    pub is_block_coverage: bool,
}

/// Runtime coverage of one original source.
///
/// Only `scriptId`, `url` and `functions` are serialized; the path and text
/// travel alongside for the report generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScriptCoverage {
    pub script_id: u32,
    /// `file://` URL of the source.
    pub url: String,
    pub functions: Vec<FunctionCoverage>,
    #[serde(skip)]
    pub path: String,
    #[serde(skip)]
    pub text: String,
}

/// Wraps each source's ranges as a single block-coverage function with a
/// sequential script id.
pub fn to_runtime_shape(coverage: Vec<PerSourceCoverage>) -> Vec<ScriptCoverage> {
    coverage
        .into_iter()
        .zip(0u32..)
        .map(|(source, script_id)| ScriptCoverage {
            script_id,
            url: format!("file://{}", source.url),
            functions: vec![FunctionCoverage {
                ranges: source
                    .ranges
                    .iter()
                    .map(|range| CoverageRange {
                        start_offset: range.start.into(),
                        end_offset: range.end.into(),
                        count: 1,
                    })
                    .collect(),
                is_block_coverage: true,
            }],
            path: source.url,
            text: source.text,
        })
        .collect()
}

/// Runs the report generator for every script and merges the per-file
/// results into one map, in order of first encounter.
pub fn to_report<G>(scripts: &[ScriptCoverage], generator: &G) -> Result<CoverageMap, CoverageError>
where
    G: ReportGenerator + ?Sized,
{
    let mut report = CoverageMap::new();
    for script in scripts {
        let file_report = generator.generate(&script.path, &script.text, &script.functions)?;
        report.extend(file_report);
    }
    Ok(report)
}

/// Resolves captured browser coverage into a per-file report.
///
/// Only the first captured script is used; coverage is expected to come
/// from one bundled script. Empty input yields an empty report.
pub fn puppeteer_to_istanbul<G>(
    coverage: &[RawScriptCoverage],
    options: &CoverageOptions,
    generator: &G,
) -> Result<CoverageMap, CoverageError>
where
    G: ReportGenerator + ?Sized,
{
    let Some(script) = coverage.first() else {
        return Ok(CoverageMap::new());
    };
    if coverage.len() > 1 {
        // TODO: resolve every captured script and merge their reports.
        tracing::warn!(
            ignored = coverage.len() - 1,
            "only the first captured script is resolved"
        );
    }

    let resolved = resolve_source_map(script, options)?;
    tracing::debug!(url = %script.url, sources = resolved.len(), "resolved script coverage");
    to_report(&to_runtime_shape(resolved), generator)
}
