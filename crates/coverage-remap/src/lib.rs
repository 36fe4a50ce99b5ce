//! Coverage attribution for bundled test scripts.
//!
//! Browser coverage is recorded against the generated script that was
//! actually executed. This crate maps those ranges back to the original
//! sources through the script's inline source map:
//! - [`resolve_source_map`] and [`attribute_ranges`] split every executed range
//!   into pieces owned by individual original sources
//! - [`to_runtime_shape`] and [`to_report`] turn the pieces into runtime
//!   coverage and per-file reports
//! - [`apply_source_map_to_trace`] rewrites stack trace locations with the same
//!   map

mod attribute;
mod convert;
mod error;
mod options;
mod report;
mod trace;

pub use attribute::{attribute_ranges, resolve_source_map, PerSourceCoverage, RawScriptCoverage};
pub use convert::{
    puppeteer_to_istanbul, to_report, to_runtime_shape, CoverageRange, FunctionCoverage,
    ScriptCoverage,
};
pub use error::CoverageError;
pub use options::{CoverageOptions, DEFAULT_DEPENDENCY_DIR};
pub use report::{
    CoverageMap, FileCoverage, LineReportGenerator, Location, ReportGenerator, StatementSummary,
};
pub use trace::{apply_source_map_to_trace, remap_trace};
