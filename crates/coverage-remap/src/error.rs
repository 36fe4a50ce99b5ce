//! Error types for coverage resolution.

use source_map::SourceMapError;
use thiserror::Error;

/// An error that aborts a coverage resolution or trace remapping pass.
#[derive(Debug, Error)]
pub enum CoverageError {
    /// The script's inline source map is missing or malformed.
    #[error("failed to read the script source map: {0}")]
    SourceMap(#[from] SourceMapError),

    /// A lookup resolved to a source the map does not list.
    #[error("lookup resolved to unknown source index {0}")]
    UnknownSource(usize),

    /// The report generator failed for one file.
    #[error("failed to build coverage report for `{path}`: {message}")]
    Report {
        /// Path of the file being reported.
        path: String,
        /// What went wrong.
        message: String,
    },
}
