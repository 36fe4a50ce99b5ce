//! Coverage resolution options.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

/// Path fragment marking third-party dependency sources.
pub const DEFAULT_DEPENDENCY_DIR: &str = "/node_modules/";

/// Options controlling which sources survive attribution and how report
/// paths are resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CoverageOptions {
    /// Sources whose path contains this substring are dropped.
    pub ignore: Option<String>,
    /// Sources whose path contains any of these fragments are dropped.
    pub dependency_dirs: Vec<String>,
    /// Directory that relative source paths are resolved against in reports.
    pub root: Option<Utf8PathBuf>,
}

impl Default for CoverageOptions {
    fn default() -> Self {
        Self {
            ignore: None,
            dependency_dirs: vec![DEFAULT_DEPENDENCY_DIR.to_string()],
            root: None,
        }
    }
}

impl CoverageOptions {
    /// Returns true if a source with this path is removed after attribution.
    ///
    /// An empty ignore pattern matches nothing.
    pub fn is_excluded(&self, path: &str) -> bool {
        let ignored = self
            .ignore
            .as_deref()
            .is_some_and(|ignore| !ignore.is_empty() && path.contains(ignore));

        ignored
            || self
                .dependency_dirs
                .iter()
                .any(|dir| !dir.is_empty() && path.contains(dir.as_str()))
    }
}
