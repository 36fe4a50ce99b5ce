//! Configuration loading.

use crate::cli::{CoverageArgs, RewriteArgs};
use assert_rewriter::RewriteOptions;
use camino::{Utf8Path, Utf8PathBuf};
use coverage_remap::CoverageOptions;
use serde::Deserialize;
use std::fs;
use thiserror::Error;

/// File name looked up in the working directory.
pub const CONFIG_FILE: &str = "luna.config.json";

/// An error raised while loading the configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    /// The file is not valid configuration JSON.
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },
}

/// Settings read from `luna.config.json`.
///
/// Command-line flags take precedence over every field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LunaConfig {
    /// Substring of source paths dropped from coverage.
    pub ignore: Option<String>,
    /// Path fragments marking dependency sources.
    pub dependency_dirs: Option<Vec<String>>,
    /// Directory relative source paths are resolved against.
    pub root: Option<Utf8PathBuf>,
    /// Assertion callee to rewrite.
    pub callee: Option<String>,
}

impl LunaConfig {
    /// Loads `explicit` if given, otherwise `luna.config.json` in `cwd` when
    /// present, otherwise the defaults.
    pub fn load(explicit: Option<&Utf8Path>, cwd: &Utf8Path) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Self::read(path),
            None => {
                let path = cwd.join(CONFIG_FILE);
                if path.exists() {
                    Self::read(&path)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Utf8Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_owned(),
            source,
        })?;
        tracing::debug!(%path, "loaded configuration");
        Ok(config)
    }

    /// Rewrite options for a `rewrite` invocation.
    pub fn rewrite_options(&self, args: &RewriteArgs) -> RewriteOptions {
        let callee = args.callee.clone().or_else(|| self.callee.clone());
        match callee {
            Some(callee) => RewriteOptions { callee },
            None => RewriteOptions::default(),
        }
    }

    /// Coverage options for a `coverage` invocation.
    pub fn coverage_options(&self, args: &CoverageArgs) -> CoverageOptions {
        let defaults = CoverageOptions::default();
        CoverageOptions {
            ignore: args.ignore.clone().or_else(|| self.ignore.clone()),
            dependency_dirs: self
                .dependency_dirs
                .clone()
                .unwrap_or(defaults.dependency_dirs),
            root: args.root.clone().or_else(|| self.root.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ReportFormat;
    use pretty_assertions::assert_eq;

    fn coverage_args(ignore: Option<&str>) -> CoverageArgs {
        CoverageArgs {
            coverage: Utf8PathBuf::from("coverage.json"),
            ignore: ignore.map(str::to_string),
            root: None,
            format: ReportFormat::Json,
        }
    }

    #[test]
    fn test_missing_default_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = Utf8Path::from_path(dir.path()).unwrap();
        assert_eq!(LunaConfig::load(None, cwd).unwrap(), LunaConfig::default());
    }

    #[test]
    fn test_loads_config_from_working_directory() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = Utf8Path::from_path(dir.path()).unwrap();
        fs::write(
            cwd.join(CONFIG_FILE),
            r#"{"ignore": "test/", "dependencyDirs": ["/vendor/"], "callee": "t.check"}"#,
        )
        .unwrap();

        let config = LunaConfig::load(None, cwd).unwrap();
        assert_eq!(config.ignore.as_deref(), Some("test/"));
        assert_eq!(config.callee.as_deref(), Some("t.check"));

        let options = config.coverage_options(&coverage_args(None));
        assert_eq!(options.ignore.as_deref(), Some("test/"));
        assert_eq!(options.dependency_dirs, vec!["/vendor/".to_string()]);
    }

    #[test]
    fn test_flags_override_config() {
        let config = LunaConfig {
            ignore: Some("test/".to_string()),
            ..Default::default()
        };
        let options = config.coverage_options(&coverage_args(Some("fixtures/")));
        assert_eq!(options.ignore.as_deref(), Some("fixtures/"));
        assert_eq!(options.dependency_dirs, vec!["/node_modules/".to_string()]);
    }

    #[test]
    fn test_explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = Utf8Path::from_path(dir.path()).unwrap();
        let missing = cwd.join("nope.json");
        assert!(matches!(
            LunaConfig::load(Some(&missing), cwd),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let cwd = Utf8Path::from_path(dir.path()).unwrap();
        fs::write(cwd.join(CONFIG_FILE), "{ not json").unwrap();
        assert!(matches!(
            LunaConfig::load(None, cwd),
            Err(ConfigError::Parse { .. })
        ));
    }
}
