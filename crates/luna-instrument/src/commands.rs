//! Subcommand execution.

use crate::cli::{Command, CoverageArgs, RemapTraceArgs, ReportFormat, RewriteArgs};
use crate::config::{ConfigError, LunaConfig};
use crate::output;
use assert_rewriter::{RewriteError, Rewriter};
use camino::{Utf8Path, Utf8PathBuf};
use coverage_remap::{
    apply_source_map_to_trace, puppeteer_to_istanbul, resolve_source_map, to_runtime_shape,
    CoverageError, LineReportGenerator, RawScriptCoverage,
};
use globset::{Glob, GlobSet, GlobSetBuilder};
use rayon::prelude::*;
use source_map::SourceMapError;
use std::collections::HashMap;
use std::fs;
use std::io::Read;
use thiserror::Error;
use walkdir::WalkDir;

/// File extensions picked up when walking a directory.
const SCRIPT_EXTENSIONS: &[&str] = &["js", "mjs", "cjs", "jsx", "ts", "mts", "cts", "tsx"];

/// Directories never walked into.
const DEFAULT_IGNORES: &[&str] = &["**/node_modules/**", "**/.git/**"];

/// Errors that abort a subcommand.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("invalid glob pattern: {0}")]
    InvalidGlob(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write {
        path: Utf8PathBuf,
        source: std::io::Error,
    },

    #[error("{first} and {second} would both be written to {relative}")]
    OutputCollision {
        relative: Utf8PathBuf,
        first: Utf8PathBuf,
        second: Utf8PathBuf,
    },

    #[error("failed to parse captured coverage {path}: {source}")]
    CoverageJson {
        path: Utf8PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to build the source map of {path}: {source}")]
    SourceMap {
        path: Utf8PathBuf,
        source: SourceMapError,
    },

    #[error(transparent)]
    Rewrite(#[from] RewriteError),

    #[error(transparent)]
    Coverage(#[from] CoverageError),

    #[error("failed to serialize output: {0}")]
    Output(#[from] serde_json::Error),
}

/// Totals of a `rewrite` run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub files: usize,
    pub rewritten_files: usize,
    pub assertions: usize,
}

/// Runs `command` and returns the text to print on stdout.
pub fn run(command: &Command, config: &LunaConfig) -> Result<String, CommandError> {
    match command {
        Command::Rewrite(args) => {
            let (summary, stdout) = rewrite(args, config)?;
            eprintln!("{}", output::format_rewrite_summary(&summary));
            Ok(stdout)
        }
        Command::Coverage(args) => coverage(args, config),
        Command::RemapTrace(args) => remap_trace(args),
    }
}

/// A file selected for rewriting.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Input {
    path: Utf8PathBuf,
    /// Path below the output directory.
    relative: Utf8PathBuf,
}

struct FileOutcome {
    path: Utf8PathBuf,
    /// Rewritten code when it is printed instead of written.
    printed: Option<String>,
    assertions: usize,
}

/// Rewrites every input file, writing results below `--out-dir` or
/// collecting them for stdout.
pub fn rewrite(args: &RewriteArgs, config: &LunaConfig) -> Result<(RewriteSummary, String), CommandError> {
    let rewriter = Rewriter::new(config.rewrite_options(args))?;
    let ignore_set = build_ignore_set(&args.ignore)?;
    let inputs = collect_inputs(&args.paths, &ignore_set);
    if args.out_dir.is_some() {
        check_output_collisions(&inputs)?;
    }
    tracing::debug!(files = inputs.len(), "rewriting files");

    let outcomes: Vec<FileOutcome> = inputs
        .par_iter()
        .map(|input| rewrite_file(&rewriter, input, args))
        .collect::<Result<_, _>>()?;

    let mut summary = RewriteSummary {
        files: outcomes.len(),
        ..Default::default()
    };
    let mut stdout = String::new();
    for outcome in &outcomes {
        if outcome.assertions > 0 {
            summary.rewritten_files += 1;
            summary.assertions += outcome.assertions;
        }
        if let Some(code) = &outcome.printed {
            if outcomes.len() > 1 {
                stdout.push_str(&format!("// {}\n", outcome.path));
            }
            stdout.push_str(code);
        }
    }

    Ok((summary, stdout))
}

fn rewrite_file(rewriter: &Rewriter, input: &Input, args: &RewriteArgs) -> Result<FileOutcome, CommandError> {
    let source = fs::read_to_string(&input.path).map_err(|source| CommandError::Read {
        path: input.path.clone(),
        source,
    })?;

    let file = input.path.as_str();
    let (code, assertions) = match rewriter.transform(&source, file)? {
        Some(output) if args.inline_map => {
            let code = output
                .code_with_inline_map(&source, file)
                .map_err(|source| CommandError::SourceMap {
                    path: input.path.clone(),
                    source,
                })?;
            (code, output.rewritten)
        }
        Some(output) => (output.code, output.rewritten),
        None => {
            tracing::debug!(%file, "no assertions to rewrite");
            (source, 0)
        }
    };

    let Some(out_dir) = &args.out_dir else {
        return Ok(FileOutcome {
            path: input.path.clone(),
            printed: (assertions > 0).then_some(code),
            assertions,
        });
    };

    // Unchanged files are copied so the output directory is complete.
    let target = out_dir.join(&input.relative);
    if let Some(parent) = target.parent() {
        fs::create_dir_all(parent).map_err(|source| CommandError::Write {
            path: parent.to_owned(),
            source,
        })?;
    }
    fs::write(&target, code).map_err(|source| CommandError::Write {
        path: target.clone(),
        source,
    })?;
    tracing::debug!(%target, assertions, "wrote file");

    Ok(FileOutcome {
        path: input.path.clone(),
        printed: None,
        assertions,
    })
}

fn build_ignore_set(patterns: &[String]) -> Result<GlobSet, CommandError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns.iter().map(String::as_str).chain(DEFAULT_IGNORES.iter().copied()) {
        let glob = Glob::new(pattern).map_err(|e| CommandError::InvalidGlob(e.to_string()))?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|e| CommandError::InvalidGlob(e.to_string()))
}

/// Expands directories into their script files; explicit files are kept
/// as given.
fn collect_inputs(paths: &[Utf8PathBuf], ignore_set: &GlobSet) -> Vec<Input> {
    let mut inputs = Vec::new();

    for root in paths {
        if !root.is_dir() {
            inputs.push(Input {
                path: root.clone(),
                relative: root.file_name().map(Utf8PathBuf::from).unwrap_or_else(|| root.clone()),
            });
            continue;
        }

        let mut files: Vec<Input> = WalkDir::new(root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
            .filter_map(|e| Utf8PathBuf::try_from(e.into_path()).ok())
            .filter(|p| p.extension().is_some_and(|ext| SCRIPT_EXTENSIONS.contains(&ext)))
            .filter_map(|path| {
                let relative = path.strip_prefix(root).ok()?.to_owned();
                if ignore_set.is_match(relative.as_str()) {
                    return None;
                }
                Some(Input { path, relative })
            })
            .collect();
        files.sort_by(|a, b| a.path.cmp(&b.path));
        inputs.extend(files);
    }

    inputs
}

/// Fails when two inputs map to the same path below the output directory.
fn check_output_collisions(inputs: &[Input]) -> Result<(), CommandError> {
    let mut seen: HashMap<&Utf8Path, &Utf8Path> = HashMap::new();
    for input in inputs {
        if let Some(first) = seen.insert(&input.relative, &input.path) {
            return Err(CommandError::OutputCollision {
                relative: input.relative.clone(),
                first: first.to_owned(),
                second: input.path.clone(),
            });
        }
    }
    Ok(())
}

fn read_coverage(path: &Utf8Path) -> Result<Vec<RawScriptCoverage>, CommandError> {
    let content = fs::read_to_string(path).map_err(|source| CommandError::Read {
        path: path.to_owned(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CommandError::CoverageJson {
        path: path.to_owned(),
        source,
    })
}

/// Resolves captured coverage and renders it in the requested format.
pub fn coverage(args: &CoverageArgs, config: &LunaConfig) -> Result<String, CommandError> {
    let options = config.coverage_options(args);
    let captured = read_coverage(&args.coverage)?;

    match args.format {
        ReportFormat::Runtime => {
            let scripts = match captured.first() {
                Some(script) => to_runtime_shape(resolve_source_map(script, &options)?),
                None => Vec::new(),
            };
            Ok(serde_json::to_string_pretty(&scripts)?)
        }
        ReportFormat::Json | ReportFormat::Summary => {
            let generator = LineReportGenerator::from_options(&options);
            let report = puppeteer_to_istanbul(&captured, &options, &generator)?;
            if args.format == ReportFormat::Summary {
                Ok(output::format_summary(&report))
            } else {
                Ok(serde_json::to_string_pretty(&report)?)
            }
        }
    }
}

/// Remaps the trace read from a file or stdin.
pub fn remap_trace(args: &RemapTraceArgs) -> Result<String, CommandError> {
    let captured = read_coverage(&args.coverage)?;
    let trace = match &args.trace {
        Some(path) => fs::read_to_string(path).map_err(|source| CommandError::Read {
            path: path.clone(),
            source,
        })?,
        None => {
            let mut trace = String::new();
            std::io::stdin()
                .read_to_string(&mut trace)
                .map_err(|source| CommandError::Read {
                    path: Utf8PathBuf::from("<stdin>"),
                    source,
                })?;
            trace
        }
    };

    Ok(apply_source_map_to_trace(&trace, &captured)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn utf8(dir: &tempfile::TempDir) -> Utf8PathBuf {
        Utf8PathBuf::try_from(dir.path().to_path_buf()).unwrap()
    }

    fn rewrite_args(paths: Vec<Utf8PathBuf>, out_dir: Option<Utf8PathBuf>) -> RewriteArgs {
        RewriteArgs {
            paths,
            out_dir,
            inline_map: false,
            callee: None,
            ignore: Vec::new(),
        }
    }

    #[test]
    fn test_collect_inputs_walks_directories() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        fs::create_dir_all(root.join("nested")).unwrap();
        fs::create_dir_all(root.join("node_modules/dep")).unwrap();
        fs::write(root.join("a.test.js"), "").unwrap();
        fs::write(root.join("nested/b.test.ts"), "").unwrap();
        fs::write(root.join("notes.md"), "").unwrap();
        fs::write(root.join("node_modules/dep/index.js"), "").unwrap();

        let ignore_set = build_ignore_set(&[]).unwrap();
        let inputs = collect_inputs(&[root.clone()], &ignore_set);
        let relative: Vec<&str> = inputs.iter().map(|i| i.relative.as_str()).collect();
        assert_eq!(relative, vec!["a.test.js", "nested/b.test.ts"]);
    }

    #[test]
    fn test_rewrite_writes_to_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        let src = root.join("src");
        let out = root.join("out");
        fs::create_dir_all(&src).unwrap();
        fs::write(src.join("a.test.js"), "t.assert(a == 1);\n").unwrap();
        fs::write(src.join("plain.js"), "export const a = 1;\n").unwrap();

        let args = rewrite_args(vec![src.clone()], Some(out.clone()));
        let (summary, stdout) = rewrite(&args, &LunaConfig::default()).unwrap();

        assert_eq!(
            summary,
            RewriteSummary {
                files: 2,
                rewritten_files: 1,
                assertions: 1,
            }
        );
        assert!(stdout.is_empty());
        let rewritten = fs::read_to_string(out.join("a.test.js")).unwrap();
        assert!(rewritten.starts_with("const _left1 = a;\nconst _right1 = 1;\n"));
        assert_eq!(
            fs::read_to_string(out.join("plain.js")).unwrap(),
            "export const a = 1;\n"
        );
    }

    #[test]
    fn test_rewrite_prints_without_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let file = utf8(&dir).join("a.test.js");
        fs::write(&file, "t.assert(ok);\n").unwrap();

        let mut args = rewrite_args(vec![file], None);
        args.inline_map = true;
        let (_, stdout) = rewrite(&args, &LunaConfig::default()).unwrap();
        assert!(stdout.starts_with("const _left1 = ok;\n"));
        assert!(stdout.contains("//# sourceMappingURL=data:application/json;charset=utf-8;base64,"));
    }

    #[test]
    fn test_same_named_inputs_collide_in_out_dir() {
        let dir = tempfile::tempdir().unwrap();
        let root = utf8(&dir);
        fs::create_dir_all(root.join("a")).unwrap();
        fs::create_dir_all(root.join("b")).unwrap();
        fs::write(root.join("a/util.test.js"), "t.assert(a);\n").unwrap();
        fs::write(root.join("b/util.test.js"), "t.assert(b);\n").unwrap();

        let paths = vec![root.join("a/util.test.js"), root.join("b/util.test.js")];
        let args = rewrite_args(paths.clone(), Some(root.join("out")));
        let err = rewrite(&args, &LunaConfig::default()).unwrap_err();
        assert!(matches!(err, CommandError::OutputCollision { .. }));
        assert!(!root.join("out").exists());

        // Printing to stdout has nothing to overwrite.
        let (summary, _) = rewrite(&rewrite_args(paths, None), &LunaConfig::default()).unwrap();
        assert_eq!(summary.assertions, 2);
    }

    #[test]
    fn test_missing_input_is_a_read_error() {
        let args = rewrite_args(vec![Utf8PathBuf::from("/definitely/missing.js")], None);
        assert!(matches!(
            rewrite(&args, &LunaConfig::default()),
            Err(CommandError::Read { .. })
        ));
    }

    #[test]
    fn test_coverage_rejects_invalid_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(&dir).join("coverage.json");
        fs::write(&path, "not json").unwrap();

        let args = CoverageArgs {
            coverage: path,
            ignore: None,
            root: None,
            format: ReportFormat::Json,
        };
        assert!(matches!(
            coverage(&args, &LunaConfig::default()),
            Err(CommandError::CoverageJson { .. })
        ));
    }

    #[test]
    fn test_empty_coverage_renders_empty_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = utf8(&dir).join("coverage.json");
        fs::write(&path, "[]").unwrap();

        let args = CoverageArgs {
            coverage: path,
            ignore: None,
            root: None,
            format: ReportFormat::Json,
        };
        assert_eq!(coverage(&args, &LunaConfig::default()).unwrap(), "{}");
    }
}
