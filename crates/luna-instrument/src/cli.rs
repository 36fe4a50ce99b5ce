//! CLI argument parsing.

use camino::Utf8PathBuf;
use clap::{Args as ClapArgs, Parser, Subcommand, ValueEnum};

/// Assertion rewriting and coverage remapping for luna test runs.
#[derive(Debug, Parser)]
#[command(name = "luna-instrument")]
#[command(version, about, long_about = None)]
pub struct Args {
    /// Path to a luna.config.json file
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Enable debug logging (overrides LUNA_LOG)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Rewrite assertion statements in test files
    Rewrite(RewriteArgs),
    /// Attribute captured browser coverage to original sources
    Coverage(CoverageArgs),
    /// Map stack trace locations back to original sources
    RemapTrace(RemapTraceArgs),
}

#[derive(Debug, ClapArgs)]
pub struct RewriteArgs {
    /// Files or directories to rewrite
    #[arg(required = true)]
    pub paths: Vec<Utf8PathBuf>,

    /// Directory to write rewritten files to (stdout when absent)
    #[arg(long)]
    pub out_dir: Option<Utf8PathBuf>,

    /// Append an inline source map to rewritten files
    #[arg(long)]
    pub inline_map: bool,

    /// Assertion callee to rewrite (default: t.assert)
    #[arg(long)]
    pub callee: Option<String>,

    /// Glob patterns to skip when walking directories
    #[arg(long)]
    pub ignore: Vec<String>,
}

#[derive(Debug, ClapArgs)]
pub struct CoverageArgs {
    /// Captured coverage JSON (a list of scripts with url, text and ranges)
    pub coverage: Utf8PathBuf,

    /// Drop sources whose path contains this substring
    #[arg(long)]
    pub ignore: Option<String>,

    /// Directory relative source paths are resolved against
    #[arg(long)]
    pub root: Option<Utf8PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value = "json")]
    pub format: ReportFormat,
}

#[derive(Debug, ClapArgs)]
pub struct RemapTraceArgs {
    /// Captured coverage JSON holding the script and its inline map
    pub coverage: Utf8PathBuf,

    /// File with the stack trace (stdin when absent)
    pub trace: Option<Utf8PathBuf>,
}

/// Coverage output format.
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ReportFormat {
    /// Per-file report keyed by path (default)
    #[default]
    Json,
    /// Runtime coverage shape per original source
    Runtime,
    /// One line of statement totals per file
    Summary,
}
