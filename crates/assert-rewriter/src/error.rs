//! Error types for assertion rewriting.

use thiserror::Error;

/// An error that prevents a file from being rewritten.
#[derive(Debug, Error)]
pub enum RewriteError {
    /// The configured callee is empty.
    #[error("assertion callee must not be empty")]
    EmptyCallee,

    /// The configured callee does not produce a valid statement pattern.
    #[error("invalid assertion callee `{callee}`: {source}")]
    InvalidCallee {
        /// The configured callee.
        callee: String,
        /// The underlying pattern error.
        source: regex::Error,
    },

    /// The file is too large to be addressed with 32-bit offsets.
    #[error("source is too large to rewrite ({0} bytes)")]
    SourceTooLarge(usize),
}

/// Why a matched statement was left untouched.
///
/// These are not fatal: the statement keeps its original behavior.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatementError {
    /// The statement does not parse as JavaScript.
    #[error("statement does not parse: {0}")]
    Syntax(String),

    /// The statement is not a single call expression statement.
    #[error("statement is not a single call expression")]
    NotACall,

    /// The call has no arguments or more than two.
    #[error("expected one or two arguments, found {0}")]
    ArgumentCount(usize),

    /// An argument uses spread syntax.
    #[error("spread arguments are not supported")]
    SpreadArgument,
}
