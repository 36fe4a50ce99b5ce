//! Assertion rewriting for luna test files.
//!
//! This crate turns boolean assertion statements such as
//! `t.assert(a === b);` into calls that receive a descriptor of the
//! expression: its source text, position, re-printed operands, their values
//! and their ranges within the statement. It handles:
//! - Finding single-line assertion statements outside comments and strings
//! - Parsing and splitting the asserted expression
//! - Generating replacement code that evaluates each operand exactly once
//! - Building a position map from rewritten code back to the original file
//!
//! # Example
//!
//! ```
//! use assert_rewriter::transform;
//!
//! let source = "const fruits = ['Apple'];\nt.assert(fruits == ['Apple']);\n";
//! let output = transform(source, "fruits.test.js").unwrap().unwrap();
//! assert!(output.code.contains("const _left1 = fruits;"));
//!
//! assert!(transform("const a = 1;\n", "plain.js").unwrap().is_none());
//! ```

mod descriptor;
mod error;
mod expr;
mod scan;
mod transform;

pub use descriptor::{
    AssertionDescriptor, Comparison, Literal, Operand, StatementSource, Temporaries,
};
pub use error::{RewriteError, StatementError};
pub use expr::{parse_assertion, ParsedAssertion};
pub use scan::{masked_regions, StatementMatch, StatementScanner};
pub use transform::{
    describe, transform, RewriteOptions, Rewriter, TransformOutput, DEFAULT_CALLEE,
};
