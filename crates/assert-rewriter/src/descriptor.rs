//! Assertion descriptors and their literal form.

use source_map::{SourcePosition, Span};
use std::fmt;

/// One side of an assertion expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Operand {
    /// Re-printed expression source.
    pub code: String,
    /// Range of the expression within the statement text.
    pub range: Span,
}

/// The comparison part of a binary assertion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Comparison {
    /// Operator token, e.g. `===`.
    pub operator: &'static str,
    /// Right-hand operand.
    pub right: Operand,
}

/// Where an assertion statement was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementSource {
    /// The statement text as written.
    pub code: String,
    /// File identifier passed to the rewriter.
    pub file: String,
    /// Position of the statement start.
    pub position: SourcePosition,
}

/// Structured payload that replaces a boolean assertion expression.
///
/// A unary assertion has no comparison, so `operator` and `right` are present
/// or absent together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssertionDescriptor {
    pub source: StatementSource,
    pub left: Operand,
    pub comparison: Option<Comparison>,
    /// Re-printed message expression.
    pub message: Option<String>,
}

impl AssertionDescriptor {
    /// Returns the comparison operator, if any.
    pub fn operator(&self) -> Option<&'static str> {
        self.comparison.as_ref().map(|c| c.operator)
    }

    /// Returns the right-hand operand, if any.
    pub fn right(&self) -> Option<&Operand> {
        self.comparison.as_ref().map(|c| &c.right)
    }

    /// Builds the literal passed to the runtime entry point, with value slots
    /// referencing `temporaries`.
    ///
    /// Keys appear in the order `source`, `left`, `value`, `operator`,
    /// `right`, `message`.
    pub fn to_literal(&self, temporaries: &Temporaries) -> Literal {
        let mut fields = vec![
            ("source", self.source_literal()),
            (
                "left",
                operand_literal(&self.left, Literal::Reference(temporaries.left())),
            ),
        ];

        match &self.comparison {
            Some(comparison) => {
                fields.push((
                    "value",
                    Literal::Reference(temporaries.comparison(comparison.operator)),
                ));
                fields.push(("operator", Literal::String(comparison.operator.to_string())));
                fields.push((
                    "right",
                    operand_literal(&comparison.right, Literal::Reference(temporaries.right())),
                ));
            }
            None => fields.push(("value", Literal::Reference(temporaries.left()))),
        }

        if let Some(message) = &self.message {
            fields.push(("message", Literal::String(message.clone())));
        }

        Literal::Object(fields)
    }

    fn source_literal(&self) -> Literal {
        let position = self.source.position;
        Literal::Object(vec![
            ("code", Literal::String(self.source.code.clone())),
            ("file", Literal::String(self.source.file.clone())),
            (
                "position",
                Literal::Object(vec![
                    ("line", Literal::Number(position.line.into())),
                    ("column", Literal::Number(position.column.into())),
                ]),
            ),
        ])
    }
}

fn operand_literal(operand: &Operand, value: Literal) -> Literal {
    Literal::Object(vec![
        ("code", Literal::String(operand.code.clone())),
        ("value", value),
        (
            "range",
            Literal::Array(vec![
                Literal::Number(u32::from(operand.range.start).into()),
                Literal::Number(u32::from(operand.range.end).into()),
            ]),
        ),
    ])
}

/// Names of the temporaries introduced for the assertion with a given index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Temporaries {
    index: usize,
}

impl Temporaries {
    /// Temporaries for the `index`-th rewritten assertion (1-based).
    pub fn new(index: usize) -> Self {
        Self { index }
    }

    /// Name of the left operand temporary.
    pub fn left(&self) -> String {
        format!("_left{}", self.index)
    }

    /// Name of the right operand temporary.
    pub fn right(&self) -> String {
        format!("_right{}", self.index)
    }

    /// Expression comparing the two temporaries.
    pub fn comparison(&self, operator: &str) -> String {
        format!("{} {} {}", self.left(), operator, self.right())
    }
}

/// A JavaScript object literal with holes for code references.
///
/// Data is printed in JSON form; [`Literal::Reference`] prints its code
/// unquoted, so a reference can never be confused with string data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Literal {
    String(String),
    Number(u64),
    Array(Vec<Literal>),
    Object(Vec<(&'static str, Literal)>),
    Reference(String),
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::String(value) => write_json_string(f, value),
            Literal::Number(value) => write!(f, "{value}"),
            Literal::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Literal::Object(fields) => {
                f.write_str("{")?;
                for (i, (key, value)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write_json_string(f, key)?;
                    write!(f, ":{value}")?;
                }
                f.write_str("}")
            }
            Literal::Reference(code) => f.write_str(code),
        }
    }
}

fn write_json_string(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    let quoted = serde_json::to_string(value).map_err(|_| fmt::Error)?;
    f.write_str(&quoted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn operand(code: &str, start: u32, end: u32) -> Operand {
        Operand {
            code: code.to_string(),
            range: Span::new(start, end),
        }
    }

    fn descriptor(comparison: Option<Comparison>, message: Option<&str>) -> AssertionDescriptor {
        AssertionDescriptor {
            source: StatementSource {
                code: "t.assert(x);".to_string(),
                file: "a.js".to_string(),
                position: SourcePosition::new(3, 4),
            },
            left: operand("x", 9, 10),
            comparison,
            message: message.map(str::to_string),
        }
    }

    #[test]
    fn test_unary_literal_has_no_comparison_keys() {
        let literal = descriptor(None, None).to_literal(&Temporaries::new(2));
        assert_eq!(
            literal.to_string(),
            r#"{"source":{"code":"t.assert(x);","file":"a.js","position":{"line":3,"column":4}},"left":{"code":"x","value":_left2,"range":[9,10]},"value":_left2}"#
        );
    }

    #[test]
    fn test_binary_literal_orders_keys() {
        let comparison = Comparison {
            operator: "===",
            right: operand("\"y\"", 15, 18),
        };
        let literal = descriptor(Some(comparison), Some("\"why\"")).to_literal(&Temporaries::new(1));
        assert_eq!(
            literal.to_string(),
            concat!(
                r#"{"source":{"code":"t.assert(x);","file":"a.js","position":{"line":3,"column":4}},"#,
                r#""left":{"code":"x","value":_left1,"range":[9,10]},"#,
                r#""value":_left1 === _right1,"operator":"===","#,
                r#""right":{"code":"\"y\"","value":_right1,"range":[15,18]},"#,
                r#""message":"\"why\""}"#
            )
        );
    }

    #[test]
    fn test_placeholder_like_data_stays_quoted() {
        let mut descriptor = descriptor(None, None);
        descriptor.left.code = "_left1".to_string();
        let printed = descriptor.to_literal(&Temporaries::new(1)).to_string();
        assert!(printed.contains(r#""code":"_left1","value":_left1"#));
    }

    #[test]
    fn test_accessors() {
        let comparison = Comparison {
            operator: "<",
            right: operand("2", 13, 14),
        };
        let descriptor = descriptor(Some(comparison), None);
        assert_eq!(descriptor.operator(), Some("<"));
        assert_eq!(descriptor.right().map(|r| r.code.as_str()), Some("2"));
    }
}
