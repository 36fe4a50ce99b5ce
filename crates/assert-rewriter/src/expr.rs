//! Parsing of assertion statements and compact re-printing of expressions.

use crate::descriptor::{Comparison, Operand};
use crate::error::StatementError;
use source_map::{utf16_len, Span};
use swc_common::{sync::Lrc, BytePos, FileName, SourceMap, Spanned};
use swc_ecma_ast::{
    BinaryOp, CallExpr, Callee, Expr, ExprOrSpread, ExprStmt, Lit, MemberProp, ModuleItem, Prop,
    PropName, PropOrSpread, Stmt,
};
use swc_ecma_parser::{EsSyntax, Parser, StringInput, Syntax};

/// The parts of a parsed assertion call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedAssertion {
    pub left: Operand,
    pub comparison: Option<Comparison>,
    /// Re-printed second argument.
    pub message: Option<String>,
}

/// Parses a single assertion statement such as `t.assert(a === b);`.
///
/// The first argument is split into operands when it is a binary expression
/// other than `&&`, `||` or `??`; those keep their short-circuit behavior by
/// staying whole.
pub fn parse_assertion(statement: &str) -> Result<ParsedAssertion, StatementError> {
    let cm: Lrc<SourceMap> = Default::default();
    let fm = cm.new_source_file(
        FileName::Custom("assertion".into()).into(),
        statement.to_string(),
    );
    let printer = Printer {
        source: statement,
        file_start: fm.start_pos,
    };

    let mut parser = Parser::new(
        Syntax::Es(EsSyntax::default()),
        StringInput::from(&*fm),
        None,
    );
    let module = parser
        .parse_module()
        .map_err(|err| StatementError::Syntax(format!("{:?}", err.kind())))?;
    if let Some(err) = parser.take_errors().into_iter().next() {
        return Err(StatementError::Syntax(format!("{:?}", err.kind())));
    }

    let [ModuleItem::Stmt(Stmt::Expr(ExprStmt { expr, .. }))] = module.body.as_slice() else {
        return Err(StatementError::NotACall);
    };
    let Expr::Call(CallExpr {
        callee: Callee::Expr(_),
        args,
        ..
    }) = &**expr
    else {
        return Err(StatementError::NotACall);
    };

    if args.is_empty() || args.len() > 2 {
        return Err(StatementError::ArgumentCount(args.len()));
    }
    if args.iter().any(|arg| arg.spread.is_some()) {
        return Err(StatementError::SpreadArgument);
    }

    let (left, comparison) = match strip_parens(&args[0].expr) {
        Expr::Bin(bin) if !is_logical(bin.op) => (
            printer.operand(&bin.left),
            Some(Comparison {
                operator: bin.op.as_str(),
                right: printer.operand(&bin.right),
            }),
        ),
        first => (printer.operand(first), None),
    };
    let message = args.get(1).map(|arg| printer.print(&arg.expr));

    Ok(ParsedAssertion {
        left,
        comparison,
        message,
    })
}

fn strip_parens(mut expr: &Expr) -> &Expr {
    while let Expr::Paren(paren) = expr {
        expr = &*paren.expr;
    }
    expr
}

fn is_logical(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::LogicalAnd | BinaryOp::LogicalOr | BinaryOp::NullishCoalescing
    )
}

/// Prints expressions of one parsed statement in a compact normalized form.
struct Printer<'a> {
    source: &'a str,
    file_start: BytePos,
}

impl Printer<'_> {
    fn operand(&self, expr: &Expr) -> Operand {
        let (start, end) = self.byte_range(expr.span());
        Operand {
            code: self.print(expr),
            range: Span::new(
                utf16_len(&self.source[..start]),
                utf16_len(&self.source[..end]),
            ),
        }
    }

    fn byte_range(&self, span: swc_common::Span) -> (usize, usize) {
        let start = span.lo.0.saturating_sub(self.file_start.0) as usize;
        let end = span.hi.0.saturating_sub(self.file_start.0) as usize;
        let end = end.min(self.source.len());
        (start.min(end), end)
    }

    /// Original text of a node.
    fn raw(&self, span: swc_common::Span) -> &str {
        let (start, end) = self.byte_range(span);
        self.source.get(start..end).unwrap_or_default()
    }

    fn print(&self, expr: &Expr) -> String {
        let mut out = String::new();
        self.write_expr(expr, &mut out);
        out
    }

    fn write_expr(&self, expr: &Expr, out: &mut String) {
        match expr {
            Expr::Ident(ident) => out.push_str(&ident.sym),
            Expr::This(_) => out.push_str("this"),
            Expr::Lit(Lit::Str(s)) => out.push_str(&double_quoted(self.raw(s.span))),
            Expr::Array(array) => {
                out.push('[');
                for (i, elem) in array.elems.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    if let Some(elem) = elem {
                        self.write_arg(elem, out);
                    }
                }
                // A trailing hole needs its own comma to keep the length.
                if matches!(array.elems.last(), Some(None)) {
                    out.push(',');
                }
                out.push(']');
            }
            Expr::Object(object) => {
                if object.props.is_empty() {
                    out.push_str("{}");
                    return;
                }
                out.push('{');
                for (i, prop) in object.props.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_prop(prop, out);
                }
                out.push('}');
            }
            Expr::Bin(bin) => {
                self.write_expr(&bin.left, out);
                out.push(' ');
                out.push_str(bin.op.as_str());
                out.push(' ');
                self.write_expr(&bin.right, out);
            }
            Expr::Unary(unary) => {
                let op = unary.op.as_str();
                out.push_str(op);
                if op.chars().all(|c| c.is_ascii_alphabetic()) {
                    out.push(' ');
                }
                push_after_operator(out, &self.print(&unary.arg));
            }
            Expr::Update(update) => {
                if update.prefix {
                    out.push_str(update.op.as_str());
                    push_after_operator(out, &self.print(&update.arg));
                } else {
                    self.write_expr(&update.arg, out);
                    out.push_str(update.op.as_str());
                }
            }
            Expr::Member(member) => {
                self.write_expr(&member.obj, out);
                match &member.prop {
                    MemberProp::Ident(name) => {
                        out.push('.');
                        out.push_str(&name.sym);
                    }
                    MemberProp::Computed(computed) => {
                        out.push('[');
                        self.write_expr(&computed.expr, out);
                        out.push(']');
                    }
                    MemberProp::PrivateName(name) => {
                        out.push('.');
                        out.push_str(self.raw(name.span));
                    }
                }
            }
            Expr::Call(call) => match &call.callee {
                Callee::Expr(callee) => {
                    self.write_expr(callee, out);
                    self.write_args(&call.args, out);
                }
                _ => out.push_str(self.raw(call.span)),
            },
            Expr::New(new) => {
                out.push_str("new ");
                self.write_expr(&new.callee, out);
                if let Some(args) = &new.args {
                    self.write_args(args, out);
                }
            }
            Expr::Paren(paren) => {
                out.push('(');
                self.write_expr(&paren.expr, out);
                out.push(')');
            }
            Expr::Cond(cond) => {
                self.write_expr(&cond.test, out);
                out.push_str(" ? ");
                self.write_expr(&cond.cons, out);
                out.push_str(" : ");
                self.write_expr(&cond.alt, out);
            }
            Expr::Await(await_expr) => {
                out.push_str("await ");
                self.write_expr(&await_expr.arg, out);
            }
            Expr::Seq(seq) => {
                for (i, expr) in seq.exprs.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_expr(expr, out);
                }
            }
            // Numbers, regexes, templates, functions and the rest keep their text.
            other => out.push_str(self.raw(other.span())),
        }
    }

    fn write_args(&self, args: &[ExprOrSpread], out: &mut String) {
        out.push('(');
        for (i, arg) in args.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            self.write_arg(arg, out);
        }
        out.push(')');
    }

    fn write_arg(&self, arg: &ExprOrSpread, out: &mut String) {
        if arg.spread.is_some() {
            out.push_str("...");
        }
        self.write_expr(&arg.expr, out);
    }

    fn write_prop(&self, prop: &PropOrSpread, out: &mut String) {
        match prop {
            PropOrSpread::Spread(spread) => {
                out.push_str("...");
                self.write_expr(&spread.expr, out);
            }
            PropOrSpread::Prop(prop) => match &**prop {
                Prop::Shorthand(ident) => out.push_str(&ident.sym),
                Prop::KeyValue(kv) => {
                    self.write_prop_name(&kv.key, out);
                    out.push_str(": ");
                    self.write_expr(&kv.value, out);
                }
                other => out.push_str(self.raw(other.span())),
            },
        }
    }

    fn write_prop_name(&self, name: &PropName, out: &mut String) {
        match name {
            PropName::Ident(ident) => out.push_str(&ident.sym),
            PropName::Str(s) => out.push_str(&double_quoted(self.raw(s.span))),
            PropName::Computed(computed) => {
                out.push('[');
                self.write_expr(&computed.expr, out);
                out.push(']');
            }
            other => out.push_str(self.raw(other.span())),
        }
    }
}

/// Re-quotes a string literal with double quotes, keeping its escapes.
/// Appends `text` after a prefix operator, separating `+ +` and `- -` so
/// they do not fuse into `++` or `--`.
fn push_after_operator(out: &mut String, text: &str) {
    if let (Some(last @ ('+' | '-')), Some(first)) = (out.chars().last(), text.chars().next()) {
        if last == first {
            out.push(' ');
        }
    }
    out.push_str(text);
}

fn double_quoted(raw: &str) -> String {
    if !raw.starts_with('\'') || raw.len() < 2 {
        return raw.to_string();
    }

    let inner = &raw[1..raw.len() - 1];
    let mut out = String::with_capacity(raw.len() + 2);
    out.push('"');
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some('\'') => out.push('\''),
                Some(next) => {
                    out.push('\\');
                    out.push(next);
                }
                None => out.push('\\'),
            },
            '"' => out.push_str("\\\""),
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn range(operand: &Operand) -> [u32; 2] {
        [operand.range.start.into(), operand.range.end.into()]
    }

    #[test]
    fn test_binary_assertion_is_split() {
        let parsed = parse_assertion("t.assert(name === 'luna');").unwrap();
        assert_eq!(parsed.left.code, "name");
        assert_eq!(range(&parsed.left), [9, 13]);

        let comparison = parsed.comparison.unwrap();
        assert_eq!(comparison.operator, "===");
        assert_eq!(comparison.right.code, "\"luna\"");
        assert_eq!(range(&comparison.right), [18, 24]);
        assert_eq!(parsed.message, None);
    }

    #[test]
    fn test_unary_assertion_keeps_whole_argument() {
        let parsed = parse_assertion("t.assert(something);").unwrap();
        assert_eq!(parsed.left.code, "something");
        assert_eq!(range(&parsed.left), [9, 18]);
        assert!(parsed.comparison.is_none());
    }

    #[test]
    fn test_logical_operators_are_not_split() {
        let parsed = parse_assertion("t.assert(a && b.c());").unwrap();
        assert_eq!(parsed.left.code, "a && b.c()");
        assert!(parsed.comparison.is_none());

        let parsed = parse_assertion("t.assert(a ?? b);").unwrap();
        assert!(parsed.comparison.is_none());
    }

    #[test]
    fn test_outer_parens_are_ignored_for_splitting() {
        let parsed = parse_assertion("t.assert((a < b));").unwrap();
        assert_eq!(parsed.left.code, "a");
        assert_eq!(parsed.comparison.map(|c| c.operator), Some("<"));
    }

    #[test]
    fn test_message_is_reprinted() {
        let parsed = parse_assertion("t.assert(pos == {line: 2, column: 8}, 'Position should match');")
            .unwrap();
        assert_eq!(parsed.left.code, "pos");
        assert_eq!(
            parsed.comparison.unwrap().right.code,
            "{line: 2, column: 8}"
        );
        assert_eq!(parsed.message.as_deref(), Some("\"Position should match\""));
    }

    #[test]
    fn test_printer_normalizes_layout() {
        let parsed = parse_assertion("t.assert(fruits == ['Apple','Blueberry']);").unwrap();
        assert_eq!(
            parsed.comparison.unwrap().right.code,
            "[\"Apple\", \"Blueberry\"]"
        );

        let parsed = parse_assertion("t.assert(typeof  foo.bar[0]( x,...rest )==='it\\'s \"x\"');")
            .unwrap();
        assert_eq!(parsed.left.code, "typeof foo.bar[0](x, ...rest)");
        assert_eq!(
            parsed.comparison.unwrap().right.code,
            "\"it's \\\"x\\\"\""
        );
    }

    #[test]
    fn test_printer_keeps_text_of_other_nodes() {
        let parsed = parse_assertion("t.assert(list.map((x) => x * 2).length === 0x10);").unwrap();
        assert_eq!(parsed.left.code, "list.map((x) => x * 2).length");
        assert_eq!(parsed.comparison.unwrap().right.code, "0x10");
    }

    #[test]
    fn test_prefix_operators_do_not_fuse() {
        let parsed = parse_assertion("t.assert(- -x == 1);").unwrap();
        assert_eq!(parsed.left.code, "- -x");

        let parsed = parse_assertion("t.assert(+ +x);").unwrap();
        assert_eq!(parsed.left.code, "+ +x");

        let parsed = parse_assertion("t.assert(- --x === -1);").unwrap();
        assert_eq!(parsed.left.code, "- --x");
        assert_eq!(parsed.comparison.unwrap().right.code, "-1");

        let parsed = parse_assertion("t.assert(-(-x) + - -1);").unwrap();
        assert_eq!(parsed.left.code, "-(-x)");
        assert_eq!(parsed.comparison.unwrap().right.code, "- -1");
    }

    #[test]
    fn test_array_holes_keep_length() {
        let parsed = parse_assertion("t.assert([a,,].length == 2);").unwrap();
        assert_eq!(parsed.left.code, "[a, ,].length");

        let parsed = parse_assertion("t.assert([,]);").unwrap();
        assert_eq!(parsed.left.code, "[,]");

        let parsed = parse_assertion("t.assert([a,,b]);").unwrap();
        assert_eq!(parsed.left.code, "[a, , b]");
    }

    #[test]
    fn test_ranges_count_utf16_units() {
        let parsed = parse_assertion("t.assert('😀' === emoji);").unwrap();
        assert_eq!(range(&parsed.left), [9, 13]);
        assert_eq!(range(&parsed.comparison.unwrap().right), [18, 23]);
    }

    #[test]
    fn test_rejected_statements() {
        assert_eq!(
            parse_assertion("t.assert();"),
            Err(StatementError::ArgumentCount(0))
        );
        assert_eq!(
            parse_assertion("t.assert(a, b, c);"),
            Err(StatementError::ArgumentCount(3))
        );
        assert_eq!(
            parse_assertion("t.assert(...args);"),
            Err(StatementError::SpreadArgument)
        );
        assert_eq!(
            parse_assertion("t.assert(a); t.assert(b);"),
            Err(StatementError::NotACall)
        );
        assert!(matches!(
            parse_assertion("t.assert(a ==);"),
            Err(StatementError::Syntax(_))
        ));
    }

    #[test]
    fn test_double_quoted() {
        assert_eq!(double_quoted("'a'"), "\"a\"");
        assert_eq!(double_quoted("\"a\""), "\"a\"");
        assert_eq!(double_quoted("'a\\nb'"), "\"a\\nb\"");
    }
}
