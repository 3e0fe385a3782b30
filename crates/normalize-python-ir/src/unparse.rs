//! Render syntax nodes back to Python source.
//!
//! This is the raw-text fallback used wherever an expression has no
//! structured literal form. Output is deterministic and re-parses as Python;
//! parentheses are inserted by precedence, not copied from the original.

use crate::ast::*;

/// Render an expression as Python source.
pub fn unparse_expr(expr: &Expr) -> String {
    let mut writer = Unparser::new();
    writer.write_expr(expr, Prec::TEST);
    writer.output
}

/// Render a statement (and any nested block) as Python source.
pub fn unparse_stmt(stmt: &Stmt) -> String {
    let mut writer = Unparser::new();
    writer.write_stmt(stmt);
    writer.output.truncate(writer.output.trim_end().len());
    writer.output
}

/// Python `repr()` of a string.
pub fn quote_str(s: &str) -> String {
    let quote = if s.contains('\'') && !s.contains('"') {
        '"'
    } else {
        '\''
    };
    let mut out = String::with_capacity(s.len() + 2);
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c if (c as u32) < 0x20 || c == '\x7f' => {
                out.push_str(&format!("\\x{:02x}", c as u32));
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Python `repr()` of a float: shortest round-trip digits, fixed notation for
/// exponents in `-4..16`, otherwise `1e+16` style.
pub fn float_repr(x: f64) -> String {
    if x.is_nan() {
        return "nan".to_string();
    }
    if x.is_infinite() {
        return if x > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if x == 0.0 {
        return if x.is_sign_negative() { "-0.0" } else { "0.0" }.to_string();
    }

    let sci = format!("{x:e}");
    let (mantissa, exp) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let (sign, mantissa) = match mantissa.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", mantissa),
    };
    let digits: String = mantissa.chars().filter(|c| *c != '.').collect();

    let body = if (-4..16).contains(&exp) {
        if exp >= 0 {
            let point = exp as usize + 1;
            if digits.len() <= point {
                format!("{digits}{}.0", "0".repeat(point - digits.len()))
            } else {
                format!("{}.{}", &digits[..point], &digits[point..])
            }
        } else {
            format!("0.{}{digits}", "0".repeat((-exp - 1) as usize))
        }
    } else {
        let (first, rest) = digits.split_at(1);
        let mantissa = if rest.is_empty() {
            first.to_string()
        } else {
            format!("{first}.{rest}")
        };
        let exp_sign = if exp < 0 { '-' } else { '+' };
        format!("{mantissa}e{exp_sign}{:02}", exp.abs())
    };
    format!("{sign}{body}")
}

/// Imaginary part without the `j` suffix; integral values drop `.0`.
pub fn imaginary_repr(x: f64) -> String {
    let repr = float_repr(x);
    match repr.strip_suffix(".0") {
        Some(integral) => integral.to_string(),
        None => repr,
    }
}

/// Binding strength, loosest first (mirrors CPython's unparser).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Prec(u8);

impl Prec {
    const NAMED_EXPR: Prec = Prec(1);
    const TUPLE: Prec = Prec(2);
    const TEST: Prec = Prec(4);
    const OR: Prec = Prec(5);
    const AND: Prec = Prec(6);
    const NOT: Prec = Prec(7);
    const CMP: Prec = Prec(8);
    const EXPR: Prec = Prec(9);
    const BOR: Prec = Prec(9);
    const BXOR: Prec = Prec(10);
    const BAND: Prec = Prec(11);
    const SHIFT: Prec = Prec(12);
    const ARITH: Prec = Prec(13);
    const TERM: Prec = Prec(14);
    const FACTOR: Prec = Prec(15);
    const POWER: Prec = Prec(16);
    const AWAIT: Prec = Prec(17);
    const ATOM: Prec = Prec(18);

    fn next(self) -> Prec {
        Prec(self.0 + 1)
    }

    fn of_operator(op: Operator) -> Prec {
        match op {
            Operator::BitOr => Prec::BOR,
            Operator::BitXor => Prec::BXOR,
            Operator::BitAnd => Prec::BAND,
            Operator::LShift | Operator::RShift => Prec::SHIFT,
            Operator::Add | Operator::Sub => Prec::ARITH,
            Operator::Mult
            | Operator::MatMult
            | Operator::Div
            | Operator::Mod
            | Operator::FloorDiv => Prec::TERM,
            Operator::Pow => Prec::POWER,
        }
    }

    fn of_bool_operator(op: BoolOperator) -> Prec {
        match op {
            BoolOperator::And => Prec::AND,
            BoolOperator::Or => Prec::OR,
        }
    }
}

fn precedence(expr: &Expr) -> Prec {
    match expr {
        Expr::BinOp(bin) => Prec::of_operator(bin.op),
        Expr::BoolOp(bool_op) => Prec::of_bool_operator(bool_op.op),
        Expr::UnaryOp {
            op: UnaryOperator::Not,
            ..
        } => Prec::NOT,
        Expr::UnaryOp { .. } => Prec::FACTOR,
        Expr::Compare { .. } => Prec::CMP,
        Expr::IfExp { .. } | Expr::Lambda { .. } => Prec::TEST,
        Expr::NamedExpr { .. } => Prec::NAMED_EXPR,
        Expr::Await(_) => Prec::AWAIT,
        _ => Prec::ATOM,
    }
}

/// Whether `operand` must be parenthesized when spliced into a binary
/// operation on the given side.
pub(crate) fn bin_operand_needs_parens(operand: &Expr, op: Operator, right_side: bool) -> bool {
    let prec = Prec::of_operator(op);
    let context = if (op == Operator::Pow) != right_side {
        prec.next()
    } else {
        prec
    };
    precedence(operand) < context
}

/// Whether `operand` must be parenthesized inside a boolean chain.
pub(crate) fn bool_operand_needs_parens(operand: &Expr, op: BoolOperator) -> bool {
    precedence(operand) < Prec::of_bool_operator(op).next()
}

struct Unparser {
    output: String,
    indent: usize,
}

impl Unparser {
    fn new() -> Self {
        Self {
            output: String::new(),
            indent: 0,
        }
    }

    fn write_indent(&mut self) {
        for _ in 0..self.indent {
            self.output.push_str("    ");
        }
    }

    fn write_block(&mut self, body: &[Stmt]) {
        self.indent += 1;
        if body.is_empty() {
            self.write_indent();
            self.output.push_str("pass\n");
        } else {
            for stmt in body {
                self.write_stmt(stmt);
            }
        }
        self.indent -= 1;
    }

    fn write_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expr(expr) => {
                self.write_indent();
                self.write_expr(expr, Prec::TUPLE);
                self.output.push('\n');
            }

            Stmt::Assign(assign) => {
                self.write_indent();
                for target in &assign.targets {
                    self.write_expr(target, Prec::TUPLE);
                    self.output.push_str(" = ");
                }
                self.write_expr(&assign.value, Prec::TUPLE);
                self.output.push('\n');
            }

            Stmt::AnnAssign(ann) => {
                self.write_indent();
                self.write_expr(&ann.target, Prec::TEST);
                self.output.push_str(": ");
                self.write_expr(&ann.annotation, Prec::TEST);
                if let Some(value) = &ann.value {
                    self.output.push_str(" = ");
                    self.write_expr(value, Prec::TEST);
                }
                self.output.push('\n');
            }

            Stmt::FunctionDef(func) => {
                self.write_decorators(&func.decorators);
                self.write_indent();
                if func.is_async {
                    self.output.push_str("async ");
                }
                self.output.push_str("def ");
                self.output.push_str(&func.name);
                self.output.push('(');
                self.write_arguments(&func.args, true);
                self.output.push(')');
                if let Some(returns) = &func.returns {
                    self.output.push_str(" -> ");
                    self.write_expr(returns, Prec::TEST);
                }
                self.output.push_str(":\n");
                self.write_block(&func.body);
            }

            Stmt::ClassDef(class) => {
                self.write_decorators(&class.decorators);
                self.write_indent();
                self.output.push_str("class ");
                self.output.push_str(&class.name);
                if !class.bases.is_empty() || !class.keywords.is_empty() {
                    self.output.push('(');
                    self.write_call_arguments(&class.bases, &class.keywords);
                    self.output.push(')');
                }
                self.output.push_str(":\n");
                self.write_block(&class.body);
            }

            Stmt::Opaque { source, .. } => {
                for line in source.lines() {
                    if !line.trim().is_empty() {
                        self.write_indent();
                        self.output.push_str(line);
                    }
                    self.output.push('\n');
                }
            }
        }
    }

    fn write_decorators(&mut self, decorators: &[Expr]) {
        for decorator in decorators {
            self.write_indent();
            self.output.push('@');
            self.write_expr(decorator, Prec::NAMED_EXPR);
            self.output.push('\n');
        }
    }

    /// `annotations` is false for lambdas, which cannot carry them.
    fn write_arguments(&mut self, args: &Arguments, annotations: bool) {
        let mut first = true;
        let mut sep = |out: &mut String| {
            if !first {
                out.push_str(", ");
            }
            first = false;
        };

        let positional: Vec<&Arg> = args.posonlyargs.iter().chain(&args.args).collect();
        let first_default = positional.len().saturating_sub(args.defaults.len());
        for (index, arg) in positional.iter().enumerate() {
            sep(&mut self.output);
            self.write_arg(arg, annotations);
            if index >= first_default {
                let default = &args.defaults[index - first_default];
                self.write_default(default, arg.annotation.is_some() && annotations);
            }
            if index + 1 == args.posonlyargs.len() {
                self.output.push_str(", /");
            }
        }

        if args.vararg.is_some() || !args.kwonlyargs.is_empty() {
            sep(&mut self.output);
            self.output.push('*');
            if let Some(vararg) = &args.vararg {
                self.write_arg(vararg, annotations);
            }
        }

        for (index, arg) in args.kwonlyargs.iter().enumerate() {
            sep(&mut self.output);
            self.write_arg(arg, annotations);
            if let Some(Some(default)) = args.kw_defaults.get(index) {
                self.write_default(default, arg.annotation.is_some() && annotations);
            }
        }

        if let Some(kwarg) = &args.kwarg {
            sep(&mut self.output);
            self.output.push_str("**");
            self.write_arg(kwarg, annotations);
        }
    }

    fn write_arg(&mut self, arg: &Arg, annotations: bool) {
        self.output.push_str(&arg.name);
        if annotations && let Some(annotation) = &arg.annotation {
            self.output.push_str(": ");
            self.write_expr(annotation, Prec::TEST);
        }
    }

    fn write_default(&mut self, default: &Expr, spaced: bool) {
        self.output.push_str(if spaced { " = " } else { "=" });
        self.write_expr(default, Prec::TEST);
    }

    fn write_call_arguments(&mut self, args: &[Expr], keywords: &[Keyword]) {
        let mut first = true;
        for arg in args {
            if !first {
                self.output.push_str(", ");
            }
            first = false;
            self.write_expr(arg, Prec::TEST);
        }
        for keyword in keywords {
            if !first {
                self.output.push_str(", ");
            }
            first = false;
            match &keyword.arg {
                Some(name) => {
                    self.output.push_str(name);
                    self.output.push('=');
                }
                None => self.output.push_str("**"),
            }
            self.write_expr(&keyword.value, Prec::TEST);
        }
    }

    fn write_items(&mut self, items: &[Expr]) {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.output.push_str(", ");
            }
            self.write_expr(item, Prec::TEST);
        }
    }

    fn write_expr(&mut self, expr: &Expr, context: Prec) {
        match expr {
            Expr::Name(id) => self.output.push_str(id),
            Expr::Str(s) => self.output.push_str(&quote_str(s)),
            Expr::Bytes(source) | Expr::FormattedStr(source) => self.output.push_str(source),
            Expr::Num(Num::Int(n)) => self.output.push_str(&n.to_string()),
            Expr::Num(Num::Float(x)) => self.output.push_str(&float_repr(*x)),
            Expr::Num(Num::Imaginary(x)) => {
                self.output.push_str(&imaginary_repr(*x));
                self.output.push('j');
            }
            Expr::Bool(true) => self.output.push_str("True"),
            Expr::Bool(false) => self.output.push_str("False"),
            Expr::NoneLit => self.output.push_str("None"),
            Expr::Ellipsis => self.output.push_str("..."),

            Expr::Dict { keys, values } => {
                self.output.push('{');
                for (i, (key, value)) in keys.iter().zip(values).enumerate() {
                    if i > 0 {
                        self.output.push_str(", ");
                    }
                    match key {
                        Some(key) => {
                            self.write_expr(key, Prec::TEST);
                            self.output.push_str(": ");
                            self.write_expr(value, Prec::TEST);
                        }
                        None => {
                            self.output.push_str("**");
                            self.write_expr(value, Prec::EXPR);
                        }
                    }
                }
                self.output.push('}');
            }

            Expr::List(items) => {
                self.output.push('[');
                self.write_items(items);
                self.output.push(']');
            }

            Expr::Tuple(items) => {
                let parens = items.is_empty() || context > Prec::TUPLE;
                if parens {
                    self.output.push('(');
                }
                self.write_items(items);
                if items.len() == 1 {
                    self.output.push(',');
                }
                if parens {
                    self.output.push(')');
                }
            }

            Expr::Set(items) => {
                if items.is_empty() {
                    self.output.push_str("{*()}");
                } else {
                    self.output.push('{');
                    self.write_items(items);
                    self.output.push('}');
                }
            }

            Expr::BinOp(bin) => {
                let prec = Prec::of_operator(bin.op);
                let (left, right) = if bin.op == Operator::Pow {
                    (prec.next(), prec)
                } else {
                    (prec, prec.next())
                };
                self.parenthesized(prec < context, |w| {
                    w.write_expr(&bin.left, left);
                    w.output.push(' ');
                    w.output.push_str(bin.op.symbol());
                    w.output.push(' ');
                    w.write_expr(&bin.right, right);
                });
            }

            Expr::BoolOp(bool_op) => {
                let prec = Prec::of_bool_operator(bool_op.op);
                self.parenthesized(prec < context, |w| {
                    for (i, value) in bool_op.values.iter().enumerate() {
                        if i > 0 {
                            w.output.push(' ');
                            w.output.push_str(bool_op.op.keyword());
                            w.output.push(' ');
                        }
                        w.write_expr(value, prec.next());
                    }
                });
            }

            Expr::UnaryOp { op, operand } => {
                let prec = if *op == UnaryOperator::Not {
                    Prec::NOT
                } else {
                    Prec::FACTOR
                };
                self.parenthesized(prec < context, |w| {
                    w.output.push_str(op.symbol());
                    w.write_expr(operand, prec);
                });
            }

            Expr::Compare {
                left,
                ops,
                comparators,
            } => {
                self.parenthesized(Prec::CMP < context, |w| {
                    w.write_expr(left, Prec::CMP.next());
                    for (op, right) in ops.iter().zip(comparators) {
                        w.output.push(' ');
                        w.output.push_str(op.symbol());
                        w.output.push(' ');
                        w.write_expr(right, Prec::CMP.next());
                    }
                });
            }

            Expr::Call {
                func,
                args,
                keywords,
            } => {
                self.write_expr(func, Prec::ATOM);
                self.output.push('(');
                self.write_call_arguments(args, keywords);
                self.output.push(')');
            }

            Expr::Attribute { value, attr } => {
                self.write_expr(value, Prec::ATOM);
                self.output.push('.');
                self.output.push_str(attr);
            }

            Expr::Subscript { value, slice } => {
                self.write_expr(value, Prec::ATOM);
                self.output.push('[');
                match slice.as_ref() {
                    Expr::Tuple(items) if !items.is_empty() => {
                        self.write_items(items);
                        if items.len() == 1 {
                            self.output.push(',');
                        }
                    }
                    other => self.write_expr(other, Prec::TUPLE),
                }
                self.output.push(']');
            }

            Expr::Slice { lower, upper, step } => {
                if let Some(lower) = lower {
                    self.write_expr(lower, Prec::TEST);
                }
                self.output.push(':');
                if let Some(upper) = upper {
                    self.write_expr(upper, Prec::TEST);
                }
                if let Some(step) = step {
                    self.output.push(':');
                    self.write_expr(step, Prec::TEST);
                }
            }

            Expr::Starred(value) => {
                self.output.push('*');
                self.write_expr(value, Prec::EXPR);
            }

            Expr::IfExp { test, body, orelse } => {
                self.parenthesized(Prec::TEST < context, |w| {
                    w.write_expr(body, Prec::TEST.next());
                    w.output.push_str(" if ");
                    w.write_expr(test, Prec::TEST.next());
                    w.output.push_str(" else ");
                    w.write_expr(orelse, Prec::TEST);
                });
            }

            Expr::Lambda { args, body } => {
                self.parenthesized(Prec::TEST < context, |w| {
                    w.output.push_str("lambda");
                    if !args.is_empty() {
                        w.output.push(' ');
                        w.write_arguments(args, false);
                    }
                    w.output.push_str(": ");
                    w.write_expr(body, Prec::TEST);
                });
            }

            Expr::NamedExpr { target, value } => {
                self.parenthesized(Prec::NAMED_EXPR < context, |w| {
                    w.write_expr(target, Prec::ATOM);
                    w.output.push_str(" := ");
                    w.write_expr(value, Prec::ATOM);
                });
            }

            Expr::Await(value) => {
                self.parenthesized(Prec::AWAIT < context, |w| {
                    w.output.push_str("await ");
                    w.write_expr(value, Prec::ATOM);
                });
            }

            Expr::Other { source, .. } => self.output.push_str(source),
        }
    }

    fn parenthesized(&mut self, parens: bool, body: impl FnOnce(&mut Self)) {
        if parens {
            self.output.push('(');
        }
        body(self);
        if parens {
            self.output.push(')');
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_str() {
        assert_eq!(quote_str("hello"), "'hello'");
        assert_eq!(quote_str("it's"), "\"it's\"");
        assert_eq!(quote_str("both ' and \""), "'both \\' and \"'");
        assert_eq!(quote_str("line\nbreak"), "'line\\nbreak'");
    }

    #[test]
    fn test_float_repr() {
        assert_eq!(float_repr(1.0), "1.0");
        assert_eq!(float_repr(1.5), "1.5");
        assert_eq!(float_repr(0.1), "0.1");
        assert_eq!(float_repr(-2.25), "-2.25");
        assert_eq!(float_repr(1e16), "1e+16");
        assert_eq!(float_repr(1e15), "1000000000000000.0");
        assert_eq!(float_repr(0.0001), "0.0001");
        assert_eq!(float_repr(0.00001), "1e-05");
        assert_eq!(float_repr(1.5e-7), "1.5e-07");
        assert_eq!(imaginary_repr(2.0), "2");
        assert_eq!(imaginary_repr(0.5), "0.5");
    }

    #[test]
    fn test_call_with_keywords() {
        let expr = Expr::Call {
            func: Box::new(Expr::attribute(Expr::name("os"), "getenv")),
            args: vec![Expr::str("HOME")],
            keywords: vec![Keyword {
                arg: Some("default".into()),
                value: Expr::NoneLit,
            }],
        };
        assert_eq!(unparse_expr(&expr), "os.getenv('HOME', default=None)");
    }

    #[test]
    fn test_precedence_parentheses() {
        let sum = Expr::binary(Expr::int(1), Operator::Add, Expr::int(2));
        let product = Expr::binary(sum, Operator::Mult, Expr::int(3));
        assert_eq!(unparse_expr(&product), "(1 + 2) * 3");

        let power = Expr::binary(
            Expr::binary(Expr::int(2), Operator::Pow, Expr::int(3)),
            Operator::Pow,
            Expr::int(4),
        );
        assert_eq!(unparse_expr(&power), "(2 ** 3) ** 4");
    }

    #[test]
    fn test_tuples() {
        assert_eq!(unparse_expr(&Expr::Tuple(vec![])), "()");
        assert_eq!(unparse_expr(&Expr::Tuple(vec![Expr::int(1)])), "(1,)");
        let sub = Expr::subscript(
            Expr::name("Dict"),
            Expr::Tuple(vec![Expr::name("str"), Expr::name("int")]),
        );
        assert_eq!(unparse_expr(&sub), "Dict[str, int]");
    }

    #[test]
    fn test_dict_with_splat() {
        let expr = Expr::Dict {
            keys: vec![Some(Expr::str("a")), None],
            values: vec![Expr::int(1), Expr::name("rest")],
        };
        assert_eq!(unparse_expr(&expr), "{'a': 1, **rest}");
    }

    #[test]
    fn test_arguments() {
        let args = Arguments {
            posonlyargs: vec![Arg::new("a")],
            args: vec![Arg::annotated("b", Expr::name("int"))],
            vararg: None,
            kwonlyargs: vec![Arg::new("c")],
            kw_defaults: vec![Some(Expr::int(3))],
            kwarg: Some(Arg::new("kw")),
            defaults: vec![Expr::int(2)],
        };
        let func = Stmt::FunctionDef(FunctionDef {
            name: "f".into(),
            args,
            body: vec![Stmt::opaque(StmtKind::Pass, "pass")],
            decorators: vec![],
            returns: None,
            is_async: false,
        });
        assert_eq!(
            unparse_stmt(&func),
            "def f(a, /, b: int = 2, *, c=3, **kw):\n    pass"
        );
    }

    #[test]
    fn test_function_statement() {
        let func = Stmt::FunctionDef(FunctionDef {
            name: "f".into(),
            args: Arguments {
                args: vec![Arg::new("x")],
                ..Default::default()
            },
            body: vec![Stmt::opaque(StmtKind::Return, "return x")],
            decorators: vec![Expr::name("cache")],
            returns: None,
            is_async: true,
        });
        assert_eq!(unparse_stmt(&func), "@cache\nasync def f(x):\n    return x");
    }

    #[test]
    fn test_lambda_and_conditional() {
        let lambda = Expr::Lambda {
            args: Box::new(Arguments {
                args: vec![Arg::annotated("x", Expr::name("int"))],
                ..Default::default()
            }),
            body: Box::new(Expr::IfExp {
                test: Box::new(Expr::name("x")),
                body: Box::new(Expr::int(1)),
                orelse: Box::new(Expr::int(0)),
            }),
        };
        assert_eq!(unparse_expr(&lambda), "lambda x: 1 if x else 0");
    }
}
