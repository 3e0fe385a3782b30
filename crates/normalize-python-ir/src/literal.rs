//! Literal resolution: expression to [`LiteralValue`].

use crate::ast::{Expr, Num};
use crate::error::NormalizeError;
use crate::ir::{LiteralValue, Number};
use crate::operator;
use crate::unparse::unparse_expr;

/// Resolve an expression to a literal value.
///
/// Never fails: anything without a structured form, including malformed
/// literals, comes back as [`LiteralValue::Raw`] source text.
pub fn resolve(expr: &Expr) -> LiteralValue {
    try_resolve(expr).unwrap_or_else(|_| LiteralValue::Raw(unparse_expr(expr)))
}

/// Like [`resolve`], but reports a malformed literal instead of degrading it.
///
/// Only the outermost malformed node is reported; a malformed literal nested
/// inside a well-formed one still degrades to raw text in place.
pub fn try_resolve(expr: &Expr) -> Result<LiteralValue, NormalizeError> {
    Ok(match expr {
        Expr::Name(id) => LiteralValue::Reference(id.clone()),
        Expr::Str(s) => LiteralValue::String(s.clone()),
        Expr::Num(num) => LiteralValue::Number(number(*num)),
        Expr::Dict { keys, values } => resolve_mapping(keys, values)?,
        Expr::Tuple(items) | Expr::List(items) => {
            LiteralValue::Sequence(items.iter().map(resolve).collect())
        }
        Expr::BinOp(bin) => LiteralValue::Raw(operator::serialize_bin_op(bin)),
        Expr::BoolOp(bool_op) => LiteralValue::Raw(operator::serialize_bool_op(bool_op)),
        Expr::Call { .. } => LiteralValue::Raw(unparse_expr(expr)),
        Expr::Bytes(_)
        | Expr::FormattedStr(_)
        | Expr::Bool(_)
        | Expr::NoneLit
        | Expr::Ellipsis
        | Expr::Set(_)
        | Expr::UnaryOp { .. }
        | Expr::Compare { .. }
        | Expr::Attribute { .. }
        | Expr::Subscript { .. }
        | Expr::Slice { .. }
        | Expr::Starred(_)
        | Expr::IfExp { .. }
        | Expr::Lambda { .. }
        | Expr::NamedExpr { .. }
        | Expr::Await(_)
        | Expr::Other { .. } => LiteralValue::Raw(unparse_expr(expr)),
    })
}

fn number(num: Num) -> Number {
    match num {
        Num::Int(n) => Number::Int(n),
        Num::Float(x) => Number::Float(x),
        Num::Imaginary(imag) => Number::Complex { real: 0.0, imag },
    }
}

fn resolve_mapping(keys: &[Option<Expr>], values: &[Expr]) -> Result<LiteralValue, NormalizeError> {
    if keys.len() != values.len() {
        return Err(NormalizeError::MalformedLiteral {
            node: "dict",
            reason: format!("{} keys but {} values", keys.len(), values.len()),
        });
    }

    let mut pairs = Vec::with_capacity(keys.len());
    for (key, value) in keys.iter().zip(values) {
        let Some(key) = key else {
            return Err(NormalizeError::MalformedLiteral {
                node: "dict",
                reason: "`**` unpacking has no literal key".to_string(),
            });
        };
        pairs.push((resolve(key), resolve(value)));
    }
    Ok(LiteralValue::mapping(pairs))
}
