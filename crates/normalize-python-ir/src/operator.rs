//! Operator serialization: binary and boolean operations to source text.
//!
//! Operands go through the literal resolver first, so `x + 'a'` renders its
//! string operand as `'a'` and a nested list as its sequence form. Nested
//! operations are parenthesized only when Python precedence requires it.

use crate::ast::{BinOp, BoolOp, Expr};
use crate::error::NormalizeError;
use crate::literal;
use crate::unparse::{bin_operand_needs_parens, bool_operand_needs_parens};

/// Serialize a binary or boolean operation.
///
/// Any other node is outside this component's contract and is reported as an
/// [`NormalizeError::InvariantViolation`].
pub fn serialize(expr: &Expr) -> Result<String, NormalizeError> {
    match expr {
        Expr::BinOp(bin) => Ok(serialize_bin_op(bin)),
        Expr::BoolOp(bool_op) => Ok(serialize_bool_op(bool_op)),
        other => Err(NormalizeError::InvariantViolation {
            expected: "binary or boolean operation",
            got: other.kind_name().to_string(),
        }),
    }
}

/// `left op right`, single spaces around the operator.
pub fn serialize_bin_op(bin: &BinOp) -> String {
    let left = operand(&bin.left, bin_operand_needs_parens(&bin.left, bin.op, false));
    let right = operand(&bin.right, bin_operand_needs_parens(&bin.right, bin.op, true));
    format!("{left} {} {right}", bin.op.symbol())
}

/// Operands joined by ` and ` or ` or `.
pub fn serialize_bool_op(bool_op: &BoolOp) -> String {
    let separator = format!(" {} ", bool_op.op.keyword());
    bool_op
        .values
        .iter()
        .map(|value| operand(value, bool_operand_needs_parens(value, bool_op.op)))
        .collect::<Vec<_>>()
        .join(&separator)
}

fn operand(expr: &Expr, parenthesize: bool) -> String {
    let text = literal::resolve(expr).to_string();
    if parenthesize {
        format!("({text})")
    } else {
        text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BoolOperator, Operator};

    #[test]
    fn test_binary() {
        let product = Expr::binary(Expr::int(3), Operator::Mult, Expr::int(4));
        assert_eq!(serialize(&product).unwrap(), "3 * 4");
    }

    #[test]
    fn test_boolean_chain() {
        let chain = Expr::boolean(
            BoolOperator::And,
            vec![Expr::name("a"), Expr::name("b"), Expr::name("c")],
        );
        assert_eq!(serialize(&chain).unwrap(), "a and b and c");
    }

    #[test]
    fn test_operands_use_literal_form() {
        let concat = Expr::binary(Expr::name("prefix"), Operator::Add, Expr::str("_x"));
        assert_eq!(serialize(&concat).unwrap(), "prefix + '_x'");

        let repeat = Expr::binary(
            Expr::List(vec![Expr::int(0)]),
            Operator::Mult,
            Expr::name("n"),
        );
        assert_eq!(serialize(&repeat).unwrap(), "[0] * n");
    }

    #[test]
    fn test_nested_operations_keep_grouping() {
        let sum = Expr::binary(Expr::name("a"), Operator::Add, Expr::name("b"));
        let grouped = Expr::binary(sum.clone(), Operator::Mult, Expr::name("c"));
        assert_eq!(serialize(&grouped).unwrap(), "(a + b) * c");

        let left_assoc = Expr::binary(sum.clone(), Operator::Sub, Expr::name("c"));
        assert_eq!(serialize(&left_assoc).unwrap(), "a + b - c");

        let right_nested = Expr::binary(Expr::name("c"), Operator::Sub, sum);
        assert_eq!(serialize(&right_nested).unwrap(), "c - (a + b)");
    }

    #[test]
    fn test_power_is_right_associative() {
        let inner = Expr::binary(Expr::int(2), Operator::Pow, Expr::int(3));
        let right = Expr::binary(Expr::int(2), Operator::Pow, inner.clone());
        assert_eq!(serialize(&right).unwrap(), "2 ** 2 ** 3");
        let left = Expr::binary(inner, Operator::Pow, Expr::int(2));
        assert_eq!(serialize(&left).unwrap(), "(2 ** 3) ** 2");
    }

    #[test]
    fn test_or_inside_and_is_parenthesized() {
        let either = Expr::boolean(BoolOperator::Or, vec![Expr::name("a"), Expr::name("b")]);
        let both = Expr::boolean(BoolOperator::And, vec![either, Expr::name("c")]);
        assert_eq!(serialize(&both).unwrap(), "(a or b) and c");
    }

    #[test]
    fn test_non_operation_is_invariant_violation() {
        let err = serialize(&Expr::name("x")).unwrap_err();
        assert_eq!(
            err,
            NormalizeError::InvariantViolation {
                expected: "binary or boolean operation",
                got: "Name".to_string(),
            }
        );
    }
}
