//! Constant folding over additive expression chains.
//!
//! Folding is a pure tree rewrite: it produces new nodes and never mutates
//! the input. An addition whose leaves are all numeric literals collapses to
//! a single literal; anything else rebuilds the maximally folded structure
//! with unfoldable subtrees intact.

use crate::ast::{BinaryExpression, BinaryOperator, Expression, Literal};

/// Outcome of folding a subtree.
#[derive(Debug, Clone, PartialEq)]
pub(super) enum Folded {
    /// The subtree collapsed to one numeric literal.
    Literal(f64),
    /// The subtree could not fully collapse; folded where possible.
    Composite(Expression),
}

impl Folded {
    fn into_expression(self) -> Expression {
        match self {
            Folded::Literal(value) => Expression::Literal(Literal::Number(value)),
            Folded::Composite(expr) => expr,
        }
    }
}

/// Folds one addition node.
///
/// A rebuilt node carries its folded operands in swapped slots: the folded
/// right operand lands in the left slot and vice versa. Emission walks the
/// right slot first, so the pair preserves the operand order the compiled
/// output is contracted to (`x + 1` pushes the argument before the literal).
pub(super) fn fold_addition(bin: &BinaryExpression) -> Folded {
    let right = fold_expression(&bin.right);
    let left = fold_expression(&bin.left);
    match (left, right) {
        (Folded::Literal(a), Folded::Literal(b)) => Folded::Literal(a + b),
        (left, right) => Folded::Composite(Expression::Binary(BinaryExpression {
            operator: BinaryOperator::Add,
            left: Box::new(right.into_expression()),
            right: Box::new(left.into_expression()),
        })),
    }
}

/// Folds an arbitrary expression: unwraps parentheses, recurses into
/// additions, passes everything else through unchanged.
pub(super) fn fold_expression(expr: &Expression) -> Folded {
    match expr {
        Expression::Grouping(inner) => fold_expression(inner),
        Expression::Binary(bin) if bin.operator == BinaryOperator::Add => fold_addition(bin),
        Expression::Literal(Literal::Number(value)) => Folded::Literal(*value),
        other => Folded::Composite(other.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{IdentifierReference, Variable};

    fn num(value: f64) -> Expression {
        Expression::Literal(Literal::Number(value))
    }

    fn global(name: &str) -> Expression {
        Expression::Identifier(IdentifierReference {
            name: name.to_string(),
            variable: Variable::Global,
        })
    }

    fn add(left: Expression, right: Expression) -> BinaryExpression {
        BinaryExpression {
            operator: BinaryOperator::Add,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    #[test]
    fn test_literal_pair_collapses() {
        assert_eq!(fold_addition(&add(num(1.0), num(2.0))), Folded::Literal(3.0));
    }

    #[test]
    fn test_nested_literal_chain_collapses() {
        let chain = add(Expression::Binary(add(num(1.0), num(2.0))), num(3.0));
        assert_eq!(fold_addition(&chain), Folded::Literal(6.0));
    }

    #[test]
    fn test_parentheses_are_unwrapped() {
        let grouped = add(
            Expression::Grouping(Box::new(Expression::Binary(add(num(1.0), num(2.0))))),
            num(4.0),
        );
        assert_eq!(fold_addition(&grouped), Folded::Literal(7.0));
    }

    #[test]
    fn test_rebuilt_node_swaps_operands() {
        let folded = fold_addition(&add(global("x"), num(1.0)));
        let Folded::Composite(Expression::Binary(rebuilt)) = folded else {
            panic!("expected a rebuilt addition");
        };
        // Folded right operand in the left slot, folded left in the right.
        assert_eq!(*rebuilt.left, num(1.0));
        assert_eq!(*rebuilt.right, global("x"));
    }

    #[test]
    fn test_no_literal_is_lost_in_partial_fold() {
        // x + (1 + 2): the literal side still collapses to 3.
        let partial = add(
            global("x"),
            Expression::Grouping(Box::new(Expression::Binary(add(num(1.0), num(2.0))))),
        );
        let Folded::Composite(Expression::Binary(rebuilt)) = fold_addition(&partial) else {
            panic!("expected a rebuilt addition");
        };
        assert_eq!(*rebuilt.left, num(3.0));
        assert_eq!(*rebuilt.right, global("x"));
    }

    #[test]
    fn test_non_additive_node_passes_through() {
        let expr = global("y");
        assert_eq!(fold_expression(&expr), Folded::Composite(expr.clone()));
    }
}
