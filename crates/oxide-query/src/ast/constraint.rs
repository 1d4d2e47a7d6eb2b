//! Boolean constraints over expressions.

use std::fmt;

use super::expr::Expr;
use super::RenderContext;
use crate::error::Result;

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `=`
    Eq,
    /// `<>`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IN`
    In,
    /// `NOT IN`
    NotIn,
    /// `BETWEEN`
    Between,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
}

impl CompareOp {
    /// Returns the SQL token.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::In => "IN",
            Self::NotIn => "NOT IN",
            Self::Between => "BETWEEN",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logical connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Logic {
    /// `AND`
    And,
    /// `OR`
    Or,
}

impl Logic {
    const fn as_str(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// A WHERE/ON condition.
///
/// The empty constraint is the identity of both [`Constraint::and`] and
/// [`Constraint::or`].
#[derive(Debug, Clone, Default)]
pub enum Constraint {
    /// No condition.
    #[default]
    Empty,
    /// `(left op right)`; postfix operators have no right side.
    Compare {
        /// Left operand.
        left: Expr,
        /// Operator.
        op: CompareOp,
        /// Right operand.
        right: Option<Expr>,
    },
    /// `(left AND right)` or `(left OR right)`.
    Combine {
        /// Connective.
        logic: Logic,
        /// Left subtree.
        left: Box<Constraint>,
        /// Right subtree.
        right: Box<Constraint>,
    },
}

impl Constraint {
    /// Creates a binary comparison.
    #[must_use]
    pub const fn compare(left: Expr, op: CompareOp, right: Expr) -> Self {
        Self::Compare {
            left,
            op,
            right: Some(right),
        }
    }

    /// Creates a postfix test such as `IS NULL`.
    #[must_use]
    pub const fn postfix(left: Expr, op: CompareOp) -> Self {
        Self::Compare {
            left,
            op,
            right: None,
        }
    }

    /// Returns true for the empty constraint.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Combines with AND.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        self.combine(Logic::And, other)
    }

    /// Combines with OR.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        self.combine(Logic::Or, other)
    }

    fn combine(self, logic: Logic, other: Self) -> Self {
        match (self, other) {
            (Self::Empty, other) => other,
            (this, Self::Empty) => this,
            (left, right) => Self::Combine {
                logic,
                left: Box::new(left),
                right: Box::new(right),
            },
        }
    }

    /// Renders the constraint; the empty constraint renders as an empty string.
    ///
    /// A comparison whose right side renders as `NULL` is rewritten to
    /// `IS NULL` / `IS NOT NULL`.
    ///
    /// # Errors
    ///
    /// Propagates rendering errors of the operands.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        match self {
            Self::Empty => Ok(String::new()),
            Self::Compare { left, op, right } => {
                let left = left.render(ctx)?;
                let Some(right) = right else {
                    return Ok(format!("({left} {op})"));
                };
                let right = right.render(ctx)?;
                let op = match (op, right.as_str()) {
                    (CompareOp::Eq, "NULL") => "IS",
                    (CompareOp::Ne, "NULL") => "IS NOT",
                    (op, _) => op.as_str(),
                };
                Ok(format!("({left} {op} {right})"))
            }
            Self::Combine { logic, left, right } => {
                let left = left.render(ctx)?;
                let right = right.render(ctx)?;
                Ok(match (left.is_empty(), right.is_empty()) {
                    (true, _) => right,
                    (_, true) => left,
                    _ => format!("({left} {} {right})", logic.as_str()),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::AliasSeq;
    use crate::dialect::SqliteDialect;
    use crate::value::SqlValue;

    fn sql(constraint: &Constraint) -> String {
        let aliases = AliasSeq::default();
        constraint
            .render(&mut RenderContext::new(&SqliteDialect, None, &aliases))
            .unwrap()
    }

    fn leaf(n: i64) -> Constraint {
        Constraint::compare(Expr::literal(n), CompareOp::Lt, Expr::literal(10_i64))
    }

    #[test]
    fn test_empty_is_identity() {
        for combined in [
            leaf(1).and(Constraint::Empty),
            Constraint::Empty.and(leaf(1)),
            leaf(1).or(Constraint::Empty),
            Constraint::Empty.or(leaf(1)),
        ] {
            assert_eq!(sql(&combined), sql(&leaf(1)));
        }
        assert!(Constraint::Empty.and(Constraint::Empty).is_empty());
    }

    #[test]
    fn test_nesting_is_parenthesized() {
        let c = leaf(1).and(leaf(2)).or(leaf(3));
        assert_eq!(sql(&c), "(((1 < 10) AND (2 < 10)) OR (3 < 10))");
    }

    #[test]
    fn test_null_comparison_rewrite() {
        let eq = Constraint::compare(Expr::literal(1_i64), CompareOp::Eq, Expr::Literal(SqlValue::Null));
        let ne = Constraint::compare(Expr::literal(1_i64), CompareOp::Ne, Expr::Literal(SqlValue::Null));
        assert_eq!(sql(&eq), "(1 IS NULL)");
        assert_eq!(sql(&ne), "(1 IS NOT NULL)");
    }

    #[test]
    fn test_postfix() {
        let c = Constraint::postfix(Expr::literal(1_i64), CompareOp::IsNotNull);
        assert_eq!(sql(&c), "(1 IS NOT NULL)");
    }
}
