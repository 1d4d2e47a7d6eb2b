//! Typed columns and expressions.
//!
//! Comparisons, arithmetic and aggregates are named methods of [`SqlExpr`],
//! which is implemented by table columns and computed expressions alike:
//!
//! ```rust
//! use oxide_query::{SqlExpr, SqliteDialect, Statement, Table};
//!
//! let users = Table::new("USERS");
//! let id = users.column::<i64>("ID");
//! let name = users.column::<String>("NAME");
//!
//! let query = Statement::select()
//!     .add_select(&name)
//!     .from(&users)
//!     .where_(id.gt(10_i64).and(name.like("A%")));
//!
//! let compiled = query.compile(&SqliteDialect).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT USERS.NAME FROM USERS WHERE ((USERS.ID > 10) AND (USERS.NAME LIKE :ph00))"
//! );
//! ```

use std::borrow::Cow;
use std::marker::PhantomData;
use std::rc::Rc;

use super::constraint::{CompareOp, Constraint};
use super::expr::{Computed, Conditional, Expr, Function};
use crate::builder::Statement;
use crate::error::{QueryError, Result};
use crate::value::{SqlType, SqlValue, ToSqlValue};

/// Untyped column of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnRef {
    table: Option<Rc<str>>,
    name: Rc<str>,
    size: usize,
    scale: usize,
    alias: Option<Rc<str>>,
}

impl ColumnRef {
    /// Returns the bare column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the owning table's name.
    #[must_use]
    pub fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }

    /// Returns the select alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns `TABLE.NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnqualifiedColumn`] when the column has no table.
    pub fn qualified_name(&self) -> Result<String> {
        match &self.table {
            Some(table) => Ok(format!("{table}.{}", self.name)),
            None => Err(QueryError::UnqualifiedColumn(self.name.to_string())),
        }
    }
}

/// A table column holding values of type `T`.
#[derive(Debug)]
pub struct Column<T> {
    column: ColumnRef,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            column: self.column.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: SqlType> Column<T> {
    pub(crate) fn new(table: Option<Rc<str>>, name: &str, size: usize, scale: usize) -> Self {
        Self {
            column: ColumnRef {
                table,
                name: Rc::from(name),
                size,
                scale,
                alias: None,
            },
            _type: PhantomData,
        }
    }

    /// Creates a column without a table; it cannot be rendered.
    #[must_use]
    pub fn detached(name: &str) -> Self {
        Self::new(None, name, 0, 0)
    }

    /// Returns a copy selected under `alias`.
    #[must_use]
    pub fn alias(&self, alias: &str) -> Self {
        let mut column = self.clone();
        column.column.alias = Some(Rc::from(alias));
        column
    }

    /// Returns the bare column name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.column.name()
    }

    /// Returns the declared length, `0` when unbounded.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.column.size
    }

    /// Returns the declared scale.
    #[must_use]
    pub const fn scale(&self) -> usize {
        self.column.scale
    }

    /// Returns `TABLE.NAME`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::UnqualifiedColumn`] when the column has no table.
    pub fn qualified_name(&self) -> Result<String> {
        self.column.qualified_name()
    }

    /// Trims `text` and cuts it to the declared length.
    #[must_use]
    pub fn adjust(&self, text: &str) -> String {
        let trimmed = text.trim();
        match self.column.size {
            0 => trimmed.to_string(),
            size => trimmed.chars().take(size).collect(),
        }
    }

    /// Assigns a value or expression.
    #[must_use]
    pub fn to(&self, value: impl Operand<T>) -> Assignment {
        Assignment {
            column: self.column.clone(),
            value: value.into_operand(),
        }
    }

    /// Assigns NULL.
    #[must_use]
    pub fn to_null(&self) -> Assignment {
        self.to_expr(Expr::Literal(SqlValue::Null))
    }

    /// Assigns an untyped expression.
    #[must_use]
    pub fn to_expr(&self, value: Expr) -> Assignment {
        Assignment {
            column: self.column.clone(),
            value,
        }
    }
}

/// A computed expression producing values of type `T`.
#[derive(Debug)]
pub struct Expression<T> {
    expr: Expr,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for Expression<T> {
    fn clone(&self) -> Self {
        Self {
            expr: self.expr.clone(),
            _type: PhantomData,
        }
    }
}

impl<T: SqlType> Expression<T> {
    /// Wraps an untyped expression.
    #[must_use]
    pub const fn new(expr: Expr) -> Self {
        Self {
            expr,
            _type: PhantomData,
        }
    }

    /// Returns a copy selected under `alias`.
    ///
    /// Literals, lists and sub-queries carry no alias and are returned
    /// unchanged.
    #[must_use]
    pub fn alias(&self, alias: &str) -> Self {
        let expr = match &self.expr {
            Expr::Computed(computed) => Expr::Computed(Rc::new(computed.with_alias(alias))),
            Expr::Conditional(conditional) => Expr::Conditional(Rc::new(conditional.with_alias(alias))),
            Expr::Column(column) => {
                let mut column = column.clone();
                column.alias = Some(Rc::from(alias));
                Expr::Column(column)
            }
            other => other.clone(),
        };
        Self::new(expr)
    }
}

/// An assignment `column = value` used by INSERT and UPDATE.
#[derive(Debug, Clone)]
pub struct Assignment {
    column: ColumnRef,
    value: Expr,
}

impl Assignment {
    /// Returns the target column name.
    #[must_use]
    pub fn column_name(&self) -> &str {
        self.column.name()
    }

    pub(crate) fn into_parts(self) -> (Rc<str>, Expr) {
        (self.column.name, self.value)
    }
}

/// Anything usable as the right-hand side of an operation on a `T` column.
pub trait Operand<T> {
    /// Converts into an expression.
    fn into_operand(self) -> Expr;
}

impl<T: SqlType> Operand<T> for T {
    fn into_operand(self) -> Expr {
        Expr::Literal(self.to_sql_value())
    }
}

impl<T: SqlType> Operand<T> for Option<T> {
    fn into_operand(self) -> Expr {
        Expr::Literal(self.to_sql_value())
    }
}

impl Operand<String> for &str {
    fn into_operand(self) -> Expr {
        Expr::Literal(self.to_sql_value())
    }
}

impl<T> Operand<T> for &Column<T> {
    fn into_operand(self) -> Expr {
        Expr::Column(self.column.clone())
    }
}

impl<T> Operand<T> for Column<T> {
    fn into_operand(self) -> Expr {
        Expr::Column(self.column)
    }
}

impl<T> Operand<T> for &Expression<T> {
    fn into_operand(self) -> Expr {
        self.expr.clone()
    }
}

impl<T> Operand<T> for Expression<T> {
    fn into_operand(self) -> Expr {
        self.expr
    }
}

impl<T> Operand<T> for Statement {
    fn into_operand(self) -> Expr {
        Expr::SubQuery(Rc::new(self))
    }
}

/// Operations shared by typed columns and typed expressions.
pub trait SqlExpr {
    /// Value type of the expression.
    type Value: SqlType;

    /// Returns the untyped expression.
    fn as_expr(&self) -> Expr;

    /// `self = rhs`, rendered `IS NULL` when `rhs` is NULL.
    fn eq(&self, rhs: impl Operand<Self::Value>) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Eq, rhs.into_operand())
    }

    /// `self <> rhs`, rendered `IS NOT NULL` when `rhs` is NULL.
    fn ne(&self, rhs: impl Operand<Self::Value>) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Ne, rhs.into_operand())
    }

    /// `self < rhs`
    fn lt(&self, rhs: impl Operand<Self::Value>) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Lt, rhs.into_operand())
    }

    /// `self <= rhs`
    fn le(&self, rhs: impl Operand<Self::Value>) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Le, rhs.into_operand())
    }

    /// `self > rhs`
    fn gt(&self, rhs: impl Operand<Self::Value>) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Gt, rhs.into_operand())
    }

    /// `self >= rhs`
    fn ge(&self, rhs: impl Operand<Self::Value>) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Ge, rhs.into_operand())
    }

    /// `self BETWEEN low AND high`
    fn between(&self, low: impl Operand<Self::Value>, high: impl Operand<Self::Value>) -> Constraint {
        let range = Expr::function("{0} AND {1}", vec![low.into_operand(), high.into_operand()]);
        Constraint::compare(self.as_expr(), CompareOp::Between, range)
    }

    /// `self LIKE pattern`
    fn like(&self, pattern: &str) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::Like, Expr::literal(pattern))
    }

    /// `self NOT LIKE pattern`
    fn not_like(&self, pattern: &str) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::NotLike, Expr::literal(pattern))
    }

    /// `self IN (v1, v2, ...)` with the values inlined.
    fn in_list<I>(&self, values: I) -> Constraint
    where
        I: IntoIterator,
        I::Item: ToSqlValue,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        Constraint::compare(self.as_expr(), CompareOp::In, Expr::List(values))
    }

    /// `self NOT IN (v1, v2, ...)` with the values inlined.
    fn not_in_list<I>(&self, values: I) -> Constraint
    where
        I: IntoIterator,
        I::Item: ToSqlValue,
    {
        let values = values.into_iter().map(ToSqlValue::to_sql_value).collect();
        Constraint::compare(self.as_expr(), CompareOp::NotIn, Expr::List(values))
    }

    /// `self IN (SELECT ...)`
    fn in_query(&self, query: Statement) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::In, Expr::SubQuery(Rc::new(query)))
    }

    /// `self NOT IN (SELECT ...)`
    fn not_in_query(&self, query: Statement) -> Constraint {
        Constraint::compare(self.as_expr(), CompareOp::NotIn, Expr::SubQuery(Rc::new(query)))
    }

    /// `self IS NULL`
    fn is_null(&self) -> Constraint {
        Constraint::postfix(self.as_expr(), CompareOp::IsNull)
    }

    /// `self IS NOT NULL`
    fn is_not_null(&self) -> Constraint {
        Constraint::postfix(self.as_expr(), CompareOp::IsNotNull)
    }

    /// `MAX(self)`
    fn max(&self) -> Expression<Self::Value> {
        aggregate("MAX({0})", self.as_expr())
    }

    /// `MIN(self)`
    fn min(&self) -> Expression<Self::Value> {
        aggregate("MIN({0})", self.as_expr())
    }

    /// `SUM(self)`
    fn sum(&self) -> Expression<Self::Value> {
        aggregate("SUM({0})", self.as_expr())
    }

    /// `AVG(self)`
    fn avg(&self) -> Expression<f64> {
        aggregate("AVG({0})", self.as_expr())
    }

    /// `COUNT(self)`
    fn count(&self) -> Expression<i64> {
        aggregate("COUNT({0})", self.as_expr())
    }

    /// `(self + rhs)`
    fn add(&self, rhs: impl Operand<Self::Value>) -> Expression<Self::Value> {
        binary("({0} + {1})", self.as_expr(), rhs.into_operand())
    }

    /// `(self - rhs)`
    fn sub(&self, rhs: impl Operand<Self::Value>) -> Expression<Self::Value> {
        binary("({0} - {1})", self.as_expr(), rhs.into_operand())
    }

    /// `(self * rhs)`
    fn mul(&self, rhs: impl Operand<Self::Value>) -> Expression<Self::Value> {
        binary("({0} * {1})", self.as_expr(), rhs.into_operand())
    }

    /// `(self / rhs)`
    fn div(&self, rhs: impl Operand<Self::Value>) -> Expression<Self::Value> {
        binary("({0} / {1})", self.as_expr(), rhs.into_operand())
    }

    /// `COALESCE(self, rhs)`
    fn coalesce(&self, rhs: impl Operand<Self::Value>) -> Expression<Self::Value> {
        binary("COALESCE({0}, {1})", self.as_expr(), rhs.into_operand())
    }

    /// String concatenation.
    fn concat(&self, rhs: impl Operand<String>) -> Expression<String> {
        Expression::new(Expr::Computed(Rc::new(Computed::new(
            Function::Concat,
            vec![self.as_expr(), rhs.into_operand()],
            false,
        ))))
    }

    /// `LOWER(self)`
    fn lower(&self) -> Expression<String> {
        function("LOWER({0})", vec![self.as_expr()])
    }

    /// `UPPER(self)`
    fn upper(&self) -> Expression<String> {
        function("UPPER({0})", vec![self.as_expr()])
    }
}

fn function<T: SqlType>(template: &'static str, args: Vec<Expr>) -> Expression<T> {
    Expression::new(Expr::function(Cow::Borrowed(template), args))
}

fn binary<T: SqlType>(template: &'static str, left: Expr, right: Expr) -> Expression<T> {
    function(template, vec![left, right])
}

fn aggregate<T: SqlType>(template: &'static str, arg: Expr) -> Expression<T> {
    Expression::new(Expr::aggregate(Cow::Borrowed(template), vec![arg]))
}

/// `CASE WHEN when THEN then [ELSE otherwise] END`.
///
/// The ELSE branch is left out when `otherwise` is NULL.
#[must_use]
pub fn case_when<T: SqlType>(
    when: Constraint,
    then: impl Operand<T>,
    otherwise: impl Operand<T>,
) -> Expression<T> {
    let otherwise = match otherwise.into_operand() {
        Expr::Literal(SqlValue::Null) => None,
        expr => Some(expr),
    };
    Expression::new(Expr::Conditional(Rc::new(Conditional::new(
        when,
        then.into_operand(),
        otherwise,
    ))))
}

impl<T: SqlType> SqlExpr for Column<T> {
    type Value = T;

    fn as_expr(&self) -> Expr {
        Expr::Column(self.column.clone())
    }
}

impl<T: SqlType> SqlExpr for Expression<T> {
    type Value = T;

    fn as_expr(&self) -> Expr {
        self.expr.clone()
    }
}
