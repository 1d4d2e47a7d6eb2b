//! Statement builder and compiler.
//!
//! A [`Statement`] is one SELECT, INSERT, UPDATE or DELETE. It is assembled
//! with chained calls and compiled against a [`Dialect`] into SQL text plus
//! the ordered parameter list matching its placeholders.
//!
//! ```rust
//! use oxide_query::{SqlExpr, SqlServerDialect, Statement, Table};
//!
//! let items = Table::new("ITEMS");
//! let name = items.column::<String>("NAME");
//! let price = items.column::<f64>("PRICE");
//!
//! let page = Statement::select()
//!     .add_select(&name)
//!     .add_select(&price)
//!     .from(&items)
//!     .order_by(&name)
//!     .order_descending(&price)
//!     .offset(20)
//!     .limit(10);
//!
//! assert_eq!(
//!     page.to_sql(&SqlServerDialect).unwrap(),
//!     "SELECT ITEMS.NAME, ITEMS.PRICE FROM ITEMS ORDER BY ITEMS.NAME, ITEMS.PRICE DESC \
//!      OFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"
//! );
//! ```

mod delete;
mod insert;
mod select;
mod update;

pub(crate) use insert::output_parameter;

use std::fmt;
use std::rc::Rc;

use crate::ast::{AliasSeq, Assignment, Constraint, Expr, QueryParam, RenderContext, SqlExpr, TableRef};
use crate::bound::{BoundValue, Slot};
use crate::dialect::Dialect;
use crate::error::{QueryError, Result};
use crate::value::{FromSqlValue, SqlType, SqlValue, ValueKind};

/// Statement kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    /// `SELECT`
    Select,
    /// `INSERT`
    Insert,
    /// `UPDATE`
    Update,
    /// `DELETE`
    Delete,
}

impl StatementKind {
    /// Returns the leading SQL keyword.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Select => "SELECT",
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

/// Compiled SQL with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledStatement {
    /// SQL text with dialect placeholders.
    pub sql: String,
    /// Parameters in placeholder order.
    pub params: Vec<QueryParam>,
}

type RowHook = Box<dyn FnMut(&SqlValue) -> Result<()>>;

/// An entry of the select list, or a returned column of an INSERT.
pub(crate) struct SelectItem {
    pub(crate) expr: Expr,
    pub(crate) kind: ValueKind,
    slot: Option<Rc<Slot>>,
    on_row: Option<RowHook>,
}

impl SelectItem {
    fn plain(expr: Expr, kind: ValueKind) -> Self {
        Self {
            expr,
            kind,
            slot: None,
            on_row: None,
        }
    }

    /// Stores a fetched value in the bound cell and runs the row hook.
    pub(crate) fn push(&mut self, value: SqlValue) -> Result<()> {
        if let Some(hook) = &mut self.on_row {
            hook(&value)?;
        }
        if let Some(slot) = &self.slot {
            slot.set(value);
        }
        Ok(())
    }

    pub(crate) const fn is_bound(&self) -> bool {
        self.slot.is_some() || self.on_row.is_some()
    }
}

impl fmt::Debug for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SelectItem")
            .field("expr", &self.expr)
            .field("kind", &self.kind)
            .field("bound", &self.is_bound())
            .finish()
    }
}

/// Sort direction entry of the ORDER BY list.
#[derive(Debug, Clone)]
pub(crate) struct OrderItem {
    pub(crate) expr: Expr,
    pub(crate) descending: bool,
}

/// A SQL statement under construction.
pub struct Statement {
    kind: StatementKind,
    source: Option<TableRef>,
    pub(crate) select: Vec<SelectItem>,
    constraint: Constraint,
    columns: Vec<Rc<str>>,
    rows: Vec<Vec<Option<Expr>>>,
    row: usize,
    order: Vec<OrderItem>,
    offset: u64,
    limit: u64,
    distinct: bool,
    aliases: AliasSeq,
}

impl fmt::Debug for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Statement")
            .field("kind", &self.kind)
            .field("source", &self.source)
            .field("select", &self.select)
            .field("constraint", &self.constraint)
            .field("columns", &self.columns)
            .field("rows", &self.rows.len())
            .field("order", &self.order)
            .field("offset", &self.offset)
            .field("limit", &self.limit)
            .field("distinct", &self.distinct)
            .finish_non_exhaustive()
    }
}

impl Statement {
    fn new(kind: StatementKind) -> Self {
        Self {
            kind,
            source: None,
            select: Vec::new(),
            constraint: Constraint::Empty,
            columns: Vec::new(),
            rows: Vec::new(),
            row: 0,
            order: Vec::new(),
            offset: 0,
            limit: 0,
            distinct: false,
            aliases: AliasSeq::default(),
        }
    }

    /// Starts a SELECT.
    #[must_use]
    pub fn select() -> Self {
        Self::new(StatementKind::Select)
    }

    /// Starts an INSERT.
    #[must_use]
    pub fn insert() -> Self {
        Self::new(StatementKind::Insert)
    }

    /// Starts an UPDATE.
    #[must_use]
    pub fn update() -> Self {
        Self::new(StatementKind::Update)
    }

    /// Starts a DELETE.
    #[must_use]
    pub fn delete() -> Self {
        Self::new(StatementKind::Delete)
    }

    /// Returns the statement kind.
    #[must_use]
    pub const fn kind(&self) -> StatementKind {
        self.kind
    }

    /// Sets the source table of a SELECT or DELETE.
    #[must_use]
    pub fn from(mut self, source: impl Into<TableRef>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Sets the target table of an INSERT or UPDATE.
    #[must_use]
    pub fn into(mut self, target: impl Into<TableRef>) -> Self {
        self.source = Some(target.into());
        self
    }

    /// Replaces the WHERE condition.
    #[must_use]
    pub fn where_(mut self, constraint: Constraint) -> Self {
        self.constraint = constraint;
        self
    }

    /// Adds a condition with AND.
    #[must_use]
    pub fn and_where(mut self, constraint: Constraint) -> Self {
        self.constraint = std::mem::take(&mut self.constraint).and(constraint);
        self
    }

    /// Adds a condition with OR.
    #[must_use]
    pub fn or_where(mut self, constraint: Constraint) -> Self {
        self.constraint = std::mem::take(&mut self.constraint).or(constraint);
        self
    }

    /// Returns the WHERE condition.
    #[must_use]
    pub const fn constraint(&self) -> &Constraint {
        &self.constraint
    }

    /// Adds an assignment to the current row.
    #[must_use]
    pub fn set(mut self, assignment: Assignment) -> Self {
        self.assign(assignment);
        self
    }

    /// Adds an assignment to the current row.
    ///
    /// Columns are matched by name, so assigning a column twice in the same
    /// row overwrites the earlier value.
    pub fn assign(&mut self, assignment: Assignment) {
        let (name, value) = assignment.into_parts();
        if self.row == self.rows.len() {
            self.rows.push(Vec::new());
        }

        let index = self
            .columns
            .iter()
            .position(|column| **column == *name)
            .unwrap_or_else(|| {
                self.columns.push(name);
                self.columns.len() - 1
            });

        let row = &mut self.rows[self.row];
        if row.len() <= index {
            row.resize(index + 1, None);
        }
        row[index] = Some(value);
    }

    /// Closes the current assignment row; the next assignment starts a new one.
    pub fn stage_row(&mut self) {
        if self.row < self.rows.len() {
            self.row += 1;
        }
    }

    /// Drops every staged assignment row.
    pub fn clear_stage(&mut self) {
        self.columns.clear();
        self.rows.clear();
        self.row = 0;
    }

    /// Returns the number of assignment rows.
    #[must_use]
    pub fn staged_rows(&self) -> usize {
        self.rows.len()
    }

    /// Appends an ascending sort key.
    #[must_use]
    pub fn order_by(mut self, expr: &impl SqlExpr) -> Self {
        self.order.push(OrderItem {
            expr: expr.as_expr(),
            descending: false,
        });
        self
    }

    /// Appends a descending sort key.
    #[must_use]
    pub fn order_descending(mut self, expr: &impl SqlExpr) -> Self {
        self.order.push(OrderItem {
            expr: expr.as_expr(),
            descending: true,
        });
        self
    }

    /// Skips `offset` rows; requires an ORDER BY.
    #[must_use]
    pub const fn offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    /// Returns at most `limit` rows; requires an ORDER BY. Zero means no limit.
    #[must_use]
    pub const fn limit(mut self, limit: u64) -> Self {
        self.limit = limit;
        self
    }

    /// Selects distinct rows.
    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Adds an expression to the select list without binding it.
    #[must_use]
    pub fn add_select<E: SqlExpr>(mut self, expr: &E) -> Self {
        self.select
            .push(SelectItem::plain(expr.as_expr(), <E::Value as SqlType>::KIND));
        self
    }

    /// Selects an expression and returns the cell receiving its values.
    ///
    /// On an INSERT the bound expressions are the generated columns to
    /// return.
    pub fn bind<E: SqlExpr>(&mut self, expr: &E) -> BoundValue<E::Value> {
        let (bound, slot) = BoundValue::new();
        let mut item = SelectItem::plain(expr.as_expr(), <E::Value as SqlType>::KIND);
        item.slot = Some(slot);
        self.select.push(item);
        bound
    }

    /// Selects an expression and calls `setter` with its value on every row.
    #[must_use]
    pub fn map<E, F>(mut self, expr: &E, setter: F) -> Self
    where
        E: SqlExpr,
        F: FnMut(E::Value) + 'static,
    {
        self.push_mapped(expr, setter);
        self
    }

    pub(crate) fn push_mapped<E, F>(&mut self, expr: &E, mut setter: F)
    where
        E: SqlExpr,
        F: FnMut(E::Value) + 'static,
    {
        let mut item = SelectItem::plain(expr.as_expr(), <E::Value as SqlType>::KIND);
        item.on_row = Some(Box::new(move |value| {
            setter(<E::Value as FromSqlValue>::from_sql_value(value)?);
            Ok(())
        }));
        self.select.push(item);
    }

    pub(crate) const fn aliases(&self) -> &AliasSeq {
        &self.aliases
    }

    /// Compiles into SQL text and parameters.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the statement is incomplete or
    /// uses something the dialect cannot express.
    pub fn compile(&self, dialect: &dyn Dialect) -> Result<CompiledStatement> {
        let mut params = Vec::new();
        let sql = self.render(&mut RenderContext::new(dialect, Some(&mut params), &self.aliases))?;
        Ok(CompiledStatement { sql, params })
    }

    /// Compiles with every value inlined, for logging and tests.
    ///
    /// # Errors
    ///
    /// See [`Statement::compile`].
    pub fn to_sql(&self, dialect: &dyn Dialect) -> Result<String> {
        self.render(&mut RenderContext::new(dialect, None, &self.aliases))
    }

    pub(crate) fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        match self.kind {
            StatementKind::Select => self.render_select(ctx),
            StatementKind::Insert => self.render_insert(ctx),
            StatementKind::Update => self.render_update(ctx),
            StatementKind::Delete => self.render_delete(ctx),
        }
    }

    fn source(&self) -> Result<&TableRef> {
        self.source
            .as_ref()
            .ok_or(QueryError::MissingTable(self.kind.as_str()))
    }

    fn render_where(&self, sql: &mut String, ctx: &mut RenderContext<'_>) -> Result<()> {
        let condition = self.constraint.render(ctx)?;
        if !condition.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&condition);
        }
        Ok(())
    }

    fn reject_returning(&self) -> Result<()> {
        if self.select.is_empty() {
            Ok(())
        } else {
            Err(QueryError::ReturningOnlyForInsert(self.kind.as_str()))
        }
    }
}
