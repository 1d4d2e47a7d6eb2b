//! Table references: plain tables, joins and inline sub-queries.

use std::fmt;
use std::rc::Rc;

use super::column::Column;
use super::constraint::Constraint;
use super::RenderContext;
use crate::builder::Statement;
use crate::error::{QueryError, Result};
use crate::value::SqlType;

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    /// `INNER JOIN`
    Inner,
    /// `LEFT OUTER JOIN`
    Left,
    /// `RIGHT OUTER JOIN`
    Right,
    /// `FULL OUTER JOIN`
    Full,
}

impl JoinKind {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT OUTER JOIN",
            Self::Right => "RIGHT OUTER JOIN",
            Self::Full => "FULL OUTER JOIN",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A database table.
///
/// Columns created from a table only remember its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    name: Rc<str>,
}

impl Table {
    /// Creates a table handle.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self { name: Rc::from(name) }
    }

    /// Returns the table name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a typed column of this table.
    #[must_use]
    pub fn column<T: SqlType>(&self, name: &str) -> Column<T> {
        Column::new(Some(Rc::clone(&self.name)), name, 0, 0)
    }

    /// Creates a typed column with a declared length and scale.
    #[must_use]
    pub fn column_sized<T: SqlType>(&self, name: &str, size: usize, scale: usize) -> Column<T> {
        Column::new(Some(Rc::clone(&self.name)), name, size, scale)
    }

    /// Starts an inner join with `right`.
    #[must_use]
    pub fn inner_join(&self, right: impl Into<TableRef>) -> TableRef {
        TableRef::from(self).inner_join(right)
    }

    /// Starts a left outer join with `right`.
    #[must_use]
    pub fn left_join(&self, right: impl Into<TableRef>) -> TableRef {
        TableRef::from(self).left_join(right)
    }
}

/// A FROM-clause fragment.
#[derive(Debug, Clone)]
pub enum TableRef {
    /// A table by name.
    Plain(Table),
    /// Two table references combined by a join.
    Joined {
        /// Left side.
        left: Box<TableRef>,
        /// Right side.
        right: Box<TableRef>,
        /// Join kind.
        kind: JoinKind,
        /// ON condition, required before compilation.
        on: Option<Constraint>,
        /// Optional alias.
        alias: Option<Rc<str>>,
    },
    /// A sub-query used as a table.
    Inline {
        /// The nested statement.
        query: Rc<Statement>,
        /// Optional alias.
        alias: Option<Rc<str>>,
    },
}

impl From<Table> for TableRef {
    fn from(table: Table) -> Self {
        Self::Plain(table)
    }
}

impl From<&Table> for TableRef {
    fn from(table: &Table) -> Self {
        Self::Plain(table.clone())
    }
}

impl TableRef {
    /// Wraps a statement as an inline table.
    #[must_use]
    pub fn inline(query: impl Into<Rc<Statement>>, alias: &str) -> Self {
        Self::Inline {
            query: query.into(),
            alias: Some(Rc::from(alias)),
        }
    }

    /// Joins `right` with the given kind; set the condition with [`TableRef::on`].
    #[must_use]
    pub fn join(self, kind: JoinKind, right: impl Into<Self>) -> Self {
        Self::Joined {
            left: Box::new(self),
            right: Box::new(right.into()),
            kind,
            on: None,
            alias: None,
        }
    }

    /// Inner join.
    #[must_use]
    pub fn inner_join(self, right: impl Into<Self>) -> Self {
        self.join(JoinKind::Inner, right)
    }

    /// Left outer join.
    #[must_use]
    pub fn left_join(self, right: impl Into<Self>) -> Self {
        self.join(JoinKind::Left, right)
    }

    /// Right outer join.
    #[must_use]
    pub fn right_join(self, right: impl Into<Self>) -> Self {
        self.join(JoinKind::Right, right)
    }

    /// Full outer join.
    #[must_use]
    pub fn full_join(self, right: impl Into<Self>) -> Self {
        self.join(JoinKind::Full, right)
    }

    /// Sets the ON condition of the outermost join.
    #[must_use]
    pub fn on(mut self, constraint: Constraint) -> Self {
        if let Self::Joined { on, .. } = &mut self {
            *on = Some(constraint);
        }
        self
    }

    /// Sets the alias of a join or inline table.
    #[must_use]
    pub fn alias(mut self, name: &str) -> Self {
        match &mut self {
            Self::Joined { alias, .. } | Self::Inline { alias, .. } => *alias = Some(Rc::from(name)),
            Self::Plain(_) => {}
        }
        self
    }

    /// Returns the name columns of this reference are qualified with.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Plain(table) => Some(table.name()),
            Self::Joined { alias, .. } | Self::Inline { alias, .. } => alias.as_deref(),
        }
    }

    /// Creates a typed column qualified by this reference's name or alias.
    #[must_use]
    pub fn column<T: SqlType>(&self, name: &str) -> Column<T> {
        Column::new(self.name().map(Rc::from), name, 0, 0)
    }

    /// Finds the inline table wrapping `query`, searching through joins.
    #[must_use]
    pub fn find(&self, query: &Rc<Statement>) -> Option<&Self> {
        match self {
            Self::Plain(_) => None,
            Self::Joined { left, right, .. } => left.find(query).or_else(|| right.find(query)),
            Self::Inline { query: own, .. } => Rc::ptr_eq(own, query).then_some(self),
        }
    }

    /// Renders the FROM-clause fragment.
    ///
    /// # Errors
    ///
    /// Fails for joins the dialect cannot express, joins without ON
    /// condition and nested statements that fail to compile.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        match self {
            Self::Plain(table) => Ok(String::from(table.name())),
            Self::Joined {
                left,
                right,
                kind,
                on,
                alias,
            } => {
                let dialect = ctx.dialect();
                if !dialect.supports_join(*kind) {
                    return Err(QueryError::UnsupportedJoin {
                        join: *kind,
                        dialect: dialect.name(),
                    });
                }
                let on = on.as_ref().filter(|c| !c.is_empty()).ok_or_else(|| {
                    QueryError::MissingJoinCondition {
                        left: left.name().unwrap_or_default().to_string(),
                        right: right.name().unwrap_or_default().to_string(),
                    }
                })?;

                let left = left.render(ctx)?;
                let right = right.render(ctx)?;
                let on = on.render(ctx)?;
                let mut sql = format!("{left} {kind} {right} ON {on}");
                if let Some(alias) = alias {
                    sql.push(' ');
                    sql.push_str(alias);
                }
                Ok(sql)
            }
            Self::Inline { query, alias } => {
                let sql = query.render(&mut ctx.nested(query.aliases()))?;
                Ok(match alias {
                    Some(alias) => format!("({sql}) {alias}"),
                    None => format!("({sql})"),
                })
            }
        }
    }
}
