//! Expression nodes.

use std::borrow::Cow;
use std::rc::Rc;

use super::column::ColumnRef;
use super::constraint::Constraint;
use super::{NodeKey, RenderContext};
use crate::builder::Statement;
use crate::error::Result;
use crate::value::SqlValue;

/// A SQL expression.
#[derive(Debug, Clone)]
pub enum Expr {
    /// A literal value, bound as a parameter when possible.
    Literal(SqlValue),
    /// A column of a table.
    Column(ColumnRef),
    /// A function, operator or aggregate over child expressions.
    Computed(Rc<Computed>),
    /// A parenthesized list of literals, always inlined.
    List(Vec<SqlValue>),
    /// A nested statement sharing the outer parameter list.
    SubQuery(Rc<Statement>),
    /// A `CASE WHEN` expression.
    Conditional(Rc<Conditional>),
}

/// How a computed expression renders its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Function {
    /// A template where `{0}`, `{1}`, ... stand for the rendered children.
    Template(Cow<'static, str>),
    /// String concatenation, `CONCAT(a, b)` or `a || b` depending on dialect.
    Concat,
}

/// A computed expression.
#[derive(Debug)]
pub struct Computed {
    function: Function,
    args: Vec<Expr>,
    aggregate: bool,
    alias: Option<String>,
}

impl Computed {
    /// Creates a computed expression.
    #[must_use]
    pub fn new(function: Function, args: Vec<Expr>, aggregate: bool) -> Self {
        Self {
            function,
            args,
            aggregate,
            alias: None,
        }
    }

    /// Returns a copy carrying a fixed alias.
    #[must_use]
    pub fn with_alias(&self, alias: &str) -> Self {
        Self {
            function: self.function.clone(),
            args: self.args.clone(),
            aggregate: self.aggregate,
            alias: Some(String::from(alias)),
        }
    }

    /// Returns whether this is an aggregate.
    #[must_use]
    pub const fn is_aggregate(&self) -> bool {
        self.aggregate
    }

    /// Returns the fixed alias, if any.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        let args = self
            .args
            .iter()
            .map(|arg| arg.render(ctx))
            .collect::<Result<Vec<_>>>()?;

        Ok(match &self.function {
            Function::Template(template) => fill_template(template, &args),
            Function::Concat => match ctx.dialect().concat_operator() {
                Some(op) => args.join(&format!(" {op} ")),
                None => format!("CONCAT({})", args.join(", ")),
            },
        })
    }
}

/// A `CASE WHEN <constraint> THEN <expr> [ELSE <expr>] END` expression.
#[derive(Debug)]
pub struct Conditional {
    when: Constraint,
    then: Expr,
    otherwise: Option<Expr>,
    alias: Option<String>,
}

impl Conditional {
    /// Creates a conditional expression.
    #[must_use]
    pub fn new(when: Constraint, then: Expr, otherwise: Option<Expr>) -> Self {
        Self {
            when,
            then,
            otherwise,
            alias: None,
        }
    }

    /// Returns a copy selected under a fixed alias.
    #[must_use]
    pub fn with_alias(&self, alias: &str) -> Self {
        Self {
            when: self.when.clone(),
            then: self.then.clone(),
            otherwise: self.otherwise.clone(),
            alias: Some(String::from(alias)),
        }
    }

    fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        let when = self.when.render(ctx)?;
        let then = self.then.render(ctx)?;
        let mut sql = format!("CASE WHEN {when} THEN {then}");
        if let Some(otherwise) = &self.otherwise {
            sql.push_str(" ELSE ");
            sql.push_str(&otherwise.render(ctx)?);
        }
        sql.push_str(" END");
        Ok(sql)
    }
}

fn fill_template(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len() + args.iter().map(String::len).sum::<usize>());
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start + 1..];
        let index = tail
            .find('}')
            .and_then(|end| tail[..end].parse::<usize>().ok().map(|i| (i, end)));

        match index {
            Some((i, end)) if i < args.len() => {
                out.push_str(&args[i]);
                rest = &tail[end + 1..];
            }
            _ => {
                out.push('{');
                rest = tail;
            }
        }
    }
    out.push_str(rest);
    out
}

impl Expr {
    /// Creates a literal expression.
    #[must_use]
    pub fn literal(value: impl crate::value::ToSqlValue) -> Self {
        Self::Literal(value.to_sql_value())
    }

    /// Creates a computed expression from a template such as `ROUND({0}, 2)`.
    #[must_use]
    pub fn function(template: impl Into<Cow<'static, str>>, args: Vec<Self>) -> Self {
        Self::Computed(Rc::new(Computed::new(
            Function::Template(template.into()),
            args,
            false,
        )))
    }

    /// Creates an aggregate expression from a template such as `SUM({0})`.
    #[must_use]
    pub fn aggregate(template: impl Into<Cow<'static, str>>, args: Vec<Self>) -> Self {
        Self::Computed(Rc::new(Computed::new(
            Function::Template(template.into()),
            args,
            true,
        )))
    }

    /// Returns whether the expression aggregates rows.
    #[must_use]
    pub fn is_aggregate(&self) -> bool {
        matches!(self, Self::Computed(c) if c.is_aggregate())
    }

    /// Returns whether the expression belongs in a derived GROUP BY clause.
    #[must_use]
    pub fn is_groupable(&self) -> bool {
        match self {
            Self::Column(_) | Self::Conditional(_) => true,
            Self::Computed(c) => !c.is_aggregate(),
            Self::Literal(_) | Self::List(_) | Self::SubQuery(_) => false,
        }
    }

    /// Returns the fixed alias the expression is selected under, if any.
    ///
    /// Generated `COLn` aliases belong to a statement; see
    /// [`Expr::select_alias`].
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        match self {
            Self::Column(c) => c.alias(),
            Self::Computed(c) => c.alias(),
            Self::Conditional(c) => c.alias.as_deref(),
            Self::Literal(_) | Self::List(_) | Self::SubQuery(_) => None,
        }
    }

    /// Identity of a computed or conditional node, shared by its clones.
    fn node_key(&self) -> Option<NodeKey> {
        match self {
            Self::Computed(c) => Some(Rc::as_ptr(c).cast()),
            Self::Conditional(c) => Some(Rc::as_ptr(c).cast()),
            Self::Literal(_) | Self::Column(_) | Self::List(_) | Self::SubQuery(_) => None,
        }
    }

    /// Returns the alias the expression was selected under in the statement
    /// being rendered: its fixed alias, or the `COLn` alias the select list
    /// gave it.
    #[must_use]
    pub fn select_alias(&self, ctx: &RenderContext<'_>) -> Option<Rc<str>> {
        self.alias()
            .map(Rc::from)
            .or_else(|| self.node_key().and_then(|key| ctx.assigned_alias(key)))
    }

    /// Returns the bare column name of a table column.
    #[must_use]
    pub fn column_name(&self) -> Option<&str> {
        match self {
            Self::Column(c) => Some(c.name()),
            _ => None,
        }
    }

    /// Renders the expression.
    ///
    /// # Errors
    ///
    /// Fails when a column has no table or a nested statement cannot compile.
    pub fn render(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        match self {
            Self::Literal(value) => Ok(ctx.bind(value)),
            Self::Column(column) => column.qualified_name(),
            Self::Computed(computed) => computed.render(ctx),
            Self::List(values) => {
                let mut inline = ctx.inlined();
                let items: Vec<String> = values.iter().map(|v| inline.bind(v)).collect();
                Ok(format!("({})", items.join(", ")))
            }
            Self::SubQuery(statement) => {
                let sql = statement.render(&mut ctx.nested(statement.aliases()))?;
                Ok(format!("({sql})"))
            }
            Self::Conditional(conditional) => conditional.render(ctx),
        }
    }

    /// Renders the expression as a select list entry, with its alias.
    ///
    /// Computed and conditional expressions without a fixed alias get a
    /// `COLn` alias from the statement being rendered, so ORDER BY can refer
    /// to them. It is assigned on first use and kept for the statement's
    /// lifetime.
    ///
    /// # Errors
    ///
    /// See [`Expr::render`].
    pub fn render_definition(&self, ctx: &mut RenderContext<'_>) -> Result<String> {
        let sql = self.render(ctx)?;
        let alias: Option<Rc<str>> = match (self.alias(), self.node_key()) {
            (Some(alias), _) => Some(Rc::from(alias)),
            (None, Some(key)) => Some(ctx.assign_alias(key)),
            (None, None) => None,
        };
        Ok(match alias {
            Some(alias) => format!("{sql} {alias}"),
            None => sql,
        })
    }
}
