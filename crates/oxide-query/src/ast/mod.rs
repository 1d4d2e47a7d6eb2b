//! Typed syntax tree for SQL expressions, constraints and table references.
//!
//! Nodes render themselves through a [`RenderContext`], which carries the
//! active dialect, the optional parameter sink and the alias counter of the
//! statement being compiled.

mod column;
mod constraint;
mod expr;
mod table;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

pub use column::{case_when, Assignment, Column, ColumnRef, Expression, Operand, SqlExpr};
pub use constraint::{CompareOp, Constraint, Logic};
pub use expr::{Computed, Conditional, Expr, Function};
pub use table::{JoinKind, Table, TableRef};

use crate::dialect::Dialect;
use crate::value::{SqlValue, ValueKind};

/// A placeholder registered during compilation, with the value it binds.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParam {
    /// Bare placeholder name, without the dialect prefix.
    pub name: String,
    /// Bound value.
    pub value: SqlValue,
}

impl QueryParam {
    /// Returns the kind of the bound value.
    #[must_use]
    pub const fn kind(&self) -> ValueKind {
        self.value.kind()
    }
}

/// Identity of a shared expression node, used to look up its alias.
pub type NodeKey = *const ();

/// Per-statement table of generated `COL1`, `COL2`, ... aliases.
///
/// An expression keeps the alias it was first given for as long as the
/// owning statement lives. The same expression selected by another
/// statement gets an alias from that statement's table.
#[derive(Debug, Default)]
pub struct AliasSeq {
    next: Cell<u32>,
    assigned: RefCell<HashMap<NodeKey, Rc<str>>>,
}

impl AliasSeq {
    /// Returns the next unused alias.
    pub fn next_alias(&self) -> Rc<str> {
        let next = self.next.get() + 1;
        self.next.set(next);
        Rc::from(format!("COL{next}"))
    }

    /// Returns the alias of `key`, assigning the next one on first use.
    pub fn assign(&self, key: NodeKey) -> Rc<str> {
        if let Some(alias) = self.get(key) {
            return alias;
        }
        let alias = self.next_alias();
        self.assigned.borrow_mut().insert(key, Rc::clone(&alias));
        alias
    }

    /// Returns the alias already assigned to `key`.
    #[must_use]
    pub fn get(&self, key: NodeKey) -> Option<Rc<str>> {
        self.assigned.borrow().get(&key).cloned()
    }
}

/// State threaded through rendering of one statement.
pub struct RenderContext<'a> {
    dialect: &'a dyn Dialect,
    params: Option<&'a mut Vec<QueryParam>>,
    aliases: &'a AliasSeq,
}

impl<'a> RenderContext<'a> {
    /// Creates a context. Without a parameter sink every literal is inlined.
    pub fn new(
        dialect: &'a dyn Dialect,
        params: Option<&'a mut Vec<QueryParam>>,
        aliases: &'a AliasSeq,
    ) -> Self {
        Self {
            dialect,
            params,
            aliases,
        }
    }

    /// Returns the active dialect.
    #[must_use]
    pub fn dialect(&self) -> &'a dyn Dialect {
        self.dialect
    }

    /// Renders a literal, registering a placeholder when it cannot be inlined.
    pub fn bind(&mut self, value: &SqlValue) -> String {
        match self.params.as_deref_mut() {
            Some(params) if !value.is_inlineable() => {
                let name = format!("ph{:02}", params.len());
                let placeholder = self.dialect.parameter_name(&name);
                params.push(QueryParam {
                    name,
                    value: value.clone(),
                });
                placeholder
            }
            _ => self.dialect.literal(value),
        }
    }

    /// Returns the alias of a node in the statement being rendered,
    /// assigning one on first use.
    pub fn assign_alias(&self, key: NodeKey) -> Rc<str> {
        self.aliases.assign(key)
    }

    /// Returns the alias a node was given in the statement being rendered.
    #[must_use]
    pub fn assigned_alias(&self, key: NodeKey) -> Option<Rc<str>> {
        self.aliases.get(key)
    }

    /// A context that inlines every literal.
    #[must_use]
    pub fn inlined(&self) -> RenderContext<'_> {
        RenderContext {
            dialect: self.dialect,
            params: None,
            aliases: self.aliases,
        }
    }

    /// A context for a nested statement sharing this parameter list.
    #[must_use]
    pub fn nested<'b>(&'b mut self, aliases: &'b AliasSeq) -> RenderContext<'b> {
        RenderContext {
            dialect: self.dialect,
            params: self.params.as_deref_mut(),
            aliases,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{SqlServerDialect, SqliteDialect};

    #[test]
    fn test_bind_numbers_placeholders() {
        let aliases = AliasSeq::default();
        let mut params = Vec::new();
        let mut ctx = RenderContext::new(&SqlServerDialect, Some(&mut params), &aliases);

        assert_eq!(ctx.bind(&SqlValue::Text("a".into())), "@ph00");
        assert_eq!(ctx.bind(&SqlValue::Int(7)), "7");
        assert_eq!(ctx.bind(&SqlValue::Null), "NULL");
        assert_eq!(ctx.bind(&SqlValue::Float(1.5)), "@ph01");
        assert_eq!(params.len(), 2);
        assert_eq!(params[1].name, "ph01");
    }

    #[test]
    fn test_inlined_context_never_binds() {
        let aliases = AliasSeq::default();
        let mut params = Vec::new();
        let ctx = RenderContext::new(&SqliteDialect, Some(&mut params), &aliases);
        let mut inline = ctx.inlined();

        assert_eq!(inline.bind(&SqlValue::Text("x".into())), "'x'");
        drop(ctx);
        assert!(params.is_empty());
    }

    #[test]
    fn test_alias_sequence() {
        let aliases = AliasSeq::default();
        assert_eq!(&*aliases.next_alias(), "COL1");
        assert_eq!(&*aliases.next_alias(), "COL2");
    }

    #[test]
    fn test_aliases_are_assigned_once_per_node() {
        let (a, b) = (1_u8, 2_u8);
        let (a, b): (NodeKey, NodeKey) = (std::ptr::from_ref(&a).cast(), std::ptr::from_ref(&b).cast());
        let aliases = AliasSeq::default();

        assert_eq!(aliases.get(a), None);
        assert_eq!(&*aliases.assign(a), "COL1");
        assert_eq!(&*aliases.assign(b), "COL2");
        assert_eq!(&*aliases.assign(a), "COL1");
        assert_eq!(aliases.get(b).as_deref(), Some("COL2"));
    }
}
