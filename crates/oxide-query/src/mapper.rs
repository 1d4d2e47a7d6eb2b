//! Folding flat result rows into entity graphs.
//!
//! A [`Mapper`] binds the expressions it needs to a statement, then receives
//! one [`Mapper::add_entity`] call per fetched row. Rows belonging to the
//! same parent are detected by a group-change predicate; a child mapper
//! collects the rows of each parent into a list that is handed to the parent
//! once the next parent starts, or when [`Mapper::finish`] is called.
//!
//! ```rust
//! use oxide_query::{Mapper, Table};
//!
//! #[derive(Default)]
//! struct Order {
//!     id: i64,
//!     lines: Vec<Line>,
//! }
//!
//! #[derive(Default)]
//! struct Line {
//!     product: String,
//! }
//!
//! let orders = Table::new("ORDERS");
//! let lines = Table::new("LINES");
//! let order_id = orders.column::<i64>("ID");
//!
//! let mapper = Mapper::<Order>::new()
//!     .map(&order_id, |o, id| o.id = id)
//!     .group_on(&order_id)
//!     .group(
//!         Mapper::<Line>::new().map(&lines.column::<String>("PRODUCT"), |l, p| l.product = p),
//!         |o, lines| o.lines = lines,
//!     );
//! # let _ = mapper;
//! ```

use std::fmt;

use crate::ast::{Expression, SqlExpr};
use crate::bound::BoundValue;
use crate::builder::Statement;
use crate::error::Result;
use crate::value::{SqlType, SqlValue};

trait Entry<C> {
    fn bind(&mut self, statement: &mut Statement);
    fn is_null(&self) -> bool;
    fn apply(&mut self, entity: &mut C) -> Result<()>;
}

fn is_null<T: SqlType>(cell: Option<&BoundValue<T>>) -> bool {
    cell.is_none_or(BoundValue::is_null)
}

fn read<T: SqlType>(cell: Option<&BoundValue<T>>) -> Result<T> {
    match cell {
        Some(cell) => cell.get(),
        None => T::from_sql_value(&SqlValue::Null),
    }
}

struct Field<C, A: SqlType> {
    expr: Expression<A>,
    cell: Option<BoundValue<A>>,
    setter: Box<dyn Fn(&mut C, A)>,
}

impl<C, A: SqlType> Entry<C> for Field<C, A> {
    fn bind(&mut self, statement: &mut Statement) {
        self.cell = Some(statement.bind(&self.expr));
    }

    fn is_null(&self) -> bool {
        is_null(self.cell.as_ref())
    }

    fn apply(&mut self, entity: &mut C) -> Result<()> {
        (self.setter)(entity, read(self.cell.as_ref())?);
        Ok(())
    }
}

struct Field2<C, A: SqlType, B: SqlType> {
    exprs: (Expression<A>, Expression<B>),
    cells: Option<(BoundValue<A>, BoundValue<B>)>,
    setter: Box<dyn Fn(&mut C, A, B)>,
}

impl<C, A: SqlType, B: SqlType> Entry<C> for Field2<C, A, B> {
    fn bind(&mut self, statement: &mut Statement) {
        let a = statement.bind(&self.exprs.0);
        let b = statement.bind(&self.exprs.1);
        self.cells = Some((a, b));
    }

    fn is_null(&self) -> bool {
        self.cells
            .as_ref()
            .is_none_or(|(a, b)| a.is_null() && b.is_null())
    }

    fn apply(&mut self, entity: &mut C) -> Result<()> {
        let cells = self.cells.as_ref();
        let a = read(cells.map(|c| &c.0))?;
        let b = read(cells.map(|c| &c.1))?;
        (self.setter)(entity, a, b);
        Ok(())
    }
}

struct Field3<C, A: SqlType, B: SqlType, D: SqlType> {
    exprs: (Expression<A>, Expression<B>, Expression<D>),
    cells: Option<(BoundValue<A>, BoundValue<B>, BoundValue<D>)>,
    setter: Box<dyn Fn(&mut C, A, B, D)>,
}

impl<C, A: SqlType, B: SqlType, D: SqlType> Entry<C> for Field3<C, A, B, D> {
    fn bind(&mut self, statement: &mut Statement) {
        let a = statement.bind(&self.exprs.0);
        let b = statement.bind(&self.exprs.1);
        let d = statement.bind(&self.exprs.2);
        self.cells = Some((a, b, d));
    }

    fn is_null(&self) -> bool {
        self.cells
            .as_ref()
            .is_none_or(|(a, b, d)| a.is_null() && b.is_null() && d.is_null())
    }

    fn apply(&mut self, entity: &mut C) -> Result<()> {
        let cells = self.cells.as_ref();
        let a = read(cells.map(|c| &c.0))?;
        let b = read(cells.map(|c| &c.1))?;
        let d = read(cells.map(|c| &c.2))?;
        (self.setter)(entity, a, b, d);
        Ok(())
    }
}

struct Nested<C, E> {
    mapper: Mapper<E>,
    setter: Box<dyn Fn(&mut C, E)>,
}

impl<C, E: 'static> Entry<C> for Nested<C, E> {
    fn bind(&mut self, statement: &mut Statement) {
        self.mapper.bind(statement);
    }

    fn is_null(&self) -> bool {
        self.mapper.is_null()
    }

    fn apply(&mut self, entity: &mut C) -> Result<()> {
        if !self.mapper.is_null() {
            let child = self.mapper.materialize()?;
            (self.setter)(entity, child);
        }
        Ok(())
    }
}

trait Group<C> {
    fn bind(&mut self, statement: &mut Statement);
    fn new_list(&mut self);
    fn set_list(&mut self, parent: &mut C);
    fn add_entity(&mut self) -> Result<()>;
}

struct Children<C, E> {
    mapper: Mapper<E>,
    setter: Box<dyn Fn(&mut C, Vec<E>)>,
}

impl<C, E: 'static> Group<C> for Children<C, E> {
    fn bind(&mut self, statement: &mut Statement) {
        self.mapper.bind(statement);
    }

    fn new_list(&mut self) {
        self.mapper.new_list();
    }

    fn set_list(&mut self, parent: &mut C) {
        self.mapper.finish();
        (self.setter)(parent, self.mapper.take_entities());
    }

    fn add_entity(&mut self) -> Result<()> {
        self.mapper.add_entity()
    }
}

trait GroupPredicate {
    fn bind(&mut self, statement: &mut Statement);
    fn changed(&mut self) -> Result<bool>;
    fn reset(&mut self);
}

type ChangeFn<T> = Box<dyn Fn(Option<&T>, &T) -> bool>;

struct ValueChange<T: SqlType> {
    expr: Expression<T>,
    cell: Option<BoundValue<T>>,
    last: Option<T>,
    changed: ChangeFn<T>,
}

impl<T: SqlType> GroupPredicate for ValueChange<T> {
    fn bind(&mut self, statement: &mut Statement) {
        self.cell = Some(statement.bind(&self.expr));
    }

    fn changed(&mut self) -> Result<bool> {
        let current = read(self.cell.as_ref())?;
        let changed = (self.changed)(self.last.as_ref(), &current);
        self.last = Some(current);
        Ok(changed)
    }

    fn reset(&mut self) {
        self.last = None;
    }
}

/// Builds entities of type `C` from result rows.
pub struct Mapper<C> {
    factory: Box<dyn Fn() -> C>,
    entries: Vec<Box<dyn Entry<C>>>,
    group: Option<Box<dyn Group<C>>>,
    value_change: Option<Box<dyn GroupPredicate>>,
    entity_change: Option<Box<dyn Fn(Option<&C>, &C) -> bool>>,
    entities: Vec<C>,
}

impl<C> fmt::Debug for Mapper<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapper")
            .field("entries", &self.entries.len())
            .field("group", &self.group.is_some())
            .field("entities", &self.entities.len())
            .finish_non_exhaustive()
    }
}

impl<C: Default + 'static> Mapper<C> {
    /// Creates a mapper constructing entities with `C::default()`.
    #[must_use]
    pub fn new() -> Self {
        Self::with_factory(C::default)
    }
}

impl<C: Default + 'static> Default for Mapper<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> Mapper<C> {
    /// Creates a mapper constructing entities with `factory`.
    #[must_use]
    pub fn with_factory(factory: impl Fn() -> C + 'static) -> Self {
        Self {
            factory: Box::new(factory),
            entries: Vec::new(),
            group: None,
            value_change: None,
            entity_change: None,
            entities: Vec::new(),
        }
    }

    /// Maps one expression onto the entity.
    #[must_use]
    pub fn map<E: SqlExpr>(mut self, expr: &E, setter: impl Fn(&mut C, E::Value) + 'static) -> Self {
        self.entries.push(Box::new(Field {
            expr: Expression::new(expr.as_expr()),
            cell: None,
            setter: Box::new(setter),
        }));
        self
    }

    /// Maps two expressions onto the entity with one setter.
    #[must_use]
    pub fn map2<A: SqlExpr, B: SqlExpr>(
        mut self,
        a: &A,
        b: &B,
        setter: impl Fn(&mut C, A::Value, B::Value) + 'static,
    ) -> Self {
        self.entries.push(Box::new(Field2 {
            exprs: (Expression::new(a.as_expr()), Expression::new(b.as_expr())),
            cells: None,
            setter: Box::new(setter),
        }));
        self
    }

    /// Maps three expressions onto the entity with one setter.
    #[must_use]
    pub fn map3<A: SqlExpr, B: SqlExpr, D: SqlExpr>(
        mut self,
        a: &A,
        b: &B,
        d: &D,
        setter: impl Fn(&mut C, A::Value, B::Value, D::Value) + 'static,
    ) -> Self {
        self.entries.push(Box::new(Field3 {
            exprs: (
                Expression::new(a.as_expr()),
                Expression::new(b.as_expr()),
                Expression::new(d.as_expr()),
            ),
            cells: None,
            setter: Box::new(setter),
        }));
        self
    }

    /// Maps a one-to-one child built from the same row.
    ///
    /// The setter is skipped when every cell of the child is NULL, as
    /// produced by an outer join without match.
    #[must_use]
    pub fn nest<E: 'static>(mut self, mapper: Mapper<E>, setter: impl Fn(&mut C, E) + 'static) -> Self {
        self.entries.push(Box::new(Nested {
            mapper,
            setter: Box::new(setter),
        }));
        self
    }

    /// Collects the rows of each entity into a child list.
    ///
    /// Without [`Mapper::group_on`] or [`Mapper::group_when`] every row
    /// starts a new entity.
    #[must_use]
    pub fn group<E: 'static>(mut self, mapper: Mapper<E>, setter: impl Fn(&mut C, Vec<E>) + 'static) -> Self {
        self.group = Some(Box::new(Children {
            mapper,
            setter: Box::new(setter),
        }));
        self
    }

    /// Starts a new entity whenever the value of `expr` changes.
    #[must_use]
    pub fn group_on<E>(self, expr: &E) -> Self
    where
        E: SqlExpr,
        E::Value: PartialEq,
    {
        self.group_on_with(expr, |last, current| last != Some(current))
    }

    /// Starts a new entity whenever `changed(previous, current)` holds for
    /// the value of `expr`; `previous` is `None` on the first row.
    #[must_use]
    pub fn group_on_with<E: SqlExpr>(
        mut self,
        expr: &E,
        changed: impl Fn(Option<&E::Value>, &E::Value) -> bool + 'static,
    ) -> Self {
        self.value_change = Some(Box::new(ValueChange {
            expr: Expression::new(expr.as_expr()),
            cell: None,
            last: None,
            changed: Box::new(changed),
        }));
        self
    }

    /// Starts a new entity whenever `changed(last, candidate)` holds, where
    /// `candidate` is built from the current row.
    #[must_use]
    pub fn group_when(mut self, changed: impl Fn(Option<&C>, &C) -> bool + 'static) -> Self {
        self.entity_change = Some(Box::new(changed));
        self
    }

    /// Binds every mapped expression to `statement`.
    pub fn bind(&mut self, statement: &mut Statement) {
        for entry in &mut self.entries {
            entry.bind(statement);
        }
        if let Some(group) = &mut self.group {
            group.bind(statement);
        }
        if let Some(predicate) = &mut self.value_change {
            predicate.bind(statement);
        }
    }

    /// Returns true when every mapped cell of the current row is NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.entries.iter().all(|entry| entry.is_null())
    }

    /// Clears the output and the grouping state.
    pub fn new_list(&mut self) {
        self.entities.clear();
        if let Some(predicate) = &mut self.value_change {
            predicate.reset();
        }
        if let Some(group) = &mut self.group {
            group.new_list();
        }
    }

    fn materialize(&mut self) -> Result<C> {
        let mut entity = (self.factory)();
        for entry in &mut self.entries {
            entry.apply(&mut entity)?;
        }
        Ok(entity)
    }

    /// Folds the current row into the output.
    ///
    /// # Errors
    ///
    /// Fails when a bound value cannot be converted.
    pub fn add_entity(&mut self) -> Result<()> {
        let mut candidate = None;
        let changed = if let Some(predicate) = &mut self.value_change {
            predicate.changed()?
        } else if self.entity_change.is_some() {
            let entity = self.materialize()?;
            let changed = self
                .entity_change
                .as_ref()
                .is_none_or(|changed| changed(self.entities.last(), &entity));
            candidate = Some(entity);
            changed
        } else {
            true
        };

        if changed || self.entities.is_empty() {
            let entity = match candidate {
                Some(entity) => entity,
                None => self.materialize()?,
            };
            if let Some(group) = &mut self.group {
                if let Some(last) = self.entities.last_mut() {
                    group.set_list(last);
                }
                group.new_list();
            }
            self.entities.push(entity);
        } else if self.group.is_none() {
            if let Some(last) = self.entities.last_mut() {
                for entry in &mut self.entries {
                    entry.apply(last)?;
                }
            }
        }

        if let Some(group) = &mut self.group {
            group.add_entity()?;
        }
        Ok(())
    }

    /// Hands the pending child list to the last entity.
    pub fn finish(&mut self) {
        if let Some(group) = &mut self.group {
            if let Some(last) = self.entities.last_mut() {
                group.set_list(last);
            }
        }
    }

    /// Returns the entities built so far.
    #[must_use]
    pub fn entities(&self) -> &[C] {
        &self.entities
    }

    /// Moves the entities out, leaving the output empty.
    pub fn take_entities(&mut self) -> Vec<C> {
        std::mem::take(&mut self.entities)
    }
}
