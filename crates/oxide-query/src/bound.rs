//! Typed cells receiving the values of selected expressions.

use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::error::Result;
use crate::value::{SqlType, SqlValue};

/// Raw storage shared between a statement's select list and its handles.
#[derive(Debug)]
pub(crate) struct Slot {
    value: RefCell<SqlValue>,
}

impl Slot {
    pub(crate) const fn new() -> Self {
        Self {
            value: RefCell::new(SqlValue::Null),
        }
    }

    pub(crate) fn set(&self, value: SqlValue) {
        *self.value.borrow_mut() = value;
    }

    pub(crate) fn get(&self) -> SqlValue {
        self.value.borrow().clone()
    }

    pub(crate) fn is_null(&self) -> bool {
        self.value.borrow().is_null()
    }
}

/// A handle on the value most recently read for a bound expression.
///
/// Created by [`Statement::bind`](crate::Statement::bind). Every fetched row
/// and every generated key overwrites the cell; cloning the handle shares it.
pub struct BoundValue<T> {
    slot: Rc<Slot>,
    _type: PhantomData<fn() -> T>,
}

impl<T> Clone for BoundValue<T> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
            _type: PhantomData,
        }
    }
}

impl<T> fmt::Debug for BoundValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BoundValue").field(&*self.slot.value.borrow()).finish()
    }
}

impl<T: SqlType> BoundValue<T> {
    pub(crate) fn new() -> (Self, Rc<Slot>) {
        let slot = Rc::new(Slot::new());
        let bound = Self {
            slot: Rc::clone(&slot),
            _type: PhantomData,
        };
        (bound, slot)
    }

    /// Converts the current value.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Conversion`](crate::QueryError::Conversion) when
    /// the stored value does not convert into `T`.
    pub fn get(&self) -> Result<T> {
        T::from_sql_value(&self.slot.value.borrow())
    }

    /// Returns the current raw value.
    #[must_use]
    pub fn raw(&self) -> SqlValue {
        self.slot.get()
    }

    /// Returns true while the cell holds NULL.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.slot.is_null()
    }

    /// Overwrites the cell.
    pub fn set(&self, value: T) {
        self.slot.set(value.to_sql_value());
    }
}
