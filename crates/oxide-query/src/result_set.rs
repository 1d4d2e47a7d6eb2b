//! Forward-only result cursor with typed accessors.

use tracing::trace;

use crate::connection::RowSource;
use crate::error::{QueryError, Result};
use crate::value::{FromSqlValue, SqlValue};

/// Position of a column in a result row, by index or by name.
pub trait ColumnIndex {
    /// Resolves the position within `rows`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ColumnNotFound`] for unknown names and
    /// [`QueryError::ColumnIndex`] for indexes past the last column.
    fn resolve(&self, rows: &ResultSet<'_>) -> Result<usize>;
}

impl ColumnIndex for usize {
    fn resolve(&self, rows: &ResultSet<'_>) -> Result<usize> {
        let count = rows.columns().len();
        if *self < count {
            Ok(*self)
        } else {
            Err(QueryError::ColumnIndex {
                index: *self,
                count,
            })
        }
    }
}

impl ColumnIndex for &str {
    fn resolve(&self, rows: &ResultSet<'_>) -> Result<usize> {
        rows.ordinal(self)
    }
}

/// Rows returned by a query.
pub struct ResultSet<'c> {
    source: Box<dyn RowSource + 'c>,
    row: Option<Vec<SqlValue>>,
    sql: String,
    dialect: &'static str,
    rows_read: u64,
    done: bool,
}

impl std::fmt::Debug for ResultSet<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultSet")
            .field("columns", &self.source.columns())
            .field("row", &self.row)
            .field("rows_read", &self.rows_read)
            .finish_non_exhaustive()
    }
}

impl<'c> ResultSet<'c> {
    /// Wraps a provider cursor; `sql` is attached to fetch errors.
    #[must_use]
    pub fn new(source: Box<dyn RowSource + 'c>, sql: &str, dialect: &'static str) -> Self {
        Self {
            source,
            row: None,
            sql: String::from(sql),
            dialect,
            rows_read: 0,
            done: false,
        }
    }

    /// Moves to the next row; returns false once the rows are exhausted.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when fetching fails.
    pub fn advance(&mut self) -> Result<bool> {
        if self.done {
            return Ok(false);
        }
        match self.source.next_row() {
            Ok(Some(row)) => {
                self.rows_read += 1;
                self.row = Some(row);
                Ok(true)
            }
            Ok(None) => {
                trace!(rows = self.rows_read, "Result set exhausted");
                self.row = None;
                self.done = true;
                Ok(false)
            }
            Err(source) => Err(QueryError::Execution {
                dialect: self.dialect,
                sql: self.sql.clone(),
                source,
            }),
        }
    }

    /// Column names.
    #[must_use]
    pub fn columns(&self) -> &[String] {
        self.source.columns()
    }

    /// Number of rows fetched so far.
    #[must_use]
    pub const fn rows_read(&self) -> u64 {
        self.rows_read
    }

    /// Resolves a column name to its position, exact match first, then
    /// case-insensitively.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ColumnNotFound`] carrying the requested name.
    pub fn ordinal(&self, name: &str) -> Result<usize> {
        let columns = self.columns();
        columns
            .iter()
            .position(|c| c == name)
            .or_else(|| columns.iter().position(|c| c.eq_ignore_ascii_case(name)))
            .ok_or_else(|| QueryError::ColumnNotFound(String::from(name)))
    }

    /// Returns the current row.
    #[must_use]
    pub fn row(&self) -> Option<&[SqlValue]> {
        self.row.as_deref()
    }

    /// Returns a raw value of the current row.
    ///
    /// # Errors
    ///
    /// Fails when no row is current or the column does not exist.
    pub fn value(&self, column: impl ColumnIndex) -> Result<&SqlValue> {
        let index = column.resolve(self)?;
        let row = self.row.as_ref().ok_or(QueryError::NoCurrentRow)?;
        row.get(index).ok_or(QueryError::ColumnIndex {
            index,
            count: row.len(),
        })
    }

    /// Returns true when the value is NULL.
    ///
    /// # Errors
    ///
    /// See [`ResultSet::value`].
    pub fn is_null(&self, column: impl ColumnIndex) -> Result<bool> {
        self.value(column).map(SqlValue::is_null)
    }

    /// Converts a value of the current row.
    ///
    /// NULL reads as the neutral value of `T`; use `Option<T>` to observe it.
    ///
    /// # Errors
    ///
    /// See [`ResultSet::value`]; also fails when the value does not convert.
    pub fn get<T: FromSqlValue>(&self, column: impl ColumnIndex) -> Result<T> {
        T::from_sql_value(self.value(column)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DriverError;

    struct Rows {
        columns: Vec<String>,
        rows: std::vec::IntoIter<Vec<SqlValue>>,
    }

    impl RowSource for Rows {
        fn columns(&self) -> &[String] {
            &self.columns
        }

        fn next_row(&mut self) -> std::result::Result<Option<Vec<SqlValue>>, DriverError> {
            Ok(self.rows.next())
        }
    }

    fn result_set(rows: Vec<Vec<SqlValue>>) -> ResultSet<'static> {
        let source = Rows {
            columns: vec![String::from("ID"), String::from("Name")],
            rows: rows.into_iter(),
        };
        ResultSet::new(Box::new(source), "SELECT ID, Name FROM T", "test")
    }

    #[test]
    fn test_typed_access() {
        let mut rs = result_set(vec![vec![SqlValue::Int(1), SqlValue::Null]]);
        assert!(matches!(rs.value(0_usize), Err(QueryError::NoCurrentRow)));

        assert!(rs.advance().unwrap());
        assert_eq!(rs.get::<i64>("ID").unwrap(), 1);
        assert_eq!(rs.get::<String>("name").unwrap(), "");
        assert_eq!(rs.get::<Option<String>>(1_usize).unwrap(), None);
        assert!(rs.is_null("NAME").unwrap());

        assert!(!rs.advance().unwrap());
        assert!(!rs.advance().unwrap());
        assert_eq!(rs.rows_read(), 1);
    }

    #[test]
    fn test_missing_column_is_not_null() {
        let mut rs = result_set(vec![vec![SqlValue::Int(1), SqlValue::Null]]);
        rs.advance().unwrap();

        let err = rs.get::<Option<i64>>("MISSING").unwrap_err();
        assert!(matches!(&err, QueryError::ColumnNotFound(name) if name == "MISSING"));
        assert!(!err.is_configuration());
        assert!(matches!(
            rs.value(5_usize),
            Err(QueryError::ColumnIndex { index: 5, count: 2 })
        ));
    }
}
