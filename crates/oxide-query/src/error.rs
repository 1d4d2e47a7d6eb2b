//! Error types for statement compilation, execution and result mapping.

use crate::ast::JoinKind;
use crate::value::ValueKind;

/// Boxed error produced by a connection provider.
pub type DriverError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while building, compiling or executing statements.
///
/// Configuration errors are programmer mistakes and surface before anything
/// reaches the database. Data errors concern a single row access. Execution
/// faults wrap whatever the provider raised together with the SQL text.
#[derive(Debug, thiserror::Error)]
pub enum QueryError {
    /// LIMIT/OFFSET was requested on a statement without ORDER BY.
    #[error("paging requires an ORDER BY clause")]
    PagingWithoutOrder,

    /// SELECT statement without any selected expression.
    #[error("SELECT statement has no selected columns")]
    EmptySelect,

    /// The statement has no source or target table.
    #[error("{0} statement has no table")]
    MissingTable(&'static str),

    /// INSERT/UPDATE without any assignment.
    #[error("{0} statement has no assignments")]
    NoAssignments(&'static str),

    /// UPDATE consumes exactly one assignment row.
    #[error("UPDATE requires exactly one assignment row, found {0}")]
    UpdateRowCount(usize),

    /// The dialect cannot express the requested join.
    #[error("{join} is not supported by {dialect}")]
    UnsupportedJoin {
        /// Requested join kind.
        join: JoinKind,
        /// Active dialect.
        dialect: &'static str,
    },

    /// A join was compiled before its ON condition was set.
    #[error("join between {left} and {right} has no ON condition")]
    MissingJoinCondition {
        /// Left side of the join.
        left: String,
        /// Right side of the join.
        right: String,
    },

    /// More returned columns were bound than the dialect can recover.
    #[error("{dialect} can only return a single generated column, {requested} were bound")]
    UnsupportedReturning {
        /// Active dialect.
        dialect: &'static str,
        /// Number of bound return columns.
        requested: usize,
    },

    /// Returned columns were bound on a statement that cannot return values.
    #[error("{0} statement cannot return generated values")]
    ReturningOnlyForInsert(&'static str),

    /// A column was rendered without an owning table.
    #[error("column '{0}' is not attached to a table")]
    UnqualifiedColumn(String),

    /// A returned expression of an INSERT is not a table column.
    #[error("returned expression '{0}' is not a table column")]
    NotAColumn(String),

    /// The requested column does not exist in the current result set.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// Positional access past the end of the row.
    #[error("column index {index} out of range, row has {count} columns")]
    ColumnIndex {
        /// Requested index.
        index: usize,
        /// Number of columns in the row.
        count: usize,
    },

    /// A row accessor was used before `advance()` returned a row.
    #[error("result set is not positioned on a row")]
    NoCurrentRow,

    /// A stored value cannot be converted into the requested type.
    #[error("cannot convert {found} value into {expected}")]
    Conversion {
        /// Name of the requested Rust type.
        expected: &'static str,
        /// Kind of the stored value.
        found: ValueKind,
    },

    /// The provider does not implement a feature.
    #[error("{feature} is not supported by {dialect}")]
    Unsupported {
        /// Active dialect.
        dialect: &'static str,
        /// Missing feature.
        feature: &'static str,
    },

    /// The provider failed while executing a command.
    #[error("{dialect} error: {source}\n\n{sql}")]
    Execution {
        /// Active dialect.
        dialect: &'static str,
        /// SQL text being executed.
        sql: String,
        /// Provider error.
        #[source]
        source: DriverError,
    },
}

impl QueryError {
    /// Returns true for errors raised before anything reached the database.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::PagingWithoutOrder
                | Self::EmptySelect
                | Self::MissingTable(_)
                | Self::NoAssignments(_)
                | Self::UpdateRowCount(_)
                | Self::UnsupportedJoin { .. }
                | Self::MissingJoinCondition { .. }
                | Self::UnsupportedReturning { .. }
                | Self::ReturningOnlyForInsert(_)
                | Self::UnqualifiedColumn(_)
                | Self::NotAColumn(_)
                | Self::Unsupported { .. }
        )
    }

    /// Returns the SQL text attached to an execution fault.
    #[must_use]
    pub fn sql(&self) -> Option<&str> {
        match self {
            Self::Execution { sql, .. } => Some(sql),
            _ => None,
        }
    }
}

/// Result type alias for query operations.
pub type Result<T> = std::result::Result<T, QueryError>;
