//! Connection contract implemented by database providers.
//!
//! A provider only has to run a [`Command`] and hand back rows; everything
//! else (error wrapping, logging, raw SQL helpers, transactions and the
//! generated-key side channel) is provided on top of those two operations.

use tracing::debug;

use crate::ast::Table;
use crate::dialect::Dialect;
use crate::error::{DriverError, QueryError, Result};
use crate::result_set::ResultSet;
use crate::value::{SqlValue, ValueKind};

/// Direction of a command parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Value passed to the database.
    Input,
    /// Value written back by the database.
    Output,
    /// Value passed in and written back.
    InputOutput,
}

impl Direction {
    /// Returns true when the database writes the parameter back.
    #[must_use]
    pub const fn is_output(self) -> bool {
        matches!(self, Self::Output | Self::InputOutput)
    }
}

/// A typed command parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    /// Bare parameter name, without the dialect prefix.
    pub name: String,
    /// Current value; output parameters are overwritten after execution.
    pub value: SqlValue,
    /// Declared type.
    pub kind: ValueKind,
    /// Declared size, `0` for the provider default.
    pub size: usize,
    /// Direction.
    pub direction: Direction,
}

/// How the command text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
    /// Plain SQL text.
    Text,
    /// Name of a stored procedure.
    StoredProcedure,
}

/// SQL text or procedure name together with its parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct Command {
    /// SQL text or procedure name.
    pub sql: String,
    /// Interpretation of `sql`.
    pub kind: CommandKind,
    /// Parameters in declaration order.
    pub parameters: Vec<Parameter>,
}

impl Command {
    /// Creates a command without parameters.
    #[must_use]
    pub fn new(sql: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            sql: sql.into(),
            kind,
            parameters: Vec::new(),
        }
    }

    /// Looks up a parameter by bare name.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&Parameter> {
        self.parameters.iter().find(|p| p.name == name)
    }
}

/// Forward-only rows produced by a provider.
pub trait RowSource {
    /// Column names of the result.
    fn columns(&self) -> &[String];

    /// Fetches the next row, `None` once exhausted.
    ///
    /// # Errors
    ///
    /// Returns the provider's error when fetching fails.
    fn next_row(&mut self) -> std::result::Result<Option<Vec<SqlValue>>, DriverError>;
}

/// An open database connection.
///
/// Implementations are single-threaded; statements and cursors created from
/// a connection borrow it for their lifetime.
pub trait Connection {
    /// Returns the dialect statements are compiled with.
    fn dialect(&self) -> &dyn Dialect;

    /// Runs a command producing rows.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    fn execute_reader(
        &self,
        command: &Command,
    ) -> std::result::Result<Box<dyn RowSource + '_>, DriverError>;

    /// Runs a command and returns the number of affected rows.
    ///
    /// Values of output parameters are written back into `command`.
    ///
    /// # Errors
    ///
    /// Returns the provider's error unchanged.
    fn execute_non_query(&self, command: &mut Command) -> std::result::Result<u64, DriverError>;

    /// Creates a command.
    fn create_command(&self, sql: &str, kind: CommandKind) -> Command {
        Command::new(sql, kind)
    }

    /// Creates a typed parameter.
    fn create_parameter(
        &self,
        name: &str,
        value: SqlValue,
        kind: ValueKind,
        size: usize,
        direction: Direction,
    ) -> Parameter {
        Parameter {
            name: String::from(name),
            value,
            kind,
            size,
            direction,
        }
    }

    /// Wraps a provider error with the SQL text that caused it.
    fn wrap_error(&self, sql: &str, source: DriverError) -> QueryError {
        QueryError::Execution {
            dialect: self.dialect().name(),
            sql: String::from(sql),
            source,
        }
    }

    /// Runs a command and returns a cursor over its rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn query(&self, command: &Command) -> Result<ResultSet<'_>> {
        debug!(sql = %command.sql, params = command.parameters.len(), "Executing query");
        let source = self
            .execute_reader(command)
            .map_err(|e| self.wrap_error(&command.sql, e))?;
        Ok(ResultSet::new(source, &command.sql, self.dialect().name()))
    }

    /// Runs a command and returns the number of affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn execute(&self, command: &mut Command) -> Result<u64> {
        debug!(sql = %command.sql, params = command.parameters.len(), "Executing command");
        self.execute_non_query(command)
            .map_err(|e| self.wrap_error(&command.sql, e))
    }

    /// Runs raw SQL text.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn execute_sql(&self, sql: &str) -> Result<u64> {
        let mut command = self.create_command(sql, CommandKind::Text);
        self.execute(&mut command)
    }

    /// Runs raw SQL text producing rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn query_sql(&self, sql: &str) -> Result<ResultSet<'_>> {
        let command = self.create_command(sql, CommandKind::Text);
        self.query(&command)
    }

    /// Deletes every row of `table`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn delete_all(&self, table: &Table) -> Result<u64> {
        self.execute_sql(&format!("DELETE FROM {}", table.name()))
    }

    /// Returns whether a table with this name exists.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn table_exists(&self, name: &str) -> Result<bool> {
        let sql = self.dialect().table_exists_query(name);
        let mut rows = self.query_sql(&sql)?;
        rows.advance()
    }

    /// Queries the key generated by the last INSERT on this connection.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] when the dialect has no such query.
    fn query_generated_key(&self) -> Result<Option<SqlValue>> {
        let dialect = self.dialect();
        let sql = dialect
            .last_insert_id_query()
            .ok_or(QueryError::Unsupported {
                dialect: dialect.name(),
                feature: "generated key query",
            })?;
        let mut rows = self.query_sql(sql)?;
        if rows.advance()? {
            Ok(Some(rows.value(0_usize)?.clone()))
        } else {
            Ok(None)
        }
    }

    /// Starts a transaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn begin_transaction(&self) -> Result<()> {
        self.execute_sql("BEGIN TRANSACTION").map(|_| ())
    }

    /// Commits the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn commit(&self) -> Result<()> {
        self.execute_sql("COMMIT").map(|_| ())
    }

    /// Rolls back the current transaction.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails.
    fn rollback(&self) -> Result<()> {
        self.execute_sql("ROLLBACK").map(|_| ())
    }
}
