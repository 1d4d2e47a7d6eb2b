//! Stored procedure calls.

use crate::connection::{Command, CommandKind, Connection, Direction, Parameter};
use crate::error::{QueryError, Result};
use crate::result_set::ResultSet;
use crate::value::{FromSqlValue, SqlType, SqlValue, ToSqlValue, ValueKind};

/// A stored procedure call with its parameters.
///
/// Output parameters are readable through [`StoredProcedure::output_value`]
/// once [`StoredProcedure::execute`] returned.
#[derive(Debug, Clone)]
pub struct StoredProcedure {
    name: String,
    parameters: Vec<Declared>,
    executed: Option<Command>,
}

#[derive(Debug, Clone)]
struct Declared {
    name: String,
    value: SqlValue,
    kind: ValueKind,
    size: usize,
    direction: Direction,
}

impl StoredProcedure {
    /// Starts a call of the procedure `name`.
    #[must_use]
    pub fn call(name: &str) -> Self {
        Self {
            name: String::from(name),
            parameters: Vec::new(),
            executed: None,
        }
    }

    /// Returns the procedure name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    fn declare(mut self, name: &str, value: SqlValue, kind: ValueKind, size: usize, direction: Direction) -> Self {
        self.parameters.push(Declared {
            name: String::from(name),
            value,
            kind,
            size,
            direction,
        });
        self
    }

    /// Adds an input parameter.
    #[must_use]
    pub fn input(self, name: &str, value: impl ToSqlValue) -> Self {
        let value = value.to_sql_value();
        let kind = value.kind();
        self.declare(name, value, kind, 0, Direction::Input)
    }

    /// Adds an output parameter of type `T`; `size` bounds text and binary
    /// values, `0` leaves it to the provider.
    #[must_use]
    pub fn output<T: SqlType>(self, name: &str, size: usize) -> Self {
        self.declare(name, SqlValue::Null, T::KIND, size, Direction::Output)
    }

    /// Adds a parameter passed in and written back.
    #[must_use]
    pub fn input_output<T: SqlType>(self, name: &str, value: T, size: usize) -> Self {
        self.declare(name, value.to_sql_value(), T::KIND, size, Direction::InputOutput)
    }

    fn command(&self, conn: &dyn Connection) -> Command {
        let mut command = conn.create_command(&self.name, CommandKind::StoredProcedure);
        command.parameters = self
            .parameters
            .iter()
            .map(|p| conn.create_parameter(&p.name, p.value.clone(), p.kind, p.size, p.direction))
            .collect();
        command
    }

    /// Runs the procedure and returns the affected rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails or cannot
    /// run stored procedures.
    pub fn execute(&mut self, conn: &dyn Connection) -> Result<u64> {
        let mut command = self.command(conn);
        let affected = conn.execute(&mut command)?;
        self.executed = Some(command);
        Ok(affected)
    }

    /// Runs the procedure and returns its result rows.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the provider fails or cannot
    /// run stored procedures.
    pub fn execute_reader<'c>(&self, conn: &'c dyn Connection) -> Result<ResultSet<'c>> {
        conn.query(&self.command(conn))
    }

    fn outputs(&self) -> impl Iterator<Item = &Parameter> {
        self.executed
            .iter()
            .flat_map(|command| command.parameters.iter())
            .filter(|p| p.direction.is_output())
    }

    /// Reads an output parameter written by the last [`StoredProcedure::execute`].
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::ColumnNotFound`] when no output parameter has
    /// that name, or before the procedure was executed.
    pub fn output_value<T: FromSqlValue>(&self, name: &str) -> Result<T> {
        let parameter = self
            .outputs()
            .find(|p| p.name == name)
            .ok_or_else(|| QueryError::ColumnNotFound(String::from(name)))?;
        T::from_sql_value(&parameter.value)
    }

    /// Returns every output value in declaration order.
    #[must_use]
    pub fn output_values(&self) -> Vec<SqlValue> {
        self.outputs().map(|p| p.value.clone()).collect()
    }
}
