//! Running statements on a connection.

use tracing::{debug, warn};

use crate::ast::SqlExpr;
use crate::builder::{output_parameter, Statement, StatementKind};
use crate::connection::{Command, CommandKind, Connection, Direction};
use crate::dialect::Returning;
use crate::error::Result;
use crate::mapper::Mapper;
use crate::result_set::ResultSet;
use crate::value::SqlValue;

/// Cursor over the rows of an executed statement.
///
/// Each call to [`Reader::advance`] pushes the row into the statement's
/// bound cells and row setters.
#[derive(Debug)]
pub struct Reader<'s, 'c> {
    statement: &'s mut Statement,
    rows: ResultSet<'c>,
}

impl<'c> Reader<'_, 'c> {
    /// Moves to the next row.
    ///
    /// # Errors
    ///
    /// Fails when fetching fails, when the row is shorter than the select
    /// list or when a row setter cannot convert its value.
    pub fn advance(&mut self) -> Result<bool> {
        if !self.rows.advance()? {
            return Ok(false);
        }
        for (index, item) in self.statement.select.iter_mut().enumerate() {
            item.push(self.rows.value(index)?.clone())?;
        }
        Ok(true)
    }

    /// Returns the underlying cursor for direct column access.
    #[must_use]
    pub const fn rows(&self) -> &ResultSet<'c> {
        &self.rows
    }
}

impl Statement {
    /// Compiles into a provider command, output parameters first.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when compilation fails.
    pub fn command(&self, conn: &dyn Connection) -> Result<Command> {
        let dialect = conn.dialect();
        let compiled = self.compile(dialect)?;
        let mut command = conn.create_command(&compiled.sql, CommandKind::Text);

        if self.kind() == StatementKind::Insert && dialect.returning() == Returning::ReturningInto {
            for (index, item) in self.select.iter().enumerate() {
                command.parameters.push(conn.create_parameter(
                    &output_parameter(index),
                    SqlValue::Null,
                    item.kind,
                    0,
                    Direction::Output,
                ));
            }
        }
        for param in compiled.params {
            let kind = param.kind();
            command
                .parameters
                .push(conn.create_parameter(&param.name, param.value, kind, 0, Direction::Input));
        }
        Ok(command)
    }

    /// Executes the statement and returns a cursor feeding the bound cells.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when compilation fails and
    /// [`QueryError::Execution`](crate::QueryError::Execution) when the
    /// provider fails.
    pub fn execute_reader<'s, 'c>(&'s mut self, conn: &'c dyn Connection) -> Result<Reader<'s, 'c>> {
        let command = self.command(conn)?;
        let rows = conn.query(&command)?;
        Ok(Reader {
            statement: self,
            rows,
        })
    }

    /// Executes an INSERT, UPDATE or DELETE and returns the affected rows.
    ///
    /// Columns bound on an INSERT receive the generated values; when a
    /// multi-row INSERT returns several rows, the cells keep the first one.
    /// Staged assignment rows of an INSERT or UPDATE are cleared afterwards.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when compilation fails and
    /// [`QueryError::Execution`](crate::QueryError::Execution) when the
    /// provider fails.
    pub fn execute_non_query(&mut self, conn: &dyn Connection) -> Result<u64> {
        let command = self.command(conn)?;
        let affected = self.run(conn, command)?;
        if matches!(self.kind(), StatementKind::Insert | StatementKind::Update) {
            self.clear_stage();
        }
        Ok(affected)
    }

    fn run(&mut self, conn: &dyn Connection, mut command: Command) -> Result<u64> {
        if self.kind() != StatementKind::Insert || self.select.is_empty() {
            return conn.execute(&mut command);
        }

        match conn.dialect().returning() {
            Returning::OutputClause => {
                let mut rows = conn.query(&command)?;
                if !rows.advance()? {
                    warn!(sql = %command.sql, "INSERT returned no row");
                    return Ok(0);
                }
                for (index, item) in self.select.iter_mut().enumerate() {
                    item.push(rows.value(index)?.clone())?;
                }
                let mut returned = 1;
                while rows.advance()? {
                    returned += 1;
                }
                Ok(returned)
            }
            Returning::ReturningInto => {
                let affected = conn.execute(&mut command)?;
                if affected == 1 {
                    for (index, item) in self.select.iter_mut().enumerate() {
                        let value = command
                            .parameter(&output_parameter(index))
                            .map_or(SqlValue::Null, |p| p.value.clone());
                        item.push(value)?;
                    }
                }
                Ok(affected)
            }
            Returning::LastInsertId => {
                let affected = conn.execute(&mut command)?;
                if affected == 0 {
                    warn!(sql = %command.sql, "INSERT affected no row");
                    return Ok(0);
                }
                match conn.query_generated_key()? {
                    Some(key) if !key.is_null() && key != SqlValue::Int(0) => {
                        debug!(key = ?key, "Generated key");
                        if let Some(item) = self.select.first_mut() {
                            item.push(key)?;
                        }
                        Ok(affected)
                    }
                    _ => {
                        warn!(sql = %command.sql, "No generated key after INSERT");
                        Ok(0)
                    }
                }
            }
        }
    }

    fn with_select<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let mark = self.select.len();
        let result = f(self);
        self.select.truncate(mark);
        result
    }

    fn with_only<R>(&mut self, f: impl FnOnce(&mut Self) -> Result<R>) -> Result<R> {
        let saved = std::mem::take(&mut self.select);
        let result = f(self);
        self.select = saved;
        result
    }

    /// Reads `expr` from the first row, `None` when there is no row.
    ///
    /// Only `expr` is selected; the select list is restored afterwards.
    ///
    /// # Errors
    ///
    /// See [`Statement::execute_reader`].
    pub fn read_value<E: SqlExpr>(&mut self, conn: &dyn Connection, expr: &E) -> Result<Option<E::Value>> {
        self.with_only(|statement| {
            let cell = statement.bind(expr);
            let mut reader = statement.execute_reader(conn)?;
            if reader.advance()? { cell.get().map(Some) } else { Ok(None) }
        })
    }

    /// Reads `expr` from every row.
    ///
    /// Only `expr` is selected; the select list is restored afterwards.
    ///
    /// # Errors
    ///
    /// See [`Statement::execute_reader`].
    pub fn read_values<E: SqlExpr>(&mut self, conn: &dyn Connection, expr: &E) -> Result<Vec<E::Value>> {
        self.with_only(|statement| {
            let cell = statement.bind(expr);
            let mut reader = statement.execute_reader(conn)?;
            let mut values = Vec::new();
            while reader.advance()? {
                values.push(cell.get()?);
            }
            Ok(values)
        })
    }

    /// Fetches at most one row into the bound cells and setters.
    ///
    /// Returns whether a row was found.
    ///
    /// # Errors
    ///
    /// See [`Statement::execute_reader`].
    pub fn read_single(&mut self, conn: &dyn Connection) -> Result<bool> {
        self.execute_reader(conn)?.advance()
    }

    /// Calls `f` after every row has been pushed into the bound cells.
    ///
    /// Returns the number of rows.
    ///
    /// # Errors
    ///
    /// See [`Statement::execute_reader`]; errors returned by `f` stop the
    /// iteration.
    pub fn read_each(&mut self, conn: &dyn Connection, mut f: impl FnMut() -> Result<()>) -> Result<u64> {
        let mut reader = self.execute_reader(conn)?;
        let mut count = 0;
        while reader.advance()? {
            f()?;
            count += 1;
        }
        Ok(count)
    }

    /// Materializes every row through `mapper`.
    ///
    /// The mapper's expressions are appended to the select list for the
    /// duration of the call.
    ///
    /// # Errors
    ///
    /// See [`Statement::execute_reader`]; also fails when a mapped value
    /// cannot be converted.
    pub fn read_all<C: 'static>(&mut self, conn: &dyn Connection, mapper: &mut Mapper<C>) -> Result<Vec<C>> {
        self.with_select(|statement| {
            mapper.bind(statement);
            let mut reader = statement.execute_reader(conn)?;
            mapper.new_list();
            while reader.advance()? {
                mapper.add_entity()?;
            }
            mapper.finish();
            Ok(mapper.take_entities())
        })
    }
}
