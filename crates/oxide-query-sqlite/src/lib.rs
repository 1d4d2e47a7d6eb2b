//! # oxide-query-sqlite
//!
//! SQLite provider for `oxide-query`, built on `rusqlite`.
//!
//! ```rust
//! use oxide_query::{Connection, SqlExpr, Statement, Table};
//! use oxide_query_sqlite::SqliteConnection;
//!
//! let conn = SqliteConnection::open_in_memory().unwrap();
//! conn.execute_sql("CREATE TABLE NOTES (ID INTEGER PRIMARY KEY, BODY TEXT)").unwrap();
//!
//! let notes = Table::new("NOTES");
//! let body = notes.column::<String>("BODY");
//!
//! let mut insert = Statement::insert().into(&notes).set(body.to("hello"));
//! let id = insert.bind(&notes.column::<i64>("ID"));
//! insert.execute_non_query(&conn).unwrap();
//! assert_eq!(id.get().unwrap(), 1);
//!
//! let mut query = Statement::select().from(&notes).where_(body.like("hel%"));
//! assert_eq!(query.read_values(&conn, &body).unwrap(), vec!["hello"]);
//! ```

mod value;

use std::path::Path;

use oxide_query::{
    Command, CommandKind, Connection, ConnectionSettings, Dialect, DriverError, ProviderKind, QueryError, Result,
    RowSource, SqlValue, SqliteDialect,
};
use rusqlite::Connection as RusqliteConnection;
use tracing::debug;

use crate::value::{from_sqlite, Param};

/// Rows of a finished SQLite query.
///
/// SQLite cursors borrow their prepared statement, so rows are fetched
/// eagerly and handed out from memory.
struct BufferedRows {
    columns: Vec<String>,
    rows: std::vec::IntoIter<Vec<SqlValue>>,
}

impl RowSource for BufferedRows {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> std::result::Result<Option<Vec<SqlValue>>, DriverError> {
        Ok(self.rows.next())
    }
}

/// A SQLite database connection.
#[derive(Debug)]
pub struct SqliteConnection {
    connection: RusqliteConnection,
}

impl SqliteConnection {
    /// Opens the database file at `path`, creating it when missing.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when the file cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Opening SQLite database");
        let connection = RusqliteConnection::open(path).map_err(|e| QueryError::Execution {
            dialect: SqliteDialect.name(),
            sql: path.display().to_string(),
            source: Box::new(e),
        })?;
        Ok(Self { connection })
    }

    /// Opens a private in-memory database.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Execution`] when SQLite cannot allocate it.
    pub fn open_in_memory() -> Result<Self> {
        Self::open(":memory:")
    }

    /// Opens the database described by `settings`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Unsupported`] for settings of another provider
    /// and [`QueryError::Execution`] when opening fails.
    pub fn from_settings(settings: &ConnectionSettings) -> Result<Self> {
        if settings.provider != ProviderKind::Sqlite {
            return Err(QueryError::Unsupported {
                dialect: SqliteDialect.name(),
                feature: "connection settings of another provider",
            });
        }
        let conn = Self::open(&settings.database)?;
        if settings.foreign_keys {
            conn.execute_sql("PRAGMA foreign_keys = ON")?;
        }
        Ok(conn)
    }

    fn prepare(&self, command: &Command) -> std::result::Result<rusqlite::Statement<'_>, DriverError> {
        if command.kind == CommandKind::StoredProcedure {
            return Err(format!("stored procedure {} cannot run on SQLite", command.sql).into());
        }

        let mut statement = self.connection.prepare(&command.sql)?;
        for parameter in &command.parameters {
            let name = SqliteDialect.parameter_name(&parameter.name);
            if let Some(index) = statement.parameter_index(&name)? {
                statement.raw_bind_parameter(index, Param(&parameter.value))?;
            }
        }
        Ok(statement)
    }
}

impl Connection for SqliteConnection {
    fn dialect(&self) -> &dyn Dialect {
        &SqliteDialect
    }

    fn execute_reader(&self, command: &Command) -> std::result::Result<Box<dyn RowSource + '_>, DriverError> {
        let mut statement = self.prepare(command)?;
        let columns: Vec<String> = statement.column_names().into_iter().map(String::from).collect();

        let mut rows = Vec::new();
        let mut cursor = statement.raw_query();
        while let Some(row) = cursor.next()? {
            let values = (0..columns.len())
                .map(|index| row.get_ref(index).map(from_sqlite))
                .collect::<rusqlite::Result<Vec<_>>>()?;
            rows.push(values);
        }

        Ok(Box::new(BufferedRows {
            columns,
            rows: rows.into_iter(),
        }))
    }

    fn execute_non_query(&self, command: &mut Command) -> std::result::Result<u64, DriverError> {
        let mut statement = self.prepare(command)?;
        let affected = statement.raw_execute()?;
        Ok(affected as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oxide_query::Direction;

    #[test]
    fn test_stored_procedure_is_unsupported() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        let mut command = conn.create_command("ARCHIVE", CommandKind::StoredProcedure);
        command
            .parameters
            .push(conn.create_parameter("YEAR", SqlValue::Int(1), oxide_query::ValueKind::Int, 0, Direction::Input));

        let err = conn.execute(&mut command).unwrap_err();
        assert_eq!(err.sql(), Some("ARCHIVE"));
        assert!(err.to_string().contains("cannot run on SQLite"));
    }

    #[test]
    fn test_unknown_parameters_are_ignored() {
        let conn = SqliteConnection::open_in_memory().unwrap();
        let mut command = conn.create_command("SELECT :ph00", CommandKind::Text);
        command.parameters.push(conn.create_parameter(
            "ph00",
            SqlValue::Text(String::from("x")),
            oxide_query::ValueKind::Text,
            0,
            Direction::Input,
        ));
        command.parameters.push(conn.create_parameter(
            "unused",
            SqlValue::Null,
            oxide_query::ValueKind::Null,
            0,
            Direction::Input,
        ));

        let mut rows = conn.query(&command).unwrap();
        assert!(rows.advance().unwrap());
        assert_eq!(rows.get::<String>(0_usize).unwrap(), "x");
    }

    #[test]
    fn test_settings_of_other_provider_are_rejected() {
        let settings = ConnectionSettings {
            provider: ProviderKind::Oracle,
            database: String::from("orders"),
            foreign_keys: false,
        };
        assert!(matches!(
            SqliteConnection::from_settings(&settings),
            Err(QueryError::Unsupported { dialect: "sqlite", .. })
        ));
    }
}
