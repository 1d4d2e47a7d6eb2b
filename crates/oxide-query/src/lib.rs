//! # oxide-query
//!
//! A typed SQL statement builder that compiles to dialect-specific,
//! parameterized SQL and maps result rows back into entities.
//!
//! This crate provides:
//! - Typed tables, columns, expressions and constraints
//! - One statement type covering SELECT, INSERT, UPDATE and DELETE
//! - SQLite, SQL Server and Oracle dialects
//! - A connection contract implemented by database providers
//! - Bound cells and a grouping mapper for reading results
//!
//! ## Building and compiling
//!
//! ```rust
//! use oxide_query::{OracleDialect, SqlExpr, SqlValue, Statement, Table};
//!
//! let customers = Table::new("CUSTOMERS");
//! let orders = Table::new("ORDERS");
//! let customer_id = customers.column::<i64>("ID");
//! let name = customers.column::<String>("NAME");
//! let total = orders.column::<f64>("TOTAL");
//!
//! let query = Statement::select()
//!     .add_select(&name)
//!     .add_select(&total.sum().alias("SPENT"))
//!     .from(customers.inner_join(&orders).on(customer_id.eq(&orders.column::<i64>("CUSTOMER_ID"))))
//!     .where_(name.ne("nobody"));
//!
//! let compiled = query.compile(&OracleDialect).unwrap();
//! assert_eq!(
//!     compiled.sql,
//!     "SELECT CUSTOMERS.NAME, SUM(ORDERS.TOTAL) SPENT \
//!      FROM CUSTOMERS INNER JOIN ORDERS ON (CUSTOMERS.ID = ORDERS.CUSTOMER_ID) \
//!      WHERE (CUSTOMERS.NAME <> :ph00) GROUP BY CUSTOMERS.NAME"
//! );
//! assert_eq!(compiled.params[0].value, SqlValue::Text(String::from("nobody")));
//! ```
//!
//! ## Executing
//!
//! Statements run on any [`Connection`]. Selected expressions are bound to
//! cells that each fetched row overwrites, or folded into entities by a
//! [`Mapper`]. The `oxide-query-sqlite` crate provides a SQLite connection.

pub mod ast;
mod bound;
pub mod builder;
pub mod connection;
pub mod dialect;
pub mod error;
mod execute;
pub mod mapper;
pub mod procedure;
pub mod result_set;
pub mod settings;
pub mod value;

pub use ast::{case_when, Assignment, Column, Constraint, Expr, Expression, JoinKind, SqlExpr, Table, TableRef};
pub use bound::BoundValue;
pub use builder::{CompiledStatement, Statement, StatementKind};
pub use connection::{Command, CommandKind, Connection, Direction, Parameter, RowSource};
pub use dialect::{Dialect, OracleDialect, SqlServerDialect, SqliteDialect};
pub use error::{DriverError, QueryError, Result};
pub use execute::Reader;
pub use mapper::Mapper;
pub use procedure::StoredProcedure;
pub use result_set::{ColumnIndex, ResultSet};
pub use settings::{ConnectionSettings, ProviderKind};
pub use value::{FromSqlValue, SqlType, SqlValue, ToSqlValue, ValueKind};

/// Commonly used items.
pub mod prelude {
    pub use crate::{
        case_when, Column, Connection, Constraint, Mapper, SqlExpr, SqlValue, Statement, Table,
    };
}
