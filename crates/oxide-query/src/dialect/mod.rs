//! SQL dialect support.
//!
//! Engines disagree on literal syntax, parameter markers, paging, outer joins
//! and on how generated values come back from an INSERT. A [`Dialect`]
//! answers those questions for the statement compiler and the executor.

mod oracle;
mod sqlite;
mod sqlserver;

pub use oracle::OracleDialect;
pub use sqlite::SqliteDialect;
pub use sqlserver::SqlServerDialect;

use chrono::{NaiveDateTime, Timelike};

use crate::ast::JoinKind;
use crate::value::SqlValue;

/// How a dialect restricts the rows returned by an ordered SELECT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Paging {
    /// `LIMIT n [OFFSET m]`.
    LimitOffset,
    /// `OFFSET m ROWS [FETCH NEXT n ROWS ONLY]`.
    OffsetFetch,
}

/// How a dialect hands back values generated by an INSERT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Returning {
    /// `OUTPUT INSERTED.[col]` clause, read back as a result row.
    OutputClause,
    /// `RETURNING col INTO :par00` with output parameters.
    ReturningInto,
    /// A single generated row id queried on the same connection.
    LastInsertId,
}

/// Trait for SQL dialect-specific behavior.
pub trait Dialect {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the marker put in front of parameter names.
    fn parameter_prefix(&self) -> char {
        ':'
    }

    /// Prefixes a bare parameter identifier with the dialect's marker.
    fn parameter_name(&self, name: &str) -> String {
        format!("{}{name}", self.parameter_prefix())
    }

    /// Returns the paging syntax family.
    fn paging(&self) -> Paging;

    /// Returns the generated-value retrieval strategy.
    fn returning(&self) -> Returning;

    /// Returns whether the join kind can be expressed.
    fn supports_join(&self, kind: JoinKind) -> bool {
        let _ = kind;
        true
    }

    /// Operator used for string concatenation when the engine has no
    /// `CONCAT` function.
    fn concat_operator(&self) -> Option<&'static str> {
        None
    }

    /// Query returning the last generated row id, for [`Returning::LastInsertId`].
    fn last_insert_id_query(&self) -> Option<&'static str> {
        None
    }

    /// Query returning one row when `table` exists.
    fn table_exists_query(&self, table: &str) -> String;

    /// Formats a value as inline SQL literal text.
    fn literal(&self, value: &SqlValue) -> String {
        match value {
            SqlValue::Null => String::from("NULL"),
            SqlValue::Bool(b) => String::from(if *b { "1" } else { "0" }),
            SqlValue::Int(n) => n.to_string(),
            SqlValue::Float(f) => f.to_string(),
            SqlValue::Decimal(d) => d.to_string(),
            SqlValue::Text(s) => self.text_literal(s),
            SqlValue::Blob(b) => self.blob_literal(b),
            SqlValue::Timestamp(ts) => self.timestamp_literal(ts),
        }
    }

    /// Formats free text, doubling embedded quotes.
    fn text_literal(&self, text: &str) -> String {
        quote(text)
    }

    /// Formats a binary value.
    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("X'{}'", hex(bytes))
    }

    /// Formats a timestamp.
    fn timestamp_literal(&self, ts: &NaiveDateTime) -> String {
        format!("'{}.{}'", ts.format("%Y-%m-%d %H:%M:%S"), fraction7(ts))
    }
}

/// Seven fractional second digits, the precision of `DATETIME2` and `FF7`.
#[must_use]
pub fn fraction7(ts: &NaiveDateTime) -> String {
    format!("{:07}", ts.nanosecond() / 100)
}

/// Quotes text as a SQL string literal.
#[must_use]
pub fn quote(text: &str) -> String {
    format!("'{}'", text.replace('\'', "''"))
}

/// Upper-case hexadecimal digits of `bytes`.
#[must_use]
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|byte| format!("{byte:02X}")).collect()
}

/// Escapes the LIKE wildcards in `text` so it matches literally.
///
/// Uses the bracket syntax understood by SQL Server; other engines need an
/// `ESCAPE` clause to the same effect.
#[must_use]
pub fn escape_like(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '[' => out.push_str("[[]"),
            '%' => out.push_str("[%]"),
            '_' => out.push_str("[_]"),
            other => out.push(other),
        }
    }
    out
}
