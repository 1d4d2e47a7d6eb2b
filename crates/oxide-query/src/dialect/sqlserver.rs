//! SQL Server dialect.

use chrono::NaiveDateTime;

use super::{fraction7, hex, quote, Dialect, Paging, Returning};

/// Microsoft SQL Server dialect.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqlServerDialect;

impl SqlServerDialect {
    /// Creates a new SQL Server dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqlServerDialect {
    fn name(&self) -> &'static str {
        "sqlserver"
    }

    fn parameter_prefix(&self) -> char {
        '@'
    }

    fn paging(&self) -> Paging {
        Paging::OffsetFetch
    }

    fn returning(&self) -> Returning {
        Returning::OutputClause
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!(
            "SELECT TABLE_NAME FROM INFORMATION_SCHEMA.TABLES WHERE TABLE_NAME = {}",
            quote(&table.to_uppercase())
        )
    }

    fn text_literal(&self, text: &str) -> String {
        // A backslash before a line break continues the literal on the next line.
        let text = text
            .replace("\\\r\n", "\\\\\r\n\r\n")
            .replace("\\\n", "\\\\\n\n");
        quote(&text)
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("0x{}", hex(bytes))
    }

    fn timestamp_literal(&self, ts: &NaiveDateTime) -> String {
        format!(
            "CONVERT(DateTime2, '{}.{}', 121)",
            ts.format("%Y-%m-%d %H:%M:%S"),
            fraction7(ts)
        )
    }
}
