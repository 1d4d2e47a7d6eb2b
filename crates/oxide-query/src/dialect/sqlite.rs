//! SQLite dialect.

use super::{quote, Dialect, Paging, Returning};
use crate::ast::JoinKind;

/// SQLite dialect.
///
/// Pages with `LIMIT`/`OFFSET`, concatenates with `||` and recovers only the
/// last inserted row id after an INSERT.
#[derive(Debug, Default, Clone, Copy)]
pub struct SqliteDialect;

impl SqliteDialect {
    /// Creates a new SQLite dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for SqliteDialect {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn paging(&self) -> Paging {
        Paging::LimitOffset
    }

    fn returning(&self) -> Returning {
        Returning::LastInsertId
    }

    fn supports_join(&self, kind: JoinKind) -> bool {
        matches!(kind, JoinKind::Inner | JoinKind::Left)
    }

    fn concat_operator(&self) -> Option<&'static str> {
        Some("||")
    }

    fn last_insert_id_query(&self) -> Option<&'static str> {
        Some("SELECT last_insert_rowid()")
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND UPPER(name) = {}",
            quote(&table.to_uppercase())
        )
    }
}
