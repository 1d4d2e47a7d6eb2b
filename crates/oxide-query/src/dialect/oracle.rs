//! Oracle dialect.

use chrono::NaiveDateTime;

use super::{fraction7, hex, quote, Dialect, Paging, Returning};

/// Oracle dialect.
///
/// Oracle stores the empty string as NULL, so empty text is rendered as the
/// `NULL` keyword and comparisons against it become `IS [NOT] NULL`.
#[derive(Debug, Default, Clone, Copy)]
pub struct OracleDialect;

impl OracleDialect {
    /// Creates a new Oracle dialect.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Dialect for OracleDialect {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn paging(&self) -> Paging {
        Paging::OffsetFetch
    }

    fn returning(&self) -> Returning {
        Returning::ReturningInto
    }

    fn table_exists_query(&self, table: &str) -> String {
        format!(
            "SELECT TABLE_NAME FROM ALL_TABLES WHERE TABLE_NAME = {}",
            quote(&table.to_uppercase())
        )
    }

    fn text_literal(&self, text: &str) -> String {
        if text.is_empty() {
            String::from("NULL")
        } else {
            quote(text)
        }
    }

    fn blob_literal(&self, bytes: &[u8]) -> String {
        format!("HEXTORAW('{}')", hex(bytes))
    }

    fn timestamp_literal(&self, ts: &NaiveDateTime) -> String {
        format!(
            "TO_TIMESTAMP('{},{}', 'DD/MM/YYYY HH24:MI:SS,FF7')",
            ts.format("%d/%m/%Y %H:%M:%S"),
            fraction7(ts)
        )
    }
}
