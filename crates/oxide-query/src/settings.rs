//! Connection settings loaded from configuration files.

use serde::{Deserialize, Serialize};

use crate::dialect::{Dialect, OracleDialect, SqlServerDialect, SqliteDialect};

/// Database engine behind a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    /// SQLite.
    Sqlite,
    /// Microsoft SQL Server.
    SqlServer,
    /// Oracle.
    Oracle,
}

impl ProviderKind {
    /// Returns the dialect statements are compiled with.
    #[must_use]
    pub fn dialect(self) -> &'static dyn Dialect {
        match self {
            Self::Sqlite => &SqliteDialect,
            Self::SqlServer => &SqlServerDialect,
            Self::Oracle => &OracleDialect,
        }
    }
}

/// Settings a provider opens its connection from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionSettings {
    /// Database engine.
    pub provider: ProviderKind,
    /// Engine-specific database location; `:memory:` for an in-memory
    /// SQLite database.
    pub database: String,
    /// Enables foreign key enforcement where the engine makes it optional.
    #[serde(default)]
    pub foreign_keys: bool,
}

impl ConnectionSettings {
    /// Settings for an in-memory SQLite database.
    #[must_use]
    pub fn sqlite_in_memory() -> Self {
        Self {
            provider: ProviderKind::Sqlite,
            database: String::from(":memory:"),
            foreign_keys: true,
        }
    }

    /// Returns the dialect of the configured provider.
    #[must_use]
    pub fn dialect(&self) -> &'static dyn Dialect {
        self.provider.dialect()
    }
}
