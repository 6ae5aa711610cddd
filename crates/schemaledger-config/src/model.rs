use std::path::PathBuf;

use schemaledger_db::DialectKind;
use serde::{Deserialize, Serialize};

pub const DEFAULT_TABLE: &str = "schema_migrations";
pub const DEFAULT_DATABASE: &str = "schemaledger.db";

/// Where the ledger lives and how its table is named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// SQLite database file. Ignored when only printing SQL.
    pub database: PathBuf,
    pub dialect: DialectKind,
    /// Prefix concatenated in front of `table` when quoting.
    pub schema: String,
    pub table: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            dialect: DialectKind::default(),
            schema: String::new(),
            table: DEFAULT_TABLE.to_string(),
        }
    }
}

impl LedgerConfig {
    /// Ledger table name quoted for the configured dialect.
    pub fn quoted_table(&self) -> String {
        self.dialect
            .dialect()
            .quoted_table_name(&self.schema, &self.table)
    }
}
