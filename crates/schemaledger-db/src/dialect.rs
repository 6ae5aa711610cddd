use std::fmt;
use std::str::FromStr;

use schemaledger_common::{AppliedMigration, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::queryer::Queryer;
use crate::{MySql, Postgres, Sqlite, quote, reader};

/// Backend-specific strategy for the migration ledger table.
///
/// Implementations are stateless; callers hold one per target connection
/// (usually as `Box<dyn Dialect>`) and never branch on the backend.
pub trait Dialect: Send + Sync {
    /// Stable lowercase name, e.g. `sqlite`.
    fn name(&self) -> &'static str;

    /// Character used to delimit identifiers.
    fn quote_char(&self) -> char;

    /// Idempotent DDL creating the ledger table when it is absent.
    fn create_sql(&self, table_name: &str) -> String;

    /// Insert template with four placeholders bound as
    /// `(id, checksum, execution_time_in_millis, applied_at)`.
    fn insert_sql(&self, table_name: &str) -> String;

    /// Select of the whole ledger, ascending by `id`.
    fn select_sql(&self, table_name: &str) -> String {
        reader::select_sql(table_name)
    }

    /// Read every applied migration, ordered by `id`, with `applied_at`
    /// in local time.
    fn applied_migrations(
        &self,
        queryer: &dyn Queryer,
        table_name: &str,
    ) -> Result<Vec<AppliedMigration>>;

    /// Quote `schema_name` + `table_name` as one identifier.
    fn quoted_table_name(&self, schema_name: &str, table_name: &str) -> String {
        quote::quote_identifier(self.quote_char(), schema_name, table_name)
    }
}

/// Supported backends, as named in configuration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    #[serde(alias = "sqlite3")]
    Sqlite,
    #[serde(alias = "postgresql", alias = "pg")]
    Postgres,
    #[serde(alias = "mariadb")]
    Mysql,
}

impl DialectKind {
    pub const ALL: [DialectKind; 3] = [
        DialectKind::Sqlite,
        DialectKind::Postgres,
        DialectKind::Mysql,
    ];

    /// Build a fresh, caller-owned dialect.
    pub fn dialect(self) -> Box<dyn Dialect> {
        match self {
            DialectKind::Sqlite => Box::new(Sqlite),
            DialectKind::Postgres => Box::new(Postgres),
            DialectKind::Mysql => Box::new(MySql),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DialectKind::Sqlite => "sqlite",
            DialectKind::Postgres => "postgres",
            DialectKind::Mysql => "mysql",
        }
    }
}

impl fmt::Display for DialectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown dialect `{0}` (expected sqlite, postgres or mysql)")]
pub struct UnknownDialect(pub String);

impl FromStr for DialectKind {
    type Err = UnknownDialect;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(DialectKind::Sqlite),
            "postgres" | "postgresql" | "pg" => Ok(DialectKind::Postgres),
            "mysql" | "mariadb" => Ok(DialectKind::Mysql),
            _ => Err(UnknownDialect(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("sqlite".parse(), Ok(DialectKind::Sqlite));
        assert_eq!("SQLite3".parse(), Ok(DialectKind::Sqlite));
        assert_eq!("postgresql".parse(), Ok(DialectKind::Postgres));
        assert_eq!(" pg ".parse(), Ok(DialectKind::Postgres));
        assert_eq!("MariaDB".parse(), Ok(DialectKind::Mysql));
        assert_eq!(
            "oracle".parse::<DialectKind>(),
            Err(UnknownDialect("oracle".into()))
        );
    }

    #[test]
    fn built_dialect_reports_its_kind() {
        for kind in DialectKind::ALL {
            let dialect = kind.dialect();
            assert_eq!(dialect.name(), kind.as_str());
            assert_eq!(dialect.name().parse(), Ok(kind));
        }
    }

    #[test]
    fn serde_uses_lowercase_names() {
        let json = serde_json::to_string(&DialectKind::Postgres).unwrap();
        assert_eq!(json, r#""postgres""#);
        let kind: DialectKind = serde_json::from_str(r#""mariadb""#).unwrap();
        assert_eq!(kind, DialectKind::Mysql);
    }

    #[test]
    fn quoting_follows_each_dialect_quote_char() {
        let cases = [
            (DialectKind::Sqlite, "", "t", "\"t\""),
            (DialectKind::Postgres, "app", "t", "\"appt\""),
            (DialectKind::Mysql, "", "t`x", "`t``x`"),
        ];
        for (kind, schema, table, quoted) in cases {
            assert_eq!(kind.dialect().quoted_table_name(schema, table), quoted);
        }
    }
}
