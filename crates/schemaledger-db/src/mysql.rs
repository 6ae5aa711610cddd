use chrono::{DateTime, NaiveDateTime, Utc};
use schemaledger_common::{AppliedMigration, DecodeError, Result};

use crate::dialect::Dialect;
use crate::queryer::{Queryer, SqlValue};
use crate::{reader, timestamp};

/// Dialect for MySQL and MariaDB databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySql;

impl Dialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> char {
        '`'
    }

    fn create_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (
                id VARCHAR(255) NOT NULL,
                checksum VARCHAR(64) NOT NULL DEFAULT '',
                execution_time_in_millis INTEGER NOT NULL DEFAULT 0,
                applied_at DATETIME(6) NULL
            )"
        )
    }

    fn insert_sql(&self, table_name: &str) -> String {
        format!(
            "INSERT INTO {table_name}
                ( id, checksum, execution_time_in_millis, applied_at )
             VALUES
                ( ?, ?, ?, ? )"
        )
    }

    fn applied_migrations(
        &self,
        queryer: &dyn Queryer,
        table_name: &str,
    ) -> Result<Vec<AppliedMigration>> {
        reader::read_applied_migrations(queryer, table_name, decode_applied_at)
    }
}

/// `DATETIME` carries no zone; the ledger writes UTC, so a zone-less value
/// is read as UTC even if the driver attached the session offset.
fn decode_applied_at(value: &SqlValue) -> std::result::Result<DateTime<Utc>, DecodeError> {
    match value {
        SqlValue::Timestamp(at) => Ok(at.naive_local().and_utc()),
        SqlValue::Text(s) => NaiveDateTime::parse_from_str(s.trim(), "%Y-%m-%d %H:%M:%S%.f")
            .map(|naive| naive.and_utc())
            .ok()
            .or_else(|| timestamp::parse_text(s))
            .ok_or_else(|| timestamp::invalid(value)),
        other => Err(timestamp::unexpected(other)),
    }
}
