use chrono::{DateTime, TimeZone, Utc};
use schemaledger_common::{AppliedMigration, DecodeError, Result};

use crate::dialect::Dialect;
use crate::queryer::{Queryer, SqlValue};
use crate::{reader, timestamp};

/// Layout `applied_at` is written in; read back by [`Sqlite::applied_migrations`].
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.9f%:z";

/// Dialect for SQLite databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sqlite;

impl Dialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn create_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (
                id TEXT NOT NULL,
                checksum TEXT NOT NULL DEFAULT '',
                execution_time_in_millis INTEGER NOT NULL DEFAULT 0,
                applied_at DATETIME
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

/// Render a timestamp the way the SQLite ledger stores it.
pub fn format_timestamp<Tz: TimeZone>(at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    at.format(TIMESTAMP_FORMAT).to_string()
}

/// SQLite has no timestamp type: text in the usual layouts (offset-less
/// means UTC), integer Unix seconds, or a real Julian day.
fn decode_applied_at(value: &SqlValue) -> std::result::Result<DateTime<Utc>, DecodeError> {
    match value {
        SqlValue::Text(s) => timestamp::parse_text(s).ok_or_else(|| timestamp::invalid(value)),
        SqlValue::Integer(secs) => {
            timestamp::from_unix_seconds(*secs).ok_or_else(|| timestamp::invalid(value))
        }
        SqlValue::Real(day) => {
            timestamp::from_julian_day(*day).ok_or_else(|| timestamp::invalid(value))
        }
        SqlValue::Timestamp(at) => Ok(at.with_timezone(&Utc)),
        SqlValue::Null | SqlValue::Blob(_) => Err(timestamp::unexpected(value)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    #[test]
    fn create_sql_is_idempotent_ddl() {
        let sql = Sqlite.create_sql("\"schema_migrations\"");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"schema_migrations\" ("));
        assert!(sql.contains("id TEXT NOT NULL"));
        assert!(sql.contains("checksum TEXT NOT NULL DEFAULT ''"));
        assert!(sql.contains("execution_time_in_millis INTEGER NOT NULL DEFAULT 0"));
        assert!(sql.contains("applied_at DATETIME"));
    }

    #[test]
    fn insert_sql_binds_four_positional_parameters() {
        let sql = Sqlite.insert_sql("\"t\"");
        assert!(sql.contains("INSERT INTO \"t\""));
        assert!(sql.contains("( id, checksum, execution_time_in_millis, applied_at )"));
        assert_eq!(sql.matches('?').count(), 4);
    }

    #[test]
    fn format_timestamp_round_trips_through_decoder() {
        let offset = FixedOffset::east_opt(5 * 3600 + 1800).unwrap();
        let at = offset.with_ymd_and_hms(2024, 2, 29, 23, 59, 58).unwrap();
        let text = format_timestamp(&at);
        assert_eq!(text, "2024-02-29 23:59:58.000000000+05:30");

        let decoded = decode_applied_at(&SqlValue::Text(text)).unwrap();
        assert_eq!(decoded, at.with_timezone(&Utc));
    }

    #[test]
    fn decoder_accepts_numeric_storage_classes() {
        let epoch = Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(decode_applied_at(&SqlValue::Integer(0)).unwrap(), epoch);
        assert_eq!(decode_applied_at(&SqlValue::Real(2_440_587.5)).unwrap(), epoch);
        assert!(decode_applied_at(&SqlValue::Null).is_err());
        assert!(decode_applied_at(&SqlValue::Blob(vec![0])).is_err());
    }
}
