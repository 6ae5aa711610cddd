use chrono::{DateTime, Utc};
use schemaledger_common::{AppliedMigration, DecodeError, Result};

use crate::dialect::Dialect;
use crate::queryer::{Queryer, SqlValue};
use crate::{reader, timestamp};

/// Dialect for PostgreSQL databases.
#[derive(Debug, Clone, Copy, Default)]
pub struct Postgres;

impl Dialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
    }

    fn quote_char(&self) -> char {
        '"'
    }

    fn create_sql(&self, table_name: &str) -> String {
        format!(
            "CREATE TABLE IF NOT EXISTS {table_name} (
                id VARCHAR(255) NOT NULL,
                checksum TEXT NOT NULL DEFAULT '',
                execution_time_in_millis INTEGER NOT NULL DEFAULT 0,
                applied_at TIMESTAMP WITH TIME ZONE
            )"
        )
    }

    fn insert_sql(&self, table_name: &str) -> String {
        format!(
            "INSERT INTO {table_name}
                ( id, checksum, execution_time_in_millis, applied_at )
             VALUES
                ( $1, $2, $3, $4 )"
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

/// `timestamptz` arrives either decoded by the driver or as text in the
/// session time zone, e.g. `2024-01-01 10:00:00.5+01`.
fn decode_applied_at(value: &SqlValue) -> std::result::Result<DateTime<Utc>, DecodeError> {
    match value {
        SqlValue::Timestamp(at) => Ok(at.with_timezone(&Utc)),
        SqlValue::Text(s) => timestamp::parse_text(s).ok_or_else(|| timestamp::invalid(value)),
        other => Err(timestamp::unexpected(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queryer::{MockQueryer, Row, Rows};
    use chrono::{FixedOffset, Local, TimeZone};

    fn ledger_row(id: &str, at: SqlValue) -> Row {
        Row::new(vec![id.into(), "sum".into(), 3i64.into(), at])
    }

    #[test]
    fn create_sql_uses_timestamptz() {
        let sql = Postgres.create_sql("\"publicschema_migrations\"");
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS \"publicschema_migrations\" ("));
        assert!(sql.contains("checksum TEXT NOT NULL DEFAULT ''"));
        assert!(sql.contains("applied_at TIMESTAMP WITH TIME ZONE"));
        assert!(!sql.contains("applied_at TIMESTAMP WITH TIME ZONE NOT NULL"));
    }

    #[test]
    fn insert_sql_uses_numbered_placeholders() {
        let sql = Postgres.insert_sql("\"t\"");
        assert!(sql.contains("( $1, $2, $3, $4 )"));
        assert!(!sql.contains('?'));
    }

    #[test]
    fn reads_driver_and_text_timestamps_as_local() {
        let tokyo = FixedOffset::east_opt(9 * 3600).unwrap();
        let native = tokyo.with_ymd_and_hms(2024, 6, 1, 9, 0, 0).unwrap();

        let mut queryer = MockQueryer::new();
        queryer
            .expect_query()
            .withf(|sql| sql.contains("FROM \"migrations\"") && sql.contains("ORDER BY id ASC"))
            .return_once(move |_| {
                Ok(Rows::new(vec![
                    ledger_row("a", SqlValue::Timestamp(native)),
                    ledger_row("b", "2024-06-01 01:00:00+01".into()),
                ]))
            });

        let migrations = Postgres
            .applied_migrations(&queryer, "\"migrations\"")
            .unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        assert_eq!(migrations.len(), 2);
        for m in &migrations {
            assert_eq!(m.applied_at, expected.with_timezone(&Local));
        }
    }

    #[test]
    fn rejects_non_timestamp_applied_at() {
        assert!(decode_applied_at(&SqlValue::Integer(0)).is_err());
        assert!(decode_applied_at(&SqlValue::Null).is_err());
        assert!(decode_applied_at(&SqlValue::Text("tomorrow".into())).is_err());
    }
}
