//! Ledger reader shared by every dialect. Dialects differ only in how the
//! `applied_at` column comes back from their driver.

use chrono::{DateTime, Local, Utc};
use schemaledger_common::{AppliedMigration, DecodeError, Error, QueryErrorKind, Result};
use tracing::{debug, warn};

use crate::queryer::{Queryer, Row, SqlValue};

pub(crate) type TimestampDecoder = fn(&SqlValue) -> std::result::Result<DateTime<Utc>, DecodeError>;

const COLUMNS: [&str; 4] = ["id", "checksum", "execution_time_in_millis", "applied_at"];

pub(crate) fn select_sql(table_name: &str) -> String {
    format!(
        "SELECT id, checksum, execution_time_in_millis, applied_at
         FROM {table_name}
         ORDER BY id ASC"
    )
}

pub(crate) fn read_applied_migrations(
    queryer: &dyn Queryer,
    table_name: &str,
    decode_applied_at: TimestampDecoder,
) -> Result<Vec<AppliedMigration>> {
    let rows = queryer
        .query(&select_sql(table_name))
        .map_err(|source| match source.kind() {
            QueryErrorKind::UnknownColumn => {
                warn!("ledger table {table_name} is missing a column: {source}");
                Error::SchemaDrift {
                    table: table_name.to_string(),
                    decoded: 0,
                    source: DecodeError::ColumnRejected(source.to_string()),
                }
            }
            QueryErrorKind::Other => Error::Query {
                table: table_name.to_string(),
                source,
            },
        })?;

    let mut migrations = Vec::with_capacity(rows.size_hint().0);
    for row in rows {
        let migration = decode_row(&row, decode_applied_at).map_err(|source| {
            warn!("ledger table {table_name} has an unexpected row shape: {source}");
            Error::SchemaDrift {
                table: table_name.to_string(),
                decoded: migrations.len(),
                source,
            }
        })?;
        migrations.push(migration);
    }

    debug!(
        "read {} applied migrations from {table_name}",
        migrations.len()
    );
    Ok(migrations)
}

fn decode_row(
    row: &Row,
    decode_applied_at: TimestampDecoder,
) -> std::result::Result<AppliedMigration, DecodeError> {
    let id = match column(row, 0)? {
        SqlValue::Text(s) => s.clone(),
        SqlValue::Integer(i) => i.to_string(),
        other => return Err(unexpected(0, "text", other)),
    };

    let checksum = match column(row, 1)? {
        SqlValue::Text(s) => s.clone(),
        other => return Err(unexpected(1, "text", other)),
    };

    let execution_time_in_millis = match column(row, 2)? {
        SqlValue::Integer(i) => *i,
        SqlValue::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|_| unexpected(2, "integer", &SqlValue::Text(s.clone())))?,
        other => return Err(unexpected(2, "integer", other)),
    };
    if execution_time_in_millis < 0 {
        return Err(DecodeError::NegativeDuration(execution_time_in_millis));
    }

    let applied_at = decode_applied_at(column(row, 3)?)?.with_timezone(&Local);

    Ok(AppliedMigration {
        id,
        checksum,
        execution_time_in_millis,
        applied_at,
    })
}

fn column(row: &Row, index: usize) -> std::result::Result<&SqlValue, DecodeError> {
    row.get(index).ok_or(DecodeError::MissingColumn {
        column: COLUMNS[index],
        index,
    })
}

fn unexpected(index: usize, expected: &'static str, found: &SqlValue) -> DecodeError {
    DecodeError::UnexpectedType {
        column: COLUMNS[index],
        expected,
        found: found.type_name(),
    }
}
