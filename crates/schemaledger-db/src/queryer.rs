use chrono::{DateTime, FixedOffset};
use rusqlite::types::ValueRef;
use rusqlite::{Connection, Transaction};
use schemaledger_common::QueryError;

/// A single column value as returned by a backend driver.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
    /// Already decoded by a driver that understands timestamp columns.
    Timestamp(DateTime<FixedOffset>),
}

impl SqlValue {
    pub fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Null => "NULL",
            SqlValue::Integer(_) => "INTEGER",
            SqlValue::Real(_) => "REAL",
            SqlValue::Text(_) => "TEXT",
            SqlValue::Blob(_) => "BLOB",
            SqlValue::Timestamp(_) => "TIMESTAMP",
        }
    }
}

impl From<ValueRef<'_>> for SqlValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => SqlValue::Null,
            ValueRef::Integer(i) => SqlValue::Integer(i),
            ValueRef::Real(f) => SqlValue::Real(f),
            // Invalid UTF-8 stays raw so decoding reports it instead of rewriting it.
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(s) => SqlValue::Text(s.to_string()),
                Err(_) => SqlValue::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => SqlValue::Blob(b.to_vec()),
        }
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Integer(value)
    }
}

/// One fetched row, columns in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row(Vec<SqlValue>);

impl Row {
    pub fn new(values: Vec<SqlValue>) -> Self {
        Self(values)
    }

    pub fn get(&self, index: usize) -> Option<&SqlValue> {
        self.0.get(index)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<SqlValue>> for Row {
    fn from(values: Vec<SqlValue>) -> Self {
        Self(values)
    }
}

/// Result cursor handed back by a `Queryer`. Dropping it releases the rows.
#[derive(Debug, Default)]
pub struct Rows {
    inner: std::vec::IntoIter<Row>,
}

impl Rows {
    pub fn new(rows: Vec<Row>) -> Self {
        Self {
            inner: rows.into_iter(),
        }
    }
}

impl Iterator for Rows {
    type Item = Row;

    fn next(&mut self) -> Option<Row> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Read-only query capability supplied by the caller: a connection or an
/// open transaction. Ledger reads go through it; writes never do.
#[cfg_attr(test, mockall::automock)]
pub trait Queryer {
    fn query(&self, sql: &str) -> Result<Rows, QueryError>;
}

impl Queryer for Connection {
    fn query(&self, sql: &str) -> Result<Rows, QueryError> {
        // The statement is finalized when it goes out of scope, on every path.
        let mut stmt = self.prepare(sql).map_err(classify)?;
        let columns = stmt.column_count();
        let mut rows = stmt.query([]).map_err(classify)?;

        let mut fetched = Vec::new();
        while let Some(row) = rows.next().map_err(classify)? {
            let mut values = Vec::with_capacity(columns);
            for i in 0..columns {
                values.push(SqlValue::from(row.get_ref(i).map_err(classify)?));
            }
            fetched.push(Row::new(values));
        }
        Ok(Rows::new(fetched))
    }
}

impl Queryer for Transaction<'_> {
    fn query(&self, sql: &str) -> Result<Rows, QueryError> {
        let conn: &Connection = self;
        Queryer::query(conn, sql)
    }
}

fn classify(e: rusqlite::Error) -> QueryError {
    if e.to_string().contains("no such column") {
        QueryError::unknown_column(e)
    } else {
        QueryError::other(e)
    }
}
