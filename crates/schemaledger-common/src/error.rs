use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Boxed driver error, kept opaque so any backend can report through it.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("failed to query applied migrations from {table}: {source}")]
    Query {
        table: String,
        #[source]
        source: QueryError,
    },

    #[error(
        "failed to read applied migrations: did somebody change the structure of the {table} table? {source}"
    )]
    SchemaDrift {
        table: String,
        /// Rows successfully decoded before the mismatch.
        decoded: usize,
        #[source]
        source: DecodeError,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Whether the failure means the ledger table no longer has the
    /// expected shape.
    pub fn is_schema_drift(&self) -> bool {
        matches!(self, Error::SchemaDrift { .. })
    }

    /// Table the failing ledger operation ran against, if any.
    pub fn table(&self) -> Option<&str> {
        match self {
            Error::Query { table, .. } | Error::SchemaDrift { table, .. } => Some(table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryErrorKind {
    /// The backend rejected the statement because a named column is gone.
    UnknownColumn,
    Other,
}

/// Failure reported by a `Queryer` when a read could not be executed.
#[derive(Error, Debug)]
#[error("{source}")]
pub struct QueryError {
    kind: QueryErrorKind,
    #[source]
    source: BoxError,
}

impl QueryError {
    pub fn new(kind: QueryErrorKind, source: impl Into<BoxError>) -> Self {
        Self {
            kind,
            source: source.into(),
        }
    }

    pub fn other(source: impl Into<BoxError>) -> Self {
        Self::new(QueryErrorKind::Other, source)
    }

    pub fn unknown_column(source: impl Into<BoxError>) -> Self {
        Self::new(QueryErrorKind::UnknownColumn, source)
    }

    pub fn kind(&self) -> QueryErrorKind {
        self.kind
    }
}

/// A fetched ledger row that does not match the four-column layout.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    #[error("row has no `{column}` column (index {index})")]
    MissingColumn { column: &'static str, index: usize },

    #[error("column `{column}` holds {found}, expected {expected}")]
    UnexpectedType {
        column: &'static str,
        expected: &'static str,
        found: &'static str,
    },

    #[error("column `execution_time_in_millis` is negative: {0}")]
    NegativeDuration(i64),

    #[error("column `applied_at` holds an unrecognised timestamp: {0}")]
    InvalidTimestamp(String),

    #[error("backend rejected a ledger column: {0}")]
    ColumnRejected(String),
}
