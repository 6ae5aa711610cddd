use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, Transaction, params};
use schemaledger_common::{AppliedMigration, Error, Result};
use tracing::{debug, info};

use crate::dialect::Dialect;
use crate::sqlite::{self, Sqlite};

/// Migration ledger kept in a SQLite database.
pub struct LedgerStore {
    conn: Mutex<Connection>,
    dialect: Sqlite,
    table_name: String,
}

impl LedgerStore {
    pub fn open(db_path: &Path, schema_name: &str, table_name: &str) -> Result<Self> {
        info!("opening migration ledger at {}", db_path.display());
        let conn = Connection::open(db_path)
            .map_err(|e| Error::Database(format!("failed to open database: {e}")))?;

        conn.execute_batch("PRAGMA journal_mode=WAL;")
            .map_err(|e| Error::Database(format!("failed to set pragmas: {e}")))?;

        Self::with_connection(conn, schema_name, table_name)
    }

    pub fn in_memory(schema_name: &str, table_name: &str) -> Result<Self> {
        let conn = Connection::open_in_memory()
            .map_err(|e| Error::Database(format!("failed to open in-memory database: {e}")))?;

        Self::with_connection(conn, schema_name, table_name)
    }

    /// Wrap an already opened connection and make sure the ledger exists.
    pub fn with_connection(conn: Connection, schema_name: &str, table_name: &str) -> Result<Self> {
        let dialect = Sqlite;
        let table_name = dialect.quoted_table_name(schema_name, table_name);
        if table_name.is_empty() {
            return Err(Error::Config("ledger table name is empty".into()));
        }

        let store = Self {
            conn: Mutex::new(conn),
            dialect,
            table_name,
        };
        store.ensure_table()?;
        Ok(store)
    }

    /// Quoted name of the ledger table.
    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    fn connection(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Database("ledger store lock poisoned".into()))
    }

    /// Create the ledger table if it does not exist yet. Safe to repeat.
    pub fn ensure_table(&self) -> Result<()> {
        let conn = self.connection()?;
        conn.execute_batch(&self.dialect.create_sql(&self.table_name))
            .map_err(|e| {
                Error::Database(format!(
                    "failed to create ledger table {}: {e}",
                    self.table_name
                ))
            })?;
        debug!("ledger table {} is present", self.table_name);
        Ok(())
    }

    /// Append one row to the ledger.
    pub fn record(&self, migration: &AppliedMigration) -> Result<()> {
        let conn = self.connection()?;
        conn.execute(
            &self.dialect.insert_sql(&self.table_name),
            params![
                migration.id,
                migration.checksum,
                migration.execution_time_in_millis,
                sqlite::format_timestamp(&migration.applied_at),
            ],
        )
        .map_err(|e| {
            Error::Database(format!(
                "failed to record migration {} in {}: {e}",
                migration.id, self.table_name
            ))
        })?;

        info!("recorded migration {}", migration.id);
        Ok(())
    }

    /// Every applied migration, ascending by id.
    pub fn applied(&self) -> Result<Vec<AppliedMigration>> {
        let conn = self.connection()?;
        self.dialect.applied_migrations(&*conn, &self.table_name)
    }

    /// Run `f` inside a transaction, committing when it returns `Ok`.
    /// The transaction is rolled back on error or panic.
    pub fn with_transaction<T>(
        &self,
        f: impl FnOnce(&Transaction<'_>, &str) -> Result<T>,
    ) -> Result<T> {
        let mut conn = self.connection()?;
        let tx = conn
            .transaction()
            .map_err(|e| Error::Database(format!("failed to begin transaction: {e}")))?;

        let value = f(&tx, &self.table_name)?;

        tx.commit()
            .map_err(|e| Error::Database(format!("failed to commit transaction: {e}")))?;
        Ok(value)
    }
}
