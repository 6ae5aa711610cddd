use anyhow::{Context, Result, bail};
use clap::ValueEnum;
use schemaledger_common::{AppliedMigration, to_json};
use schemaledger_config::LedgerConfig;
use schemaledger_db::{DialectKind, LedgerStore};
use tracing::info;

/// Ledger statements printable with `schemaledger sql`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Statement {
    Create,
    Insert,
    Select,
}

fn open_store(config: &LedgerConfig) -> Result<LedgerStore> {
    if config.dialect != DialectKind::Sqlite {
        bail!(
            "this command needs a SQLite database; for {} use `schemaledger sql` \
             and run the statement with your own client",
            config.dialect
        );
    }
    LedgerStore::open(&config.database, &config.schema, &config.table)
        .with_context(|| format!("failed to open ledger in {}", config.database.display()))
}

pub fn init(config: &LedgerConfig) -> Result<String> {
    let store = open_store(config)?;
    info!("ledger table {} ready", store.table_name());
    Ok(format!(
        "ledger table {} ready in {}",
        store.table_name(),
        config.database.display()
    ))
}

pub fn history(config: &LedgerConfig, json: bool) -> Result<String> {
    let store = open_store(config)?;
    let applied = store.applied()?;

    if json {
        return Ok(to_json(&applied)?);
    }
    Ok(render_table(&applied))
}

pub fn record(config: &LedgerConfig, id: &str, checksum: &str, millis: i64) -> Result<String> {
    if id.trim().is_empty() {
        bail!("migration id cannot be empty");
    }
    let store = open_store(config)?;
    if store.applied()?.iter().any(|m| m.id == id) {
        bail!(
            "migration {id} is already recorded in {}",
            store.table_name()
        );
    }

    let migration = AppliedMigration::new(id, checksum, millis);
    store.record(&migration)?;
    Ok(format!("recorded {id}"))
}

pub fn quote(config: &LedgerConfig) -> String {
    config.quoted_table()
}

pub fn sql(config: &LedgerConfig, statement: Statement) -> String {
    let dialect = config.dialect.dialect();
    let table = config.quoted_table();
    let text = match statement {
        Statement::Create => dialect.create_sql(&table),
        Statement::Insert => dialect.insert_sql(&table),
        Statement::Select => dialect.select_sql(&table),
    };
    dedent(&text)
}

fn render_table(applied: &[AppliedMigration]) -> String {
    if applied.is_empty() {
        return "no migrations applied".to_string();
    }

    let id_w = applied.iter().map(|m| m.id.len()).max().unwrap_or(0).max(2);
    let sum_w = applied
        .iter()
        .map(|m| m.checksum.len())
        .max()
        .unwrap_or(0)
        .max(8);

    let mut out = format!(
        "{:<id_w$}  {:<sum_w$}  {:>8}  APPLIED AT",
        "ID", "CHECKSUM", "MILLIS"
    );
    for m in applied {
        out.push('\n');
        out.push_str(&format!(
            "{:<id_w$}  {:<sum_w$}  {:>8}  {}",
            m.id,
            m.checksum,
            m.execution_time_in_millis,
            m.applied_at.format("%Y-%m-%d %H:%M:%S %:z")
        ));
    }
    out
}

/// Strip the source indentation from a generated statement.
fn dedent(sql: &str) -> String {
    sql.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
