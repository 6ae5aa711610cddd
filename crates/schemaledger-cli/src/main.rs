mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use schemaledger_config::{ConfigLoader, LedgerConfig};
use schemaledger_db::DialectKind;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "schemaledger",
    version,
    about = "Track applied schema migrations"
)]
struct Cli {
    /// Config file (YAML or TOML). Defaults to the user config dir.
    #[arg(long, global = true, env = "SCHEMALEDGER_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite database holding the ledger.
    #[arg(long, global = true)]
    database: Option<PathBuf>,

    /// Dialect: sqlite, postgres or mysql.
    #[arg(long, global = true)]
    dialect: Option<DialectKind>,

    /// Schema prefix of the ledger table.
    #[arg(long, global = true)]
    schema: Option<String>,

    /// Ledger table name.
    #[arg(long, global = true)]
    table: Option<String>,

    /// Log at debug level.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the ledger table if it does not exist.
    Init,
    /// List applied migrations, oldest id first.
    History {
        #[arg(long)]
        json: bool,
    },
    /// Append a migration to the ledger, stamped now.
    Record {
        id: String,
        #[arg(long, default_value = "")]
        checksum: String,
        #[arg(long, default_value_t = 0)]
        millis: i64,
    },
    /// Print the quoted ledger table identifier.
    Quote,
    /// Print the dialect's ledger statement for running elsewhere.
    Sql {
        #[arg(value_enum)]
        statement: commands::Statement,
    },
}

fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = resolve_config(&cli)?;
    debug!(
        "using {} ledger {} in {}",
        config.dialect,
        config.quoted_table(),
        config.database.display()
    );

    let output = match cli.command {
        Command::Init => commands::init(&config)?,
        Command::History { json } => commands::history(&config, json)?,
        Command::Record {
            id,
            checksum,
            millis,
        } => commands::record(&config, &id, &checksum, millis)?,
        Command::Quote => commands::quote(&config),
        Command::Sql { statement } => commands::sql(&config, statement),
    };
    println!("{output}");
    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// File, then environment, then command-line flags.
fn resolve_config(cli: &Cli) -> Result<LedgerConfig> {
    let config = match &cli.config {
        Some(path) => ConfigLoader::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => match ConfigLoader::default_path() {
            Some(path) => ConfigLoader::load_or_default(&path)?,
            None => LedgerConfig::default(),
        },
    };
    let mut config = ConfigLoader::apply_env(config)?;

    if let Some(database) = &cli.database {
        config.database = database.clone();
    }
    if let Some(dialect) = cli.dialect {
        config.dialect = dialect;
    }
    if let Some(schema) = &cli.schema {
        config.schema = schema.clone();
    }
    if let Some(table) = &cli.table {
        config.table = table.clone();
    }
    Ok(config)
}
