pub mod dialect;
pub mod mysql;
pub mod postgres;
pub mod queryer;
pub mod quote;
mod reader;
pub mod sqlite;
pub mod store;
mod timestamp;

pub use dialect::{Dialect, DialectKind, UnknownDialect};
pub use mysql::MySql;
pub use postgres::Postgres;
pub use queryer::{Queryer, Row, Rows, SqlValue};
pub use quote::quote_identifier;
pub use sqlite::Sqlite;
pub use store::LedgerStore;
