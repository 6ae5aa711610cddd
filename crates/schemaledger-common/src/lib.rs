pub mod error;
pub mod migration;

pub use error::{BoxError, DecodeError, Error, QueryError, QueryErrorKind, Result};
pub use migration::{AppliedMigration, to_json};
