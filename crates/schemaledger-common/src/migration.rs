use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One row of the migration ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedMigration {
    pub id: String,
    #[serde(default)]
    pub checksum: String,
    #[serde(default)]
    pub execution_time_in_millis: i64,
    pub applied_at: DateTime<Local>,
}

impl AppliedMigration {
    /// Build a record stamped with the current local time.
    pub fn new(id: impl Into<String>, checksum: impl Into<String>, millis: i64) -> Self {
        Self {
            id: id.into(),
            checksum: checksum.into(),
            execution_time_in_millis: millis.max(0),
            applied_at: Local::now(),
        }
    }

    pub fn with_applied_at(mut self, applied_at: DateTime<Local>) -> Self {
        self.applied_at = applied_at;
        self
    }
}

/// Pretty-printed JSON array of ledger rows, in the order given.
pub fn to_json(applied: &[AppliedMigration]) -> Result<String> {
    Ok(serde_json::to_string_pretty(applied)?)
}
