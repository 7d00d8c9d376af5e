//! Table name resolution with an in-process cache
//!
//! Concurrency is settled at the store level: the UNIQUE constraint on
//! `sql_tables.name` decides the single winner, never client-side locking.
//! The cache only short-circuits repeat lookups within one pass.

use rustc_hash::FxHashMap;
use sqlx::SqliteConnection;

use crate::data::sqlite::SqliteError;
use crate::data::sqlite::repositories::tables;

/// Per-invocation table id cache over the append-only `sql_tables` registry
#[derive(Default)]
pub struct TableRegistry {
    by_name: FxHashMap<String, i64>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolve a table name to its stable id, creating the entry if needed
    pub async fn resolve(
        &mut self,
        conn: &mut SqliteConnection,
        name: &str,
    ) -> Result<i64, SqliteError> {
        if let Some(&id) = self.by_name.get(name) {
            return Ok(id);
        }

        let id = tables::find_or_create(conn, name).await?;
        self.by_name.insert(name.to_string(), id);
        Ok(id)
    }
}
