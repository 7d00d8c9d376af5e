//! Table registry repository
//!
//! `sql_tables` is append-only. The UNIQUE constraint on `name` is the
//! single winner under concurrent resolution: INSERT OR IGNORE followed by
//! a re-read yields the same id no matter which writer got there first.

use sqlx::SqliteConnection;

use crate::data::sqlite::SqliteError;

/// Resolve a table name to its id, creating the entry if needed
pub async fn find_or_create(conn: &mut SqliteConnection, name: &str) -> Result<i64, SqliteError> {
    let now = chrono::Utc::now().timestamp();

    sqlx::query("INSERT OR IGNORE INTO sql_tables (name, created_at) VALUES (?, ?)")
        .bind(name)
        .bind(now)
        .execute(&mut *conn)
        .await?;

    let id: i64 = sqlx::query_scalar("SELECT id FROM sql_tables WHERE name = ?")
        .bind(name)
        .fetch_one(&mut *conn)
        .await?;

    Ok(id)
}
