//! Query executor against the observed database

use async_trait::async_trait;
use serde_json::Value;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row};
use thiserror::Error;

use super::ExplainRow;
use crate::core::constants::MYSQL_MAX_CONNECTIONS;

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Query executor not configured: set executor.mysql_url")]
    NotConfigured,

    #[error("Unsupported database engine: {0}")]
    UnsupportedEngine(String),
}

/// Resolves EXPLAIN metadata for a statement
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    async fn explain(&self, sql: &str) -> Result<Vec<ExplainRow>, ExecutorError>;
}

/// Executor over a MariaDB/MySQL connection pool running classic
/// `EXPLAIN <statement>`
pub struct MySqlExecutor {
    pool: MySqlPool,
}

impl MySqlExecutor {
    /// Connect to the observed database and verify engine compatibility
    pub async fn connect(url: &str) -> Result<Self, ExecutorError> {
        let pool = MySqlPoolOptions::new()
            .max_connections(MYSQL_MAX_CONNECTIONS)
            .connect(url)
            .await?;

        let executor = Self { pool };
        executor.check_engine_compatibility().await?;
        Ok(executor)
    }

    /// Refuse to attach to engines whose EXPLAIN output we cannot interpret
    async fn check_engine_compatibility(&self) -> Result<(), ExecutorError> {
        let version: String = sqlx::query_scalar("SELECT VERSION()")
            .fetch_one(&self.pool)
            .await?;

        let lowered = version.to_lowercase();
        let is_mariadb = lowered.contains("mariadb");
        let is_mysql = version.chars().next().is_some_and(|c| c.is_ascii_digit()) && !is_mariadb;

        if !is_mariadb && !is_mysql {
            return Err(ExecutorError::UnsupportedEngine(version));
        }

        tracing::debug!(version = %version, "Query executor attached");
        Ok(())
    }
}

#[async_trait]
impl QueryExecutor for MySqlExecutor {
    async fn explain(&self, sql: &str) -> Result<Vec<ExplainRow>, ExecutorError> {
        let statement = format!("EXPLAIN {}", sql);
        let rows = sqlx::query(&statement).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(row_to_map).collect())
    }
}

/// Convert one EXPLAIN result row into an untyped field map.
///
/// Column types vary across engine versions, so decoding falls through
/// text, signed, unsigned, and float before giving up with null.
fn row_to_map(row: &MySqlRow) -> ExplainRow {
    let mut map = ExplainRow::new();
    for (i, column) in row.columns().iter().enumerate() {
        let value = if let Ok(v) = row.try_get::<Option<String>, _>(i) {
            v.map(Value::String).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<i64>, _>(i) {
            v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<u64>, _>(i) {
            v.map(|n| Value::Number(n.into())).unwrap_or(Value::Null)
        } else if let Ok(v) = row.try_get::<Option<f64>, _>(i) {
            v.and_then(serde_json::Number::from_f64)
                .map(Value::Number)
                .unwrap_or(Value::Null)
        } else {
            Value::Null
        };
        map.insert(column.name().to_string(), value);
    }
    map
}

/// Placeholder executor used when no observed database is configured.
///
/// Processing succeeds as long as every captured statement already carries
/// its plan; anything needing a live EXPLAIN fails the pass.
pub struct UnconfiguredExecutor;

#[async_trait]
impl QueryExecutor for UnconfiguredExecutor {
    async fn explain(&self, _sql: &str) -> Result<Vec<ExplainRow>, ExecutorError> {
        Err(ExecutorError::NotConfigured)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_executor_always_fails() {
        let executor = UnconfiguredExecutor;
        assert!(matches!(
            executor.explain("SELECT 1").await,
            Err(ExecutorError::NotConfigured)
        ));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            ExecutorError::NotConfigured.to_string(),
            "Query executor not configured: set executor.mysql_url"
        );
        assert!(
            ExecutorError::UnsupportedEngine("5.5.5-TiDB".to_string())
                .to_string()
                .contains("TiDB")
        );
    }
}
