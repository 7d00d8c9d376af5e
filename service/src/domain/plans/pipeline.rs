//! Session controller: one end-to-end processing pass
//!
//! A pass drains the trace buffer and persists what it finds, under an
//! advisory cross-process lock. Capture is suspended for the duration and
//! the buffer is cleared only after the whole pass succeeds; any failure
//! leaves the buffer intact and restores the prior capture state, so a
//! later invocation picks up exactly where this one failed.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use rustc_hash::FxHashSet;
use sqlx::SqlitePool;
use thiserror::Error;

use super::aggregate;
use super::normalize::{NormalizeError, normalize};
use super::registry::TableRegistry;
use crate::core::constants::{LOCK_ACQUIRE_TIMEOUT_MS, LOCK_RETRY_DELAY_MS};
use crate::data::sqlite::SqliteError;
use crate::recorder::{CapturedStatement, ExecutorError, QueryExecutor, TraceBuffer};
use crate::utils::lock::ProcessLock;
use crate::utils::sql::{is_explainable, is_insert, is_transaction_control};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Record store error: {0}")]
    Store(#[from] SqliteError),

    #[error("Query executor error: {0}")]
    Executor(#[from] ExecutorError),

    #[error("Process lock error: {0}")]
    Lock(#[from] std::io::Error),
}

/// Result of one processing invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    Completed { processed: usize },
    /// Another invocation holds the process lock; nothing was touched
    AlreadyRunning,
}

/// Drives processing passes over the captured statements
pub struct SessionController {
    pool: SqlitePool,
    buffer: Arc<dyn TraceBuffer>,
    executor: Arc<dyn QueryExecutor>,
    lock_path: PathBuf,
    chunk_size: usize,
    keep_recording: bool,
}

impl SessionController {
    pub fn new(
        pool: SqlitePool,
        buffer: Arc<dyn TraceBuffer>,
        executor: Arc<dyn QueryExecutor>,
        lock_path: PathBuf,
        chunk_size: usize,
        keep_recording: bool,
    ) -> Self {
        Self {
            pool,
            buffer,
            executor,
            lock_path,
            chunk_size,
            keep_recording,
        }
    }

    /// Run one processing pass.
    ///
    /// Statements are persisted in fixed-size chunks, one transaction per
    /// chunk. A mid-pass failure keeps already committed chunks; the next
    /// pass re-processes the full buffer, which the idempotent step append
    /// absorbs. The reported count covers persisted records only, not
    /// statements skipped for lack of a plan.
    pub async fn process(&self) -> Result<ProcessOutcome, PipelineError> {
        let lock = match ProcessLock::acquire(
            &self.lock_path,
            Duration::from_millis(LOCK_ACQUIRE_TIMEOUT_MS),
            Duration::from_millis(LOCK_RETRY_DELAY_MS),
        )
        .await?
        {
            Some(lock) => lock,
            None => {
                tracing::info!("Another processing pass is running, skipping");
                return Ok(ProcessOutcome::AlreadyRunning);
            }
        };

        let was_recording = self.buffer.is_recording();
        self.buffer.stop();

        let calls = self.buffer.export().await;
        let statements: Vec<CapturedStatement> = calls
            .into_iter()
            .flat_map(|call| call.statements)
            .filter(|stmt| !is_transaction_control(&stmt.query))
            .collect();

        tracing::info!(statements = statements.len(), "Processing pass started");

        let result = self.persist_statements(&statements).await;

        match result {
            Ok(processed) => {
                self.buffer.clear().await;
                if self.keep_recording {
                    self.buffer.start();
                } else if was_recording {
                    tracing::info!("Statement capture left off after processing");
                }
                tracing::info!(processed, "Processing pass complete");
                drop(lock);
                Ok(ProcessOutcome::Completed { processed })
            }
            Err(e) => {
                // Buffer untouched; restore capture so statements keep
                // accumulating until a later pass succeeds
                if was_recording {
                    self.buffer.start();
                }
                tracing::error!(error = %e, "Processing pass failed");
                drop(lock);
                Err(e)
            }
        }
    }

    async fn persist_statements(
        &self,
        statements: &[CapturedStatement],
    ) -> Result<usize, PipelineError> {
        let own_tables = self.own_tables().await?;
        let mut registry = TableRegistry::new();
        let mut processed = 0usize;

        for chunk in statements.chunks(self.chunk_size) {
            let mut tx = self.pool.begin().await.map_err(SqliteError::from)?;

            for stmt in chunk {
                if self
                    .persist_statement(&mut *tx, &mut registry, &own_tables, stmt)
                    .await?
                {
                    processed += 1;
                }
            }

            tx.commit().await.map_err(SqliteError::from)?;
            tracing::debug!(
                processed,
                total = statements.len(),
                "Committed statement chunk"
            );
        }

        Ok(processed)
    }

    /// Persist one statement; returns whether a record was saved
    async fn persist_statement(
        &self,
        conn: &mut sqlx::SqliteConnection,
        registry: &mut TableRegistry,
        own_tables: &FxHashSet<String>,
        stmt: &CapturedStatement,
    ) -> Result<bool, PipelineError> {
        let rows = match &stmt.explain_rows {
            Some(rows) => rows.clone(),
            // Plan was never captured; resolve it now. Executor failure
            // is fatal for the invocation.
            None if is_explainable(&stmt.query) => self.executor.explain(&stmt.query).await?,
            None => Vec::new(),
        };

        if rows.is_empty() {
            // INSERTs are expected to be planless, no notice for them
            if !is_insert(&stmt.query) {
                tracing::info!(query = %stmt.query, "No plan available, skipping statement");
            }
            return Ok(false);
        }

        let mut draft = aggregate::record(conn, &stmt.query).await?;

        for raw in &rows {
            if let Some(table) = raw.get("table").and_then(|v| v.as_str())
                && own_tables.contains(table)
            {
                tracing::debug!(table, "Skipping explain row over bookkeeping table");
                continue;
            }

            match normalize(conn, registry, raw).await {
                Ok(step) => {
                    draft.apply_step(step);
                }
                Err(NormalizeError::MissingTable) => {
                    tracing::warn!(query = %stmt.query, "Malformed explain row, skipping");
                }
                Err(NormalizeError::Store(e)) => return Err(e.into()),
            }
        }

        aggregate::commit(conn, &mut draft).await?;
        Ok(true)
    }

    /// Names of the record store's own tables, resolved once per pass.
    /// Explain rows over these are bookkeeping noise, not workload.
    async fn own_tables(&self) -> Result<FxHashSet<String>, SqliteError> {
        let names: Vec<String> =
            sqlx::query_scalar("SELECT name FROM sqlite_master WHERE type = 'table'")
                .fetch_all(&self.pool)
                .await?;
        Ok(names.into_iter().collect())
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
