//! Raw EXPLAIN row normalization
//!
//! Maps one untyped engine row onto a typed plan step. Numeric fields
//! coerce loosely (the engine emits them as strings in some versions),
//! nullable text fields pass through including null. Given the same raw
//! row and registry state the output is identical.

use serde_json::Value;
use sqlx::SqliteConnection;
use thiserror::Error;

use super::registry::TableRegistry;
use crate::data::sqlite::SqliteError;
use crate::data::types::PlanStep;
use crate::recorder::ExplainRow;
use crate::utils::json::{coerce_f64, coerce_i64, opt_text};

#[derive(Error, Debug)]
pub enum NormalizeError {
    /// The row names no table; the caller skips it with a warning
    #[error("Explain row has no table reference")]
    MissingTable,

    #[error(transparent)]
    Store(#[from] SqliteError),
}

/// A normalized plan step together with the table name it references
#[derive(Debug, Clone)]
pub struct NormalizedStep {
    pub table_name: String,
    pub step: PlanStep,
}

/// Normalize one raw EXPLAIN row, resolving its table through the registry
pub async fn normalize(
    conn: &mut SqliteConnection,
    registry: &mut TableRegistry,
    raw: &ExplainRow,
) -> Result<NormalizedStep, NormalizeError> {
    let table = raw
        .get("table")
        .and_then(Value::as_str)
        .filter(|t| !t.is_empty())
        .ok_or(NormalizeError::MissingTable)?;

    let table_ref = registry.resolve(conn, table).await?;

    Ok(NormalizedStep {
        table_name: table.to_string(),
        step: PlanStep {
            step_id: coerce_i64(raw.get("id")),
            select_type: opt_text(raw.get("select_type")),
            table_ref,
            access_type: opt_text(raw.get("type")),
            possible_keys: opt_text(raw.get("possible_keys")),
            chosen_key: opt_text(raw.get("key")),
            key_length: coerce_i64(raw.get("key_len")),
            ref_clause: opt_text(raw.get("ref")),
            extra: opt_text(raw.get("Extra")),
            rows_estimate: coerce_i64(raw.get("rows")),
            filtered_pct: coerce_f64(raw.get("filtered")),
        },
    })
}
