//! Query record aggregation
//!
//! A draft is the in-memory working copy of one query record: its persisted
//! steps plus any steps the current pass adds. Step appends are idempotent
//! under shape equality, and the tables summary is recomputed from the full
//! step list so the invariant (distinct table names, first-seen order)
//! holds no matter how the steps arrived.

use sqlx::SqliteConnection;

use super::normalize::NormalizedStep;
use crate::data::sqlite::SqliteError;
use crate::data::sqlite::repositories::queries;
use crate::data::types::PlanStep;

struct DraftStep {
    step: PlanStep,
    table_name: String,
    persisted: bool,
}

/// Working copy of one query record during a processing pass
pub struct QueryDraft {
    /// Record id once persisted; None for a new, unsaved record
    pub id: Option<i64>,
    pub query_text: String,
    steps: Vec<DraftStep>,
}

impl QueryDraft {
    /// Append a step unless an existing step already has the same shape.
    /// Returns whether the step was added.
    pub fn apply_step(&mut self, normalized: NormalizedStep) -> bool {
        if self
            .steps
            .iter()
            .any(|existing| existing.step.same_shape(&normalized.step))
        {
            return false;
        }
        self.steps.push(DraftStep {
            step: normalized.step,
            table_name: normalized.table_name,
            persisted: false,
        });
        true
    }

    /// Distinct table names over all steps, in first-seen order
    pub fn tables_summary(&self) -> Vec<&str> {
        let mut seen: Vec<&str> = Vec::new();
        for draft_step in &self.steps {
            if !seen.contains(&draft_step.table_name.as_str()) {
                seen.push(&draft_step.table_name);
            }
        }
        seen
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    fn summary_json(&self) -> String {
        serde_json::to_string(&self.tables_summary()).unwrap_or_else(|_| "[]".to_string())
    }
}

/// Load the draft for a statement text: the existing record with its
/// persisted steps, or a fresh unsaved draft.
pub async fn record(conn: &mut SqliteConnection, text: &str) -> Result<QueryDraft, SqliteError> {
    match queries::find_by_text(conn, text).await? {
        Some(row) => {
            let steps = queries::load_steps(conn, row.id)
                .await?
                .into_iter()
                .map(|(step, table_name)| DraftStep {
                    step,
                    table_name,
                    persisted: true,
                })
                .collect();
            Ok(QueryDraft {
                id: Some(row.id),
                query_text: row.query_text,
                steps,
            })
        }
        None => Ok(QueryDraft {
            id: None,
            query_text: text.to_string(),
            steps: Vec::new(),
        }),
    }
}

/// Persist a draft: insert a new record or update the existing one.
///
/// Only steps added this pass are inserted; occurrence_count is never
/// touched here (that belongs to the compactor).
pub async fn commit(conn: &mut SqliteConnection, draft: &mut QueryDraft) -> Result<(), SqliteError> {
    let now = chrono::Utc::now().timestamp();
    let summary = draft.summary_json();

    let query_id = match draft.id {
        Some(id) => {
            queries::update_summary(conn, id, &summary, now).await?;
            id
        }
        None => {
            let id = queries::insert(conn, &draft.query_text, &summary, now).await?;
            draft.id = Some(id);
            id
        }
    };

    for draft_step in draft.steps.iter_mut().filter(|s| !s.persisted) {
        queries::insert_step(conn, query_id, &draft_step.step).await?;
        draft_step.persisted = true;
    }

    Ok(())
}
