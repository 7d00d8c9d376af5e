//! Shared data types for the record store

/// One recorded query with its aggregated metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRow {
    pub id: i64,
    pub query_text: String,
    /// JSON array of distinct table names in first-seen order
    pub tables_summary: String,
    pub occurrence_count: i64,
    pub created_at: i64,
    pub updated_at: i64,
}

/// One normalized EXPLAIN step of a query plan.
///
/// Two steps have the same shape when every field except the volatile
/// estimates (`rows_estimate`, `filtered_pct`) matches. Shape equality is
/// what makes step appends idempotent across processing passes.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanStep {
    /// Step ordinal within the plan (the engine's `id` column)
    pub step_id: i64,
    pub select_type: Option<String>,
    /// Foreign key into `sql_tables`
    pub table_ref: i64,
    /// Access strategy (`ALL`, `index`, `range`, `ref`, `const`, ...)
    pub access_type: Option<String>,
    pub possible_keys: Option<String>,
    pub chosen_key: Option<String>,
    pub key_length: i64,
    pub ref_clause: Option<String>,
    pub extra: Option<String>,
    /// Volatile estimate, excluded from shape comparison
    pub rows_estimate: i64,
    /// Volatile estimate, excluded from shape comparison
    pub filtered_pct: Option<f64>,
}

impl PlanStep {
    /// Shape equality: all fields except the volatile estimates
    pub fn same_shape(&self, other: &PlanStep) -> bool {
        self.step_id == other.step_id
            && self.select_type == other.select_type
            && self.table_ref == other.table_ref
            && self.access_type == other.access_type
            && self.possible_keys == other.possible_keys
            && self.chosen_key == other.chosen_key
            && self.key_length == other.key_length
            && self.ref_clause == other.ref_clause
            && self.extra == other.extra
    }
}
