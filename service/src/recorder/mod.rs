//! Statement capture gateway
//!
//! The recorder is the boundary between the observed application and the
//! pipeline: a trace buffer accumulates executed statements with their
//! EXPLAIN metadata, and a query executor resolves plans against the
//! observed database on demand.

pub mod buffer;
pub mod executor;

pub use buffer::{MemoryBuffer, TraceBuffer, capture_statement};
pub use executor::{ExecutorError, MySqlExecutor, QueryExecutor, UnconfiguredExecutor};

/// One untyped EXPLAIN output row, keyed by engine column name
pub type ExplainRow = serde_json::Map<String, serde_json::Value>;

/// One executed statement with its plan, as captured
#[derive(Debug, Clone)]
pub struct CapturedStatement {
    pub query: String,
    /// Tri-state plan attachment:
    /// - `None`: not explained yet, resolved through the executor during
    ///   the processing pass
    /// - `Some(empty)`: the engine produced no plan for this statement
    /// - `Some(rows)`: plan captured at execution time
    pub explain_rows: Option<Vec<ExplainRow>>,
}

/// One recorded application call, holding the statements it executed in order
#[derive(Debug, Clone, Default)]
pub struct CapturedCall {
    pub statements: Vec<CapturedStatement>,
}
