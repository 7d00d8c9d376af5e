//! Query-plan processing pipeline
//!
//! Captured statements flow through: normalization of raw EXPLAIN rows,
//! aggregation into deduplicated query records, and periodic compaction of
//! duplicate records. The session controller drives one end-to-end pass.

pub mod aggregate;
pub mod compact;
pub mod normalize;
pub mod pipeline;
pub mod registry;

pub use aggregate::QueryDraft;
pub use compact::{CompactReport, compact};
pub use normalize::{NormalizeError, NormalizedStep, normalize};
pub use pipeline::{PipelineError, ProcessOutcome, SessionController};
pub use registry::TableRegistry;
