//! PlanSight — a lightweight SQL query-plan observability pipeline.
//!
//! Captures executed statements from an application workload, attaches
//! their EXPLAIN metadata, and persists a deduplicated summary of plan
//! shapes and table access patterns for later performance analysis.
//!
//! - `recorder` - trace buffer gateway and query executor contracts
//! - `domain::plans` - normalize / aggregate / compact / session pipeline
//! - `data` - SQLite-backed record store
//! - `core` - config, CLI, storage and scheduling infrastructure

pub mod app;
pub mod core;
pub mod data;
pub mod domain;
pub mod recorder;
pub mod utils;
