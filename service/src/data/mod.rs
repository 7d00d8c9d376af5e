//! Data storage layer
//!
//! Provides the persistent record store for the pipeline:
//! - `sqlite` - record store service, schema, migrations, repositories
//! - `types` - shared row and domain value types

pub mod sqlite;
pub mod types;

pub use sqlite::{SqliteError, SqliteService};
