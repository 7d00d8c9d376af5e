//! Record store repositories
//!
//! Free functions over `&mut SqliteConnection` so the same code paths run
//! inside chunk transactions and against plain pool connections.

pub mod queries;
pub mod tables;
