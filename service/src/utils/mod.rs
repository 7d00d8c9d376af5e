//! Utility functions for the application

pub mod crypto;
pub mod file;
pub mod json;
pub mod lock;
pub mod sql;
