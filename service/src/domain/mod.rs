//! Domain logic

pub mod plans;
