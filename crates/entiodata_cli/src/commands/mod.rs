//! CLI command implementations.

pub mod count;
pub mod metadata;
pub mod query;
