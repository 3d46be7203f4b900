//! Shared domain types for the tsgate workspace: error taxonomy, ids, roles,
//! and the time-series storage capability.

pub mod error;
pub mod roles;
pub mod timeseries;
pub mod types;
