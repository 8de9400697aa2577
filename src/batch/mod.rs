// src/batch/mod.rs

//! Batch orchestration: one pipeline run per subject, best-of retention,
//! ETA logging and the final distribution summary.

pub mod eta;
pub mod result;
pub mod runner;

pub use eta::EtaTracker;
pub use result::{owner_of, BatchResult, BatchResultBuilder, OwnerResult};
pub use runner::{grade_table, read_slugs, reset_workspace, BatchRunner, BatchSummary};
