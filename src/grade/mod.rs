// src/grade/mod.rs

//! Grade model: parts, totals and distribution rendering.
//!
//! - [`details`] holds [`GradePart`] / [`GradeDetails`] and the rounding rule
//!   used for totals.
//! - [`histogram`] renders the ASCII distribution printed after a batch.

pub mod details;
pub mod histogram;

pub use details::{round, GradeDetails, GradePart};
pub use histogram::ascii_histogram;
