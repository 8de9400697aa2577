// src/pipeline/mod.rs

//! The grading pipeline engine.
//!
//! A [`Pipeline`] runs its steps strictly in order against one
//! [`GradingContext`]. The first failing step stops iteration; listeners are
//! told about the failure, then every step that had succeeded is cleaned up
//! in reverse order. The exit code is `0` or `1`, nothing in between.

pub mod context;
pub mod engine;
pub mod listener;
pub mod step;

pub use context::{keys, GradingConfiguration, GradingContext};
pub use engine::Pipeline;
pub use listener::ErrorListener;
pub use step::{FnStep, GradingStep, NamedStep, StepError, StepFuture};
