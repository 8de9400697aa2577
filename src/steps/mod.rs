// src/steps/mod.rs

//! Built-in grading steps and the pipeline shortcuts that add them.

use std::sync::Arc;

use crate::graders::PartGrader;
use crate::pipeline::Pipeline;

pub mod clone;
pub mod grading;
pub mod send;
pub mod store;

pub use clone::{redact_credentials, subject_name_from_path, subject_name_from_url, CloneStep};
pub use grading::GradingPartsStep;
pub use send::{authorization_value, SendStep};
pub use store::{artifact_path, GradingPayload, StoreResultsLocallyStep};

impl Pipeline {
    pub fn add_clone_step(&self, step: CloneStep) -> Self {
        self.add_step("clone", step)
    }

    pub fn add_grading_step(&self, graders: Vec<Arc<dyn PartGrader>>) -> Self {
        self.add_step("grading", GradingPartsStep::new(graders))
    }

    pub fn add_store_results_locally_step(&self, step: StoreResultsLocallyStep) -> Self {
        self.add_step("store results locally", step)
    }

    pub fn add_send_step(&self) -> Self {
        self.add_step("send results", SendStep::new())
    }
}
