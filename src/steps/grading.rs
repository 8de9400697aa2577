// src/steps/grading.rs

use std::sync::Arc;

use anyhow::Context;
use tracing::{debug, info};

use crate::graders::PartGrader;
use crate::pipeline::{GradingContext, GradingStep, StepError, StepFuture};

/// Runs each part grader in order and appends its part to the context.
#[derive(Clone)]
pub struct GradingPartsStep {
    graders: Vec<Arc<dyn PartGrader>>,
}

impl GradingPartsStep {
    pub fn new(graders: Vec<Arc<dyn PartGrader>>) -> Self {
        Self { graders }
    }

    async fn grade_all(&self, ctx: &mut GradingContext) -> Result<(), StepError> {
        for grader in &self.graders {
            debug!(part = grader.name(), "grading part");
            let part = grader
                .grade(ctx)
                .await
                .with_context(|| format!("grading part {}", grader.name()))?;
            debug!(part = %part.id, grade = part.grade, max = ?part.max_grade, "part graded");
            ctx.add_part(part);
        }

        let details = ctx.grade_details();
        info!(
            subject = ctx.subject().map(|s| s.name()).unwrap_or("-"),
            grade = details.grade(),
            max_grade = details.max_grade(),
            "grading done"
        );
        Ok(())
    }
}

impl GradingStep for GradingPartsStep {
    fn run<'a>(&'a self, ctx: &'a mut GradingContext) -> StepFuture<'a> {
        Box::pin(self.grade_all(ctx))
    }
}
