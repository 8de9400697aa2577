// src/graders/mod.rs

//! Part graders: each one produces a single bounded [`GradePart`].

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::config::PartSpec;
use crate::grade::GradePart;
use crate::pipeline::GradingContext;
use crate::process::ProcessSupervisor;
use crate::types::PartKind;

pub mod build;
pub mod command;
pub mod git_history;

pub use build::BuildPartGrader;
pub use command::CommandPartGrader;
pub use git_history::GitHistoryPartGrader;

pub type GradeFuture<'a> = Pin<Box<dyn Future<Output = anyhow::Result<GradePart>> + Send + 'a>>;

pub trait PartGrader: Send + Sync {
    fn name(&self) -> &str;

    /// `None` marks a penalty-only part.
    fn max_grade(&self) -> Option<f64>;

    fn min_grade(&self) -> f64 {
        0.0
    }

    fn grade<'a>(&'a self, ctx: &'a mut GradingContext) -> GradeFuture<'a>;

    /// Build this grader's part, clamped to its bounds.
    fn result(&self, comments: Vec<String>, grade: f64) -> GradePart {
        GradePart::bounded(
            self.name(),
            grade,
            self.min_grade(),
            self.max_grade(),
            comments,
        )
    }
}

/// Instantiate the graders described by the `[[part]]` sections, in order.
pub fn from_specs(specs: &[PartSpec], supervisor: ProcessSupervisor) -> Vec<Arc<dyn PartGrader>> {
    specs
        .iter()
        .map(|spec| -> Arc<dyn PartGrader> {
            match spec.kind {
                PartKind::Build => Arc::new(
                    BuildPartGrader::new(&spec.name, spec.max_grade.unwrap_or_default())
                        .with_min_grade(spec.min_grade)
                        .with_timeout(spec.timeout),
                ),
                PartKind::Command => Arc::new(
                    CommandPartGrader::new(
                        &spec.name,
                        spec.cmd.clone().unwrap_or_default(),
                        spec.max_grade.unwrap_or_default(),
                        supervisor,
                    )
                    .with_min_grade(spec.min_grade)
                    .with_timeout(spec.timeout),
                ),
                PartKind::GitHistory => {
                    Arc::new(GitHistoryPartGrader::new(&spec.name, spec.min_grade))
                }
            }
        })
        .collect()
}
