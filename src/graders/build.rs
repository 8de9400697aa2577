// src/graders/build.rs

use std::time::Duration;

use tracing::{debug, info};

use crate::grade::GradePart;
use crate::pipeline::{keys, GradingContext};
use crate::process::ProcessOutcome;

use super::{GradeFuture, PartGrader};

pub const NOT_BUILDABLE: &str = "Not a buildable project";
pub const COMPILATION_FAILED: &str = "Compilation failed";
pub const TEST_FAILURES: &str = "There are test failures";

/// Compiles then tests the subject with its detected build tool.
///
/// Full credit when both pass, half when only tests fail, nothing when the
/// project does not compile or has no build tool.
#[derive(Debug, Clone)]
pub struct BuildPartGrader {
    name: String,
    max_grade: f64,
    min_grade: f64,
    timeout: Option<Duration>,
}

impl BuildPartGrader {
    pub fn new(name: impl Into<String>, max_grade: f64) -> Self {
        Self {
            name: name.into(),
            max_grade,
            min_grade: 0.0,
            timeout: None,
        }
    }

    pub fn with_min_grade(mut self, min_grade: f64) -> Self {
        self.min_grade = min_grade;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }
}

enum BuildReport {
    NoBuildTool,
    CompileFailed(ProcessOutcome),
    TestsFailed(ProcessOutcome),
    Passed,
}

impl PartGrader for BuildPartGrader {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_grade(&self) -> Option<f64> {
        Some(self.max_grade)
    }

    fn min_grade(&self) -> f64 {
        self.min_grade
    }

    fn grade<'a>(&'a self, ctx: &'a mut GradingContext) -> GradeFuture<'a> {
        Box::pin(self.build_and_test(ctx))
    }
}

impl BuildPartGrader {
    async fn build_and_test(&self, ctx: &mut GradingContext) -> anyhow::Result<GradePart> {
        let timeout = self.timeout;
        let report = match ctx.subject().and_then(|s| s.build_tool()) {
            None => BuildReport::NoBuildTool,
            Some(handle) => {
                handle
                    .with_context_async(|project| async move {
                        info!(tool = %project.tool(), root = ?project.root(), "building");
                        let compiled = project.compile(timeout).await;
                        if !compiled.is_success() {
                            return BuildReport::CompileFailed(compiled);
                        }
                        let tested = project.test(timeout).await;
                        if !tested.is_success() {
                            return BuildReport::TestsFailed(tested);
                        }
                        BuildReport::Passed
                    })
                    .await?
            }
        };

        let part = match report {
            BuildReport::NoBuildTool => {
                mark_untestable(ctx);
                self.result(vec![NOT_BUILDABLE.to_string()], 0.0)
            }
            BuildReport::CompileFailed(outcome) => {
                debug!(exit_code = outcome.exit_code(), output = %outcome.output(), "compilation failed");
                mark_untestable(ctx);
                self.result(vec![COMPILATION_FAILED.to_string()], 0.0)
            }
            BuildReport::TestsFailed(outcome) => {
                debug!(exit_code = outcome.exit_code(), output = %outcome.output(), "tests failed");
                ctx.set_data(keys::COMPILATION_FAILED, false);
                ctx.set_data(keys::TEST_FAILED, true);
                self.result(vec![TEST_FAILURES.to_string()], self.max_grade / 2.0)
            }
            BuildReport::Passed => {
                ctx.set_data(keys::COMPILATION_FAILED, false);
                ctx.set_data(keys::TEST_FAILED, false);
                self.result(Vec::new(), self.max_grade)
            }
        };
        Ok(part)
    }
}

/// Nothing was compiled, so tests could not pass either.
fn mark_untestable(ctx: &mut GradingContext) {
    ctx.set_data(keys::COMPILATION_FAILED, true);
    ctx.set_data(keys::TEST_FAILED, true);
}
