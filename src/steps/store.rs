// src/steps/store.rs

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::fs::FileSystem;
use crate::grade::GradeDetails;
use crate::pipeline::{GradingContext, GradingStep, StepError, StepFuture};

/// Per-subject artifact: `{"action": "grading", "details": {...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradingPayload {
    pub action: String,
    pub details: GradeDetails,
}

impl GradingPayload {
    pub fn grading(details: &GradeDetails) -> Self {
        Self {
            action: "grading".to_string(),
            details: details.clone(),
        }
    }
}

/// Writes the grading payload to `<workspace>/<subject>.json`, or to an
/// explicit report path.
#[derive(Debug, Clone)]
pub struct StoreResultsLocallyStep {
    report_path: Option<PathBuf>,
    fs: Arc<dyn FileSystem>,
}

impl StoreResultsLocallyStep {
    pub fn new(report_path: Option<PathBuf>, fs: Arc<dyn FileSystem>) -> Self {
        Self { report_path, fs }
    }

    fn target(&self, ctx: &GradingContext) -> PathBuf {
        if let Some(path) = &self.report_path {
            return path.clone();
        }
        let name = ctx
            .subject()
            .map(|s| s.name().to_string())
            .or_else(|| ctx.slug().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        artifact_path(&ctx.configuration().workspace, &name)
    }
}

pub fn artifact_path(workspace: &Path, subject_name: &str) -> PathBuf {
    workspace.join(format!("{subject_name}.json"))
}

impl StoreResultsLocallyStep {
    async fn store(&self, ctx: &GradingContext) -> Result<(), StepError> {
        let payload = GradingPayload::grading(ctx.grade_details());
        let content = serde_json::to_string_pretty(&payload).context("serialising results")?;
        let target = self.target(ctx);
        self.fs
            .write(&target, content.as_bytes())
            .with_context(|| format!("storing results in {}", target.display()))?;
        info!(path = ?target, "results stored");
        Ok(())
    }
}

impl GradingStep for StoreResultsLocallyStep {
    fn run<'a>(&'a self, ctx: &'a mut GradingContext) -> StepFuture<'a> {
        Box::pin(self.store(ctx))
    }
}
