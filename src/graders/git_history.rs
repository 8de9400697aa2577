// src/graders/git_history.rs

use anyhow::Context;
use tracing::debug;

use crate::grade::GradePart;
use crate::pipeline::GradingContext;

use super::{GradeFuture, PartGrader};

pub const NOT_A_GIT_REPOSITORY: &str = "Not a git repository";

/// Penalty-only part: each meaningless commit costs an eighth of
/// `min_grade`, never more than `min_grade` in total.
#[derive(Debug, Clone)]
pub struct GitHistoryPartGrader {
    name: String,
    min_grade: f64,
}

impl GitHistoryPartGrader {
    pub fn new(name: impl Into<String>, min_grade: f64) -> Self {
        Self {
            name: name.into(),
            min_grade,
        }
    }

    /// Grade for `flagged` meaningless commits.
    pub fn penalty(&self, flagged: usize) -> f64 {
        (flagged as f64 * self.min_grade / 8.0).max(self.min_grade)
    }
}

impl PartGrader for GitHistoryPartGrader {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_grade(&self) -> Option<f64> {
        None
    }

    fn min_grade(&self) -> f64 {
        self.min_grade
    }

    fn grade<'a>(&'a self, ctx: &'a mut GradingContext) -> GradeFuture<'a> {
        Box::pin(self.review_history(ctx))
    }
}

impl GitHistoryPartGrader {
    async fn review_history(&self, ctx: &GradingContext) -> anyhow::Result<GradePart> {
        let Some(git) = ctx.subject().and_then(|s| s.git()) else {
            return Ok(self.result(vec![NOT_A_GIT_REPOSITORY.to_string()], self.min_grade));
        };

        let flagged = git
            .with_context_async(|repo| repo.meaningless_commits())
            .await
            .context("version-control capability")?
            .context("reading commit history")?;
        debug!(part = %self.name, flagged = flagged.len(), "commit history reviewed");

        let mut comments: Vec<String> = flagged
            .iter()
            .map(|c| format!("`{}` {} --> {}", c.short_id, c.message, c.reason))
            .collect();
        if comments.is_empty() {
            comments.push("OK".to_string());
        }
        Ok(self.result(comments, self.penalty(flagged.len())))
    }
}
