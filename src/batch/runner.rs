// src/batch/runner.rs

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use tracing::{info, warn};

use crate::fs::FileSystem;
use crate::grade::{ascii_histogram, round, GradeDetails};
use crate::pipeline::{keys, GradingConfiguration, GradingContext, Pipeline};
use crate::types::human_readable;

use super::eta::EtaTracker;
use super::result::{BatchResult, BatchResultBuilder};

const TABLE_PADDING: usize = 40;

/// What a batch produced, in addition to the persisted artifact.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    pub result: BatchResult,
    pub total: usize,
    /// Subjects with at least one successful run.
    pub succeeded: BTreeSet<String>,
    /// Subjects whose every run failed.
    pub failed: Vec<String>,
    pub duration: Duration,
}

impl BatchSummary {
    /// Best grade of each successful subject, by subject id.
    pub fn grades(&self) -> Vec<(String, f64)> {
        self.result
            .owners
            .iter()
            .filter(|(id, _)| self.succeeded.contains(*id))
            .map(|(id, r)| (id.clone(), r.grade_details.grade()))
            .collect()
    }
}

/// Runs a base pipeline once per subject, strictly sequentially.
pub struct BatchRunner {
    name: String,
    pipeline: Pipeline,
    result_path: PathBuf,
    fs: Arc<dyn FileSystem>,
}

impl BatchRunner {
    pub fn new(
        name: impl Into<String>,
        pipeline: Pipeline,
        result_path: impl Into<PathBuf>,
        fs: Arc<dyn FileSystem>,
    ) -> Self {
        Self {
            name: name.into(),
            pipeline,
            result_path: result_path.into(),
            fs,
        }
    }

    /// Grade every subject, log a summary and persist the batch artifact.
    ///
    /// One subject failing never stops the batch: a listener records a
    /// zero-credit result carrying the failure message instead.
    pub async fn run_batch<L, F>(
        &self,
        subject_ids: &[String],
        id_to_location: L,
        workspace: &Path,
        context_factory: F,
    ) -> Result<BatchSummary>
    where
        L: Fn(&str) -> String,
        F: Fn(&GradingConfiguration) -> GradingContext,
    {
        let started = Instant::now();
        let results = Arc::new(Mutex::new(BatchResultBuilder::new(&self.name)));
        let mut eta = EtaTracker::new(subject_ids.len());
        let mut succeeded = BTreeSet::new();
        let mut seen = BTreeSet::new();

        for (index, id) in subject_ids.iter().enumerate() {
            let configuration = GradingConfiguration::new(id_to_location(id), workspace);
            let pipeline = self.pipeline_for(id, &results);

            let subject_started = Instant::now();
            let (exit_code, _ctx) = pipeline
                .execute(&configuration, |c| context_factory(c))
                .await;
            let elapsed = subject_started.elapsed();
            eta.record(elapsed);

            seen.insert(id.clone());
            if exit_code == 0 {
                succeeded.insert(id.clone());
            }

            info!(
                subject = %id,
                progress = %format!("{}/{}", index + 1, subject_ids.len()),
                exit_code,
                elapsed = %human_readable(elapsed),
                eta = %human_readable(eta.eta()),
                "subject graded"
            );
        }

        let result = lock(&results)?.build(Utc::now());
        let failed = seen.difference(&succeeded).cloned().collect();
        let summary = BatchSummary {
            result,
            total: subject_ids.len(),
            succeeded,
            failed,
            duration: started.elapsed(),
        };

        log_summary(&summary);
        self.persist(&summary.result)?;
        Ok(summary)
    }

    fn pipeline_for(&self, id: &str, results: &Arc<Mutex<BatchResultBuilder>>) -> Pipeline {
        let slug = id.to_string();
        let record_id = id.to_string();
        let failure_id = id.to_string();
        let on_success = Arc::clone(results);
        let on_failure = Arc::clone(results);

        self.pipeline
            .insert_pre_fn_step("add slug", move |ctx| {
                ctx.set_data(keys::SLUG, slug.clone());
                Ok(())
            })
            .add_fn_step("record grade", move |ctx| {
                lock(&on_success)?.record(&record_id, ctx.grade_details().clone());
                Ok(())
            })
            .add_error_fn_listener(move |err, _configuration, _ctx| {
                lock(&on_failure)?.record(&failure_id, GradeDetails::failure(err.to_string()));
                Ok(())
            })
    }

    fn persist(&self, result: &BatchResult) -> Result<()> {
        let content = serde_json::to_string_pretty(result).context("serialising batch result")?;
        self.fs
            .write(&self.result_path, content.as_bytes())
            .with_context(|| format!("writing batch result to {}", self.result_path.display()))?;
        info!(path = ?self.result_path, "batch result written");
        Ok(())
    }
}

fn lock(results: &Mutex<BatchResultBuilder>) -> Result<MutexGuard<'_, BatchResultBuilder>> {
    results
        .lock()
        .map_err(|_| anyhow!("batch results lock poisoned"))
}

fn log_summary(summary: &BatchSummary) {
    info!("All done in {}", human_readable(summary.duration));
    info!("Success: {} / {}", summary.succeeded.len(), summary.total);
    if !summary.failed.is_empty() {
        warn!(
            "Subjects without usable result: {}",
            summary.failed.join(", ")
        );
    }

    let grades = summary.grades();
    if grades.is_empty() {
        return;
    }
    let values: Vec<f64> = grades.iter().map(|(_, g)| *g).collect();
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let avg = round(values.iter().sum::<f64>() / values.len() as f64, 2);
    info!("Grades: min {min}, max {max}, avg {avg}");
    info!("Distribution:\n{}", ascii_histogram(&values));
    info!("Results:\n{}", grade_table(&grades));
}

/// One line per subject, id padded to a fixed width.
pub fn grade_table(grades: &[(String, f64)]) -> String {
    let mut table = String::new();
    for (id, grade) in grades {
        let _ = writeln!(table, "{id:<TABLE_PADDING$}{grade}");
    }
    table.trim_end().to_string()
}

/// Subject ids from a slug file: one per line, blank lines and `#` comments
/// skipped.
pub fn read_slugs(fs: &dyn FileSystem, path: &Path) -> Result<Vec<String>> {
    let content = fs
        .read_to_string(path)
        .with_context(|| format!("reading slug file {}", path.display()))?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Remove the workspace so every subject is cloned afresh.
pub fn reset_workspace(fs: &dyn FileSystem, workspace: &Path) -> Result<()> {
    info!(path = ?workspace, "resetting workspace");
    fs.remove_dir_all(workspace)
}
