// src/lib.rs

pub mod batch;
pub mod capability;
pub mod cli;
pub mod config;
pub mod errors;
pub mod fs;
pub mod grade;
pub mod graders;
pub mod logging;
pub mod pipeline;
pub mod process;
pub mod steps;
pub mod subject;
pub mod types;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, info};

use crate::batch::{read_slugs, reset_workspace, BatchRunner};
use crate::capability::CapabilityRegistry;
use crate::cli::CliArgs;
use crate::config::loader::load_and_validate;
use crate::config::model::ConfigFile;
use crate::fs::{FileSystem, RealFileSystem};
use crate::pipeline::{GradingConfiguration, GradingContext, Pipeline};
use crate::process::ProcessSupervisor;
use crate::steps::{CloneStep, StoreResultsLocallyStep};

/// How the job was asked to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    /// Every slug of the slug file, results aggregated into a batch artifact.
    Group,
    /// One slug (or one local repository), results stored locally.
    Single { slug: Option<String> },
    /// Repository and callback taken from the environment, results posted.
    Containerised,
}

impl Mode {
    pub fn from_args(args: &CliArgs) -> Self {
        if args.group {
            Mode::Group
        } else if args.slug.is_some() || args.local_repo.is_some() {
            Mode::Single {
                slug: args.slug.clone(),
            }
        } else {
            Mode::Containerised
        }
    }
}

/// High-level entry point used by `main.rs`.
///
/// Returns the process exit code: the pipeline's in single and
/// containerised modes, `0` once a batch completed.
pub async fn run(args: CliArgs) -> Result<i32> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)?;

    let mode = Mode::from_args(&args);
    let supervisor = ProcessSupervisor::from_settings(&cfg.process);
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let pipeline = build_pipeline(&cfg, &args, &mode, supervisor, Arc::clone(&fs));

    if args.dry_run {
        print_dry_run(&cfg, &mode, &pipeline);
        return Ok(0);
    }

    let workspace = cfg.grader.workspace.clone();
    match mode {
        Mode::Group => {
            let slug_file = args
                .slug_file
                .clone()
                .unwrap_or_else(|| cfg.batch.slug_file.clone());
            let slugs = read_slugs(fs.as_ref(), &slug_file)?;
            info!(count = slugs.len(), path = ?slug_file, "grading group");

            if cfg.grader.reset_workspace {
                reset_workspace(fs.as_ref(), &workspace)?;
            }

            let runner = BatchRunner::new(
                cfg.grader.name.clone(),
                pipeline,
                cfg.batch.result_path.clone(),
                fs,
            );
            runner
                .run_batch(
                    &slugs,
                    |slug| cfg.repo_url_for(slug),
                    &workspace,
                    GradingContext::new,
                )
                .await?;
            Ok(0)
        }
        Mode::Single { slug } => {
            let location = match (&slug, &args.local_repo) {
                (Some(slug), _) => cfg.repo_url_for(slug),
                (None, Some(path)) => path.display().to_string(),
                (None, None) => String::new(),
            };
            let configuration = GradingConfiguration::new(location, &workspace);
            Ok(pipeline.run(&configuration, GradingContext::new).await)
        }
        Mode::Containerised => {
            let configuration = GradingConfiguration::from_env(&workspace)?.with_callback(
                cfg.effective_callback_url(),
                cfg.effective_callback_password(),
            );
            Ok(pipeline.run(&configuration, GradingContext::new).await)
        }
    }
}

/// clone -> grading -> store (single, group) or send (containerised).
pub fn build_pipeline(
    cfg: &ConfigFile,
    args: &CliArgs,
    mode: &Mode,
    supervisor: ProcessSupervisor,
    fs: Arc<dyn FileSystem>,
) -> Pipeline {
    let registry = CapabilityRegistry::with_default_providers(supervisor);
    let local_repo = match mode {
        Mode::Group => None,
        _ => args.local_repo.clone(),
    };
    let clone = CloneStep::new(registry, supervisor)
        .force_pull(cfg.grader.force_pull && !args.no_force_pull)
        .branch(args.branch.clone().or_else(|| cfg.grader.branch.clone()))
        .local_repo(local_repo);

    let pipeline = Pipeline::new()
        .add_clone_step(clone)
        .add_grading_step(graders::from_specs(&cfg.parts, supervisor));

    match mode {
        Mode::Group => {
            pipeline.add_store_results_locally_step(StoreResultsLocallyStep::new(None, fs))
        }
        Mode::Single { .. } => pipeline.add_store_results_locally_step(
            StoreResultsLocallyStep::new(args.report_file.clone(), fs),
        ),
        Mode::Containerised => pipeline.add_send_step(),
    }
}

/// Print the composed pipeline and part graders.
fn print_dry_run(cfg: &ConfigFile, mode: &Mode, pipeline: &Pipeline) {
    println!("gradeflow dry-run");
    println!("  grader.name = {}", cfg.grader.name);
    println!("  grader.workspace = {}", cfg.grader.workspace.display());
    println!("  mode = {:?}", mode);
    println!();

    println!("steps ({}):", pipeline.len());
    for name in pipeline.step_names() {
        println!("  - {name}");
    }
    println!();

    println!("parts ({}):", cfg.parts.len());
    for part in &cfg.parts {
        println!("  - {} ({:?})", part.name, part.kind);
        if let Some(max_grade) = part.max_grade {
            println!("      max_grade: {max_grade}");
        }
        if part.min_grade != 0.0 {
            println!("      min_grade: {}", part.min_grade);
        }
        if let Some(ref cmd) = part.cmd {
            println!("      cmd: {cmd}");
        }
        if let Some(timeout) = part.timeout {
            println!("      timeout: {}", types::human_readable(timeout));
        }
    }

    debug!("dry-run complete (no grading)");
}
