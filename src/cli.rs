// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

/// Command-line arguments for `gradeflow`.
///
/// Without `--group` or `--slug`, the job runs in containerised mode: the
/// repository comes from `REPO_URL` and results are posted to `CALLBACK_URL`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "gradeflow",
    version,
    about = "Clone, build and grade student submissions.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    #[arg(long, value_name = "PATH", default_value = "Gradeflow.toml")]
    pub config: String,

    /// Grade every slug listed in the slug file.
    #[arg(short, long)]
    pub group: bool,

    /// Slug file used in group mode (overrides `[batch].slug_file`).
    #[arg(short = 'f', long, value_name = "PATH")]
    pub slug_file: Option<PathBuf>,

    /// Grade the exercise of a single slug.
    #[arg(short, long, value_name = "SLUG", conflicts_with = "group")]
    pub slug: Option<String>,

    /// Use an existing local repository instead of cloning.
    #[arg(long, value_name = "PATH")]
    pub local_repo: Option<PathBuf>,

    /// Where to write the per-subject report (slug mode).
    #[arg(short, long, value_name = "PATH")]
    pub report_file: Option<PathBuf>,

    /// Keep local modifications of an existing clone instead of force-pulling.
    #[arg(long)]
    pub no_force_pull: bool,

    /// Branch to check out after cloning (overrides `[grader].branch`).
    #[arg(long, value_name = "NAME")]
    pub branch: Option<String>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `GRADEFLOW_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print the pipeline, but don't grade anything.
    #[arg(long)]
    pub dry_run: bool,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
