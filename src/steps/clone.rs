// src/steps/clone.rs

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use anyhow::{anyhow, Context};
use regex::Regex;
use tracing::{debug, info, warn};

use crate::capability::{git, CapabilityRegistry, GitRepo, HostedRepo};
use crate::pipeline::{GradingContext, GradingStep, StepError, StepFuture};
use crate::process::ProcessSupervisor;
use crate::subject::Subject;

static URL_CREDENTIALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?P<scheme>[a-zA-Z][a-zA-Z0-9+.-]*://)[^/@\s]+@").expect("Invalid regex for URL credentials")
});

/// Replace `user:token@` in URLs with `***@`.
pub fn redact_credentials(text: &str) -> String {
    URL_CREDENTIALS.replace_all(text, "${scheme}***@").into_owned()
}

/// `owner/repo` for a remote URL; falls back to the last two path segments
/// for hosts that are not known forges.
pub fn subject_name_from_url(url: &str) -> String {
    if let Some(hosted) = HostedRepo::from_remote_url(url) {
        return hosted.slug();
    }
    let trimmed = url.trim().trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    last_two(trimmed.split(['/', ':', '\\']))
}

/// Last two components of a local path, joined with `/`.
pub fn subject_name_from_path(path: &Path) -> String {
    last_two(
        path.components()
            .filter_map(|c| c.as_os_str().to_str())
            .filter(|c| *c != "/" && *c != "."),
    )
}

fn last_two<'a>(segments: impl Iterator<Item = &'a str>) -> String {
    let segments: Vec<&str> = segments.filter(|s| !s.is_empty()).collect();
    let start = segments.len().saturating_sub(2);
    segments[start..].join("/")
}

/// Creates the subject: clones (or force-pulls) the repository into the
/// workspace, or attaches an existing local checkout, then discovers its
/// capabilities. Cleanup closes the subject.
#[derive(Debug, Clone)]
pub struct CloneStep {
    registry: CapabilityRegistry,
    supervisor: ProcessSupervisor,
    force_pull: bool,
    branch: Option<String>,
    local_repo: Option<PathBuf>,
}

impl CloneStep {
    pub fn new(registry: CapabilityRegistry, supervisor: ProcessSupervisor) -> Self {
        Self {
            registry,
            supervisor,
            force_pull: true,
            branch: None,
            local_repo: None,
        }
    }

    pub fn force_pull(mut self, force_pull: bool) -> Self {
        self.force_pull = force_pull;
        self
    }

    pub fn branch(mut self, branch: Option<String>) -> Self {
        self.branch = branch;
        self
    }

    pub fn local_repo(mut self, local_repo: Option<PathBuf>) -> Self {
        self.local_repo = local_repo;
        self
    }

    async fn fetch(&self, url: &str, dest: &Path) -> Result<(), StepError> {
        let result = if dest.join(".git").exists() {
            if self.force_pull {
                debug!(path = ?dest, "existing clone, force pulling");
                GitRepo::new(dest, self.supervisor).force_pull().await
            } else {
                debug!(path = ?dest, "existing clone, reusing as is");
                Ok(())
            }
        } else {
            info!(url = %redact_credentials(url), path = ?dest, "cloning");
            git::clone(&self.supervisor, url, dest).await
        };

        result.map_err(|e| {
            StepError::warning_with_cause(
                format!(
                    "Unable to clone in {}: Missing or inaccessible repository",
                    dest.display()
                ),
                anyhow!(redact_credentials(&format!("{e:#}"))),
            )
        })
    }

    async fn attach(&self, ctx: &mut GradingContext) -> Result<(), StepError> {
        let (name, root) = match &self.local_repo {
            Some(path) => {
                if !path.is_dir() {
                    return Err(StepError::warning(format!(
                        "Unable to attach {}: not a directory",
                        path.display()
                    )));
                }
                (subject_name_from_path(path), path.clone())
            }
            None => {
                let url = ctx.configuration().repo_url.clone();
                let name = subject_name_from_url(&url);
                let root = ctx.configuration().workspace.join(&name);
                self.fetch(&url, &root).await?;
                (name, root)
            }
        };

        let mut subject = self.registry.discover(&name, &root);

        if let Some(branch) = &self.branch {
            // The subject never reaches the context, so cleanup cannot see it.
            if let Err(err) = check_out(&subject, branch).await {
                close_subject(&mut subject);
                return Err(err);
            }
        }

        ctx.set_subject(subject);
        Ok(())
    }
}

async fn check_out(subject: &Subject, branch: &str) -> Result<(), StepError> {
    let git = subject.git().ok_or_else(|| {
        StepError::warning(format!(
            "Cannot check out {branch}: {} is not a git repository",
            subject.name()
        ))
    })?;
    git.with_context_async(|repo| repo.checkout(branch))
        .await
        .context("version-control capability")?
        .with_context(|| format!("checking out branch {branch}"))?;
    Ok(())
}

/// Close every capability of `subject`, logging the ones that fail.
fn close_subject(subject: &mut Subject) -> usize {
    let failures = subject.close();
    for failure in &failures {
        warn!(subject = %subject.name(), error = %failure, "capability failed to close");
    }
    failures.len()
}

impl GradingStep for CloneStep {
    fn run<'a>(&'a self, ctx: &'a mut GradingContext) -> StepFuture<'a> {
        Box::pin(self.attach(ctx))
    }

    fn close(&self, ctx: &mut GradingContext) -> anyhow::Result<()> {
        let Some(mut subject) = ctx.take_subject() else {
            return Ok(());
        };
        match close_subject(&mut subject) {
            0 => Ok(()),
            failed => Err(anyhow!(
                "{} capabilities of {} failed to close",
                failed,
                subject.name()
            )),
        }
    }
}
