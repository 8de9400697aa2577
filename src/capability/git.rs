// src/capability/git.rs

//! Version-control capability backed by the `git` binary.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use tracing::debug;

use crate::fs::FileSystem;
use crate::process::{ProcessSupervisor, ShellCommand};

use super::{Capability, CapabilityContext, CapabilityHandle, CapabilityKind, CapabilityProvider};

/// Separates fields of one commit in `git log` output.
const FIELD_SEPARATOR: char = '\u{1f}';
/// Terminates one commit in `git log` output.
const RECORD_SEPARATOR: char = '\u{1e}';

/// One commit of the checked out history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub id: String,
    pub short_id: String,
    /// First line of the commit message.
    pub message: String,
}

/// A commit whose message says little about the change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MeaninglessCommit {
    pub short_id: String,
    pub message: String,
    pub reason: String,
}

/// A git working copy.
#[derive(Debug, Clone)]
pub struct GitRepo {
    root: PathBuf,
    supervisor: ProcessSupervisor,
}

impl CapabilityContext for GitRepo {
    const KIND: CapabilityKind = CapabilityKind::VersionControl;
}

impl GitRepo {
    pub fn new(root: impl Into<PathBuf>, supervisor: ProcessSupervisor) -> Self {
        Self {
            root: root.into(),
            supervisor,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Bring an existing clone in line with its remote, discarding local
    /// changes.
    pub async fn force_pull(&self) -> Result<()> {
        self.git("fetch --all --prune").await?;
        self.git("reset --hard").await?;
        self.git("clean -fd").await?;
        self.git("pull").await?;
        Ok(())
    }

    /// Check out `branch`, creating a local tracking branch from
    /// `origin/<branch>` when possible.
    pub async fn checkout(&self, branch: &str) -> Result<()> {
        let quoted = shell_quote(branch);
        let remote = shell_quote(&format!("origin/{branch}"));
        let tracking = format!("checkout -B {quoted} --track {remote}");
        if self.git(&tracking).await.is_ok() {
            return Ok(());
        }
        debug!(branch, "no remote tracking branch, falling back to plain checkout");
        self.git(&format!("checkout {quoted}")).await.map(|_| ())
    }

    /// Local and remote branch names, `origin/` stripped, deduplicated.
    pub async fn branch_names(&self) -> Result<Vec<String>> {
        let out = self.git("branch -a '--format=%(refname:short)'").await?;
        let names: BTreeSet<String> = out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty() && !l.ends_with("/HEAD") && *l != "origin")
            .map(|l| l.strip_prefix("origin/").unwrap_or(l).to_string())
            .collect();
        Ok(names.into_iter().collect())
    }

    pub async fn commit_count(&self) -> Result<u64> {
        let out = self.git("rev-list --count HEAD").await?;
        out.trim()
            .parse()
            .with_context(|| format!("unexpected rev-list output {:?}", out.trim()))
    }

    /// Commits reachable from `HEAD`, oldest first.
    pub async fn ordered_commits(&self) -> Result<Vec<Commit>> {
        let out = self
            .git("log --reverse '--format=%H%x1f%h%x1f%s%x1e'")
            .await?;
        out.split(RECORD_SEPARATOR)
            .map(str::trim)
            .filter(|record| !record.is_empty())
            .map(|record| -> Result<Commit> {
                let mut fields = record.splitn(3, FIELD_SEPARATOR);
                match (fields.next(), fields.next(), fields.next()) {
                    (Some(id), Some(short_id), message) => Ok(Commit {
                        id: id.to_string(),
                        short_id: short_id.to_string(),
                        message: message.unwrap_or_default().trim().to_string(),
                    }),
                    _ => bail!("unexpected git log record {record:?}"),
                }
            })
            .collect()
    }

    /// Commits of the history whose message is flagged by
    /// [`meaningless_commits`].
    pub async fn meaningless_commits(&self) -> Result<Vec<MeaninglessCommit>> {
        Ok(meaningless_commits(&self.ordered_commits().await?))
    }

    pub async fn remote_urls(&self) -> Result<Vec<String>> {
        // `git config` exits 1 when nothing matches.
        let outcome = self
            .supervisor
            .run(&self.command("config --get-regexp '^remote\\..*\\.url$'"))
            .await;
        if outcome.exit_code() == 1 {
            return Ok(Vec::new());
        }
        if !outcome.is_success() {
            bail!("listing remotes failed: {}", outcome.output().trim());
        }
        Ok(outcome
            .stdout()
            .lines()
            .filter_map(|l| l.split_whitespace().nth(1))
            .map(str::to_string)
            .collect())
    }

    fn command(&self, args: &str) -> ShellCommand {
        ShellCommand::new(format!("git {args}")).current_dir(&self.root)
    }

    async fn git(&self, args: &str) -> Result<String> {
        let outcome = self.supervisor.run(&self.command(args)).await;
        if !outcome.is_success() {
            bail!(
                "git {} failed (exit code {}): {}",
                args,
                outcome.exit_code(),
                outcome.output().trim()
            );
        }
        Ok(outcome.stdout().to_string())
    }
}

/// Flag commits, given oldest first, whose message carries no meaning:
/// empty or single-word messages, and messages repeating the previous
/// commit's message up to numbers (these should have been squashed).
/// Merge commits are never flagged.
pub fn meaningless_commits(commits: &[Commit]) -> Vec<MeaninglessCommit> {
    let mut flagged = Vec::new();
    let mut previous: Option<(&Commit, String)> = None;

    for commit in commits {
        let message = commit.message.trim();
        let normalized = normalize_message(message);
        let word_count = message.split_whitespace().count();

        let reason = if message.starts_with("Merge ") {
            None
        } else if word_count == 0 {
            Some("Empty message".to_string())
        } else if word_count == 1 {
            Some("1 word is too short".to_string())
        } else {
            match &previous {
                Some((prev, prev_normalized)) if *prev_normalized == normalized => {
                    Some(format!("Should be squashed on {}", prev.short_id))
                }
                _ => None,
            }
        };

        if let Some(reason) = reason {
            flagged.push(MeaninglessCommit {
                short_id: commit.short_id.clone(),
                message: message.to_string(),
                reason,
            });
        }
        previous = Some((commit, normalized));
    }

    flagged
}

/// Lowercased words of `message`, minus those carrying digits (versions,
/// issue numbers).
fn normalize_message(message: &str) -> String {
    message
        .split_whitespace()
        .filter(|w| !w.chars().any(|c| c.is_ascii_digit()))
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Clone `url` into `dest`.
pub async fn clone(supervisor: &ProcessSupervisor, url: &str, dest: &Path) -> Result<()> {
    let line = format!(
        "git clone --quiet {} {}",
        shell_quote(url),
        shell_quote(&dest.to_string_lossy())
    );
    let outcome = supervisor
        .run(&ShellCommand::new(line).env("GIT_TERMINAL_PROMPT", "0"))
        .await;
    if !outcome.is_success() {
        bail!(
            "git clone failed (exit code {}): {}",
            outcome.exit_code(),
            outcome.output().trim()
        );
    }
    Ok(())
}

/// Present when the subject root contains `.git`.
#[derive(Debug, Clone, Default)]
pub struct GitProvider {
    supervisor: ProcessSupervisor,
}

impl GitProvider {
    pub fn new(supervisor: ProcessSupervisor) -> Self {
        Self { supervisor }
    }
}

impl CapabilityProvider for GitProvider {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::VersionControl
    }

    fn name(&self) -> &str {
        "git"
    }

    fn detect(&self, root: &Path, fs: &dyn FileSystem) -> Result<Option<Capability>> {
        if !fs.exists(&root.join(".git")) {
            return Ok(None);
        }
        let repo = GitRepo::new(root, self.supervisor);
        Ok(Some(CapabilityHandle::new(repo).into()))
    }
}

pub(crate) fn shell_quote(arg: &str) -> String {
    if cfg!(windows) {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        format!("'{}'", arg.replace('\'', "'\\''"))
    }
}
