// src/config/model.rs

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::types::PartKind;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [grader]
/// name = "java-intro"
/// repo_url_template = "https://github.com/{slug}.git"
///
/// [callback]
/// url = "https://grades.example.org/hook"
///
/// [[part]]
/// kind = "build"
/// name = "Compilation & tests"
/// max_grade = 4.0
///
/// [[part]]
/// kind = "command"
/// name = "Formatting"
/// cmd = "mvn -B spotless:check"
/// max_grade = 1.0
/// timeout = "2m"
///
/// [[part]]
/// kind = "git_history"
/// name = "Commit messages"
/// min_grade = -2.0
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    pub grader: GraderSection,

    #[serde(default)]
    pub callback: CallbackSection,

    #[serde(default)]
    pub batch: BatchSection,

    #[serde(default)]
    pub process: ProcessSection,

    /// All part graders from `[[part]]`, in grading order.
    #[serde(default, rename = "part")]
    pub parts: Vec<PartConfig>,
}

/// `[grader]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct GraderSection {
    /// Grading session name; also the `name` of the batch artifact.
    pub name: String,

    /// URL of a subject's repository, `{slug}` being replaced by the slug.
    pub repo_url_template: String,

    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,

    /// Remove the workspace before a batch.
    #[serde(default)]
    pub reset_workspace: bool,

    /// Discard local modifications of an already cloned repository.
    #[serde(default = "default_force_pull")]
    pub force_pull: bool,

    #[serde(default)]
    pub branch: Option<String>,
}

fn default_workspace() -> PathBuf {
    PathBuf::from("target/repositories")
}

fn default_force_pull() -> bool {
    true
}

/// `[callback]` section. Absent values fall back to `CALLBACK_URL` and
/// `CALLBACK_PASSWORD` at run time.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct CallbackSection {
    #[serde(default)]
    pub url: Option<String>,

    #[serde(default)]
    pub password: Option<String>,
}

/// `[batch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchSection {
    #[serde(default = "default_slug_file")]
    pub slug_file: PathBuf,

    #[serde(default = "default_result_path")]
    pub result_path: PathBuf,
}

fn default_slug_file() -> PathBuf {
    PathBuf::from("slugs.txt")
}

fn default_result_path() -> PathBuf {
    PathBuf::from("target/site/batchResult.json")
}

impl Default for BatchSection {
    fn default() -> Self {
        Self {
            slug_file: default_slug_file(),
            result_path: default_result_path(),
        }
    }
}

/// `[process]` section, duration strings such as `"50ms"` or `"2s"`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessSection {
    #[serde(default = "default_poll_interval")]
    pub poll_interval: String,

    #[serde(default = "default_interrupt_grace")]
    pub interrupt_grace: String,
}

fn default_poll_interval() -> String {
    "50ms".to_string()
}

fn default_interrupt_grace() -> String {
    "2s".to_string()
}

impl Default for ProcessSection {
    fn default() -> Self {
        Self {
            poll_interval: default_poll_interval(),
            interrupt_grace: default_interrupt_grace(),
        }
    }
}

/// `[[part]]` entry.
#[derive(Debug, Clone, Deserialize)]
pub struct PartConfig {
    pub kind: PartKind,

    pub name: String,

    /// Required for `build` and `command`; `git_history` has none.
    #[serde(default)]
    pub max_grade: Option<f64>,

    #[serde(default)]
    pub min_grade: Option<f64>,

    /// Shell command, required for `kind = "command"`.
    #[serde(default)]
    pub cmd: Option<String>,

    /// Wall-clock budget for each process this part launches.
    #[serde(default)]
    pub timeout: Option<String>,
}

/// Validated configuration.
///
/// Only constructible through `TryFrom<RawConfigFile>` (or
/// [`ConfigFile::new_unchecked`] for code that already validated its input).
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub grader: GraderSection,
    pub callback: CallbackSection,
    pub batch: BatchSection,
    pub process: ProcessSettings,
    pub parts: Vec<PartSpec>,
}

/// Parsed `[process]` settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessSettings {
    pub poll_interval: Duration,
    pub interrupt_grace: Duration,
}

/// Parsed `[[part]]` entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PartSpec {
    pub kind: PartKind,
    pub name: String,
    /// `None` for penalty-only parts.
    pub max_grade: Option<f64>,
    pub min_grade: f64,
    pub cmd: Option<String>,
    pub timeout: Option<Duration>,
}

impl ConfigFile {
    pub fn new_unchecked(
        grader: GraderSection,
        callback: CallbackSection,
        batch: BatchSection,
        process: ProcessSettings,
        parts: Vec<PartSpec>,
    ) -> Self {
        Self {
            grader,
            callback,
            batch,
            process,
            parts,
        }
    }

    /// Repository URL of the given slug.
    pub fn repo_url_for(&self, slug: &str) -> String {
        self.grader.repo_url_template.replace("{slug}", slug)
    }

    /// Callback URL from the config, or `CALLBACK_URL`.
    pub fn effective_callback_url(&self) -> Option<String> {
        self.callback
            .url
            .clone()
            .or_else(|| std::env::var("CALLBACK_URL").ok())
            .filter(|u| !u.trim().is_empty())
    }

    /// Callback password from the config, or `CALLBACK_PASSWORD`.
    pub fn effective_callback_password(&self) -> Option<String> {
        self.callback
            .password
            .clone()
            .or_else(|| std::env::var("CALLBACK_PASSWORD").ok())
    }
}
