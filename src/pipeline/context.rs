// src/pipeline/context.rs

use std::collections::BTreeMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use serde_json::Value;

use crate::grade::{GradeDetails, GradePart};
use crate::subject::Subject;

/// Well-known side-channel keys.
pub mod keys {
    /// Identifier of the subject being graded in a batch.
    pub const SLUG: &str = "slug";
    /// Set to `true` by the build grader when compilation failed.
    pub const COMPILATION_FAILED: &str = "build.compilation_failed";
    /// Set to `true` by the build grader when tests failed.
    pub const TEST_FAILED: &str = "build.test_failed";
}

/// Inputs of one pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct GradingConfiguration {
    /// Where the subject comes from (remote URL or local path).
    pub repo_url: String,
    pub callback_url: Option<String>,
    pub callback_password: Option<String>,
    pub workspace: PathBuf,
}

impl GradingConfiguration {
    pub fn new(repo_url: impl Into<String>, workspace: impl AsRef<Path>) -> Self {
        Self {
            repo_url: repo_url.into(),
            callback_url: None,
            callback_password: None,
            workspace: workspace.as_ref().to_path_buf(),
        }
    }

    pub fn with_callback(mut self, url: Option<String>, password: Option<String>) -> Self {
        self.callback_url = url;
        self.callback_password = password;
        self
    }

    /// Containerised mode: `REPO_URL` (required), `CALLBACK_URL`,
    /// `CALLBACK_PASSWORD`.
    pub fn from_env(workspace: impl AsRef<Path>) -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok(), workspace)
    }

    pub fn from_lookup<F>(lookup: F, workspace: impl AsRef<Path>) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let repo_url =
            non_empty("REPO_URL").ok_or_else(|| anyhow!("REPO_URL is not set in the environment"))?;
        Ok(Self::new(repo_url, workspace)
            .with_callback(non_empty("CALLBACK_URL"), non_empty("CALLBACK_PASSWORD")))
    }
}

/// Mutable state threaded through the steps of one run.
#[derive(Debug)]
pub struct GradingContext {
    configuration: GradingConfiguration,
    subject: Option<Subject>,
    grade_details: GradeDetails,
    data: BTreeMap<String, Value>,
}

impl GradingContext {
    pub fn new(configuration: &GradingConfiguration) -> Self {
        Self {
            configuration: configuration.clone(),
            subject: None,
            grade_details: GradeDetails::new(),
            data: BTreeMap::new(),
        }
    }

    pub fn configuration(&self) -> &GradingConfiguration {
        &self.configuration
    }

    pub fn subject(&self) -> Option<&Subject> {
        self.subject.as_ref()
    }

    pub fn subject_mut(&mut self) -> Option<&mut Subject> {
        self.subject.as_mut()
    }

    /// Install the subject, returning the previous one if any.
    pub fn set_subject(&mut self, subject: Subject) -> Option<Subject> {
        self.subject.replace(subject)
    }

    pub fn take_subject(&mut self) -> Option<Subject> {
        self.subject.take()
    }

    pub fn grade_details(&self) -> &GradeDetails {
        &self.grade_details
    }

    /// Parts can only be appended.
    pub fn add_part(&mut self, part: GradePart) {
        self.grade_details.add_part(part);
    }

    pub fn set_data(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.data.insert(key.into(), value.into());
    }

    pub fn data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }

    /// `false` when absent or not a boolean.
    pub fn flag(&self, key: &str) -> bool {
        self.data.get(key).and_then(Value::as_bool).unwrap_or(false)
    }

    pub fn slug(&self) -> Option<&str> {
        self.data_str(keys::SLUG)
    }
}
