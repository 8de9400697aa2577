// src/graders/command.rs

use std::time::Duration;

use crate::grade::GradePart;
use crate::pipeline::GradingContext;
use crate::process::{ProcessOutcome, ProcessSupervisor, ShellCommand};
use crate::types::human_readable;

use super::{GradeFuture, PartGrader};

/// Runs a shell command in the subject root; full credit on exit status 0,
/// `min_grade` otherwise, explained by the command's output.
#[derive(Debug, Clone)]
pub struct CommandPartGrader {
    name: String,
    cmd: String,
    max_grade: f64,
    min_grade: f64,
    timeout: Option<Duration>,
    supervisor: ProcessSupervisor,
}

impl CommandPartGrader {
    pub fn new(
        name: impl Into<String>,
        cmd: impl Into<String>,
        max_grade: f64,
        supervisor: ProcessSupervisor,
    ) -> Self {
        Self {
            name: name.into(),
            cmd: cmd.into(),
            max_grade,
            min_grade: 0.0,
            timeout: None,
            supervisor,
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

impl PartGrader for CommandPartGrader {
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
        Box::pin(self.run_command(ctx))
    }
}

impl CommandPartGrader {
    async fn run_command(&self, ctx: &GradingContext) -> anyhow::Result<GradePart> {
        let dir = match ctx.subject() {
            Some(subject) => subject.root().to_path_buf(),
            None => ctx.configuration().workspace.clone(),
        };
        let command = ShellCommand::new(&self.cmd).current_dir(dir);

        let outcome = match self.timeout {
            Some(limit) => self.supervisor.run_with_timeout(&command, limit).await,
            None => self.supervisor.run(&command).await,
        };

        let part = match &outcome {
            ProcessOutcome::Success { .. } => self.result(Vec::new(), self.max_grade),
            ProcessOutcome::Failed { exit_code, .. } => {
                let mut comments = vec![format!("`{}` failed with exit code {}", self.cmd, exit_code)];
                let output = outcome.output().trim();
                if !output.is_empty() {
                    comments.push(output.to_string());
                }
                self.result(comments, self.min_grade)
            }
            ProcessOutcome::TimedOut { after, .. } => self.result(
                vec![format!("`{}` timed out after {}", self.cmd, human_readable(*after))],
                self.min_grade,
            ),
            ProcessOutcome::LaunchFailed { error } => self.result(vec![error.clone()], self.min_grade),
            ProcessOutcome::Cancelled { .. } => {
                self.result(vec![format!("`{}` was cancelled", self.cmd)], self.min_grade)
            }
        };
        Ok(part)
    }
}
