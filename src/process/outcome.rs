// src/process/outcome.rs

use std::time::Duration;

/// How a supervised process ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Exit status 0.
    Success { stdout: String },
    /// Non-zero exit status (or killed by a signal, reported as `-1`).
    Failed {
        exit_code: i32,
        stdout: String,
        stderr: String,
    },
    /// The command could not be started.
    LaunchFailed { error: String },
    /// Still running when its wall-clock budget ran out; it was destroyed.
    TimedOut {
        after: Duration,
        stdout: String,
        stderr: String,
    },
    /// Cancelled through its handle; output is whatever was drained before.
    Cancelled { stdout: String, stderr: String },
}

impl ProcessOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, ProcessOutcome::Success { .. })
    }

    /// `0` on success, the exit status on failure, `-1` otherwise.
    pub fn exit_code(&self) -> i32 {
        match self {
            ProcessOutcome::Success { .. } => 0,
            ProcessOutcome::Failed { exit_code, .. } => *exit_code,
            _ => -1,
        }
    }

    pub fn stdout(&self) -> &str {
        match self {
            ProcessOutcome::Success { stdout }
            | ProcessOutcome::Failed { stdout, .. }
            | ProcessOutcome::TimedOut { stdout, .. }
            | ProcessOutcome::Cancelled { stdout, .. } => stdout,
            ProcessOutcome::LaunchFailed { .. } => "",
        }
    }

    pub fn stderr(&self) -> &str {
        match self {
            ProcessOutcome::Failed { stderr, .. }
            | ProcessOutcome::TimedOut { stderr, .. }
            | ProcessOutcome::Cancelled { stderr, .. } => stderr,
            ProcessOutcome::Success { .. } | ProcessOutcome::LaunchFailed { .. } => "",
        }
    }

    /// The most relevant text: stdout on success, stderr on failure, the
    /// launch error otherwise.
    pub fn output(&self) -> &str {
        match self {
            ProcessOutcome::Success { stdout } => stdout,
            ProcessOutcome::LaunchFailed { error } => error,
            other => other.stderr(),
        }
    }
}
