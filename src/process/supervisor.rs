// src/process/supervisor.rs

use std::future::pending;
use std::io;
use std::process::ExitStatus;
use std::time::{Duration, Instant};

use tokio::process::Child;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::config::ProcessSettings;

use super::capture::OutputCapture;
use super::command::ShellCommand;
use super::outcome::ProcessOutcome;
use super::tree::{self, ProcessTree};

/// Lower bound on how long output readers are awaited after the process
/// ended.
const MIN_READER_GRACE: Duration = Duration::from_millis(200);

/// Runs external commands with full output capture, optional timeouts and
/// whole-tree termination.
#[derive(Debug, Clone, Copy)]
pub struct ProcessSupervisor {
    poll_interval: Duration,
    interrupt_grace: Duration,
}

impl Default for ProcessSupervisor {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(50),
            interrupt_grace: Duration::from_secs(2),
        }
    }
}

enum Stop {
    Exited(io::Result<ExitStatus>),
    DeadlineReached,
    Cancelled,
}

impl ProcessSupervisor {
    pub fn new(poll_interval: Duration, interrupt_grace: Duration) -> Self {
        Self {
            poll_interval,
            interrupt_grace,
        }
    }

    pub fn from_settings(settings: &ProcessSettings) -> Self {
        Self::new(settings.poll_interval, settings.interrupt_grace)
    }

    /// Run to completion.
    pub async fn run(&self, command: &ShellCommand) -> ProcessOutcome {
        match self.launch(command) {
            Ok((child, capture)) => self.supervise(command, child, capture, None, None).await,
            Err(outcome) => outcome,
        }
    }

    /// Run with a wall-clock budget. Liveness is polled every
    /// `poll_interval`; once `timeout` has elapsed the whole process tree is
    /// destroyed and whatever output was produced is returned.
    pub async fn run_with_timeout(
        &self,
        command: &ShellCommand,
        timeout: Duration,
    ) -> ProcessOutcome {
        match self.launch(command) {
            Ok((child, capture)) => {
                self.supervise(command, child, capture, None, Some(timeout))
                    .await
            }
            Err(outcome) => outcome,
        }
    }

    /// Start the command on its own Tokio task and return a handle to it.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn run_async(&self, command: ShellCommand) -> ProcessHandle {
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let supervisor = *self;

        let (pid, task) = match self.launch(&command) {
            Ok((child, capture)) => {
                let pid = child.id();
                let task = tokio::spawn(async move {
                    supervisor
                        .supervise(&command, child, capture, Some(cancel_rx), None)
                        .await
                });
                (pid, task)
            }
            Err(outcome) => (None, tokio::spawn(async move { outcome })),
        };

        ProcessHandle {
            pid,
            cancel: Some(cancel_tx),
            task,
        }
    }

    fn launch(&self, command: &ShellCommand) -> Result<(Child, OutputCapture), ProcessOutcome> {
        let mut cmd = command.to_command();
        match cmd.spawn() {
            Ok(mut child) => {
                info!(cmd = %command, pid = child.id(), "process started");
                let capture = OutputCapture::attach(&mut child, command.line());
                Ok((child, capture))
            }
            Err(e) => {
                warn!(cmd = %command, error = %e, "failed to start process");
                Err(ProcessOutcome::LaunchFailed {
                    error: format!("failed to start `{}`: {}", command, e),
                })
            }
        }
    }

    async fn supervise(
        &self,
        command: &ShellCommand,
        mut child: Child,
        capture: OutputCapture,
        cancel_rx: Option<oneshot::Receiver<()>>,
        timeout: Option<Duration>,
    ) -> ProcessOutcome {
        let pid = child.id();
        let started = Instant::now();

        let stop = {
            let exited = self.wait_for_exit(&mut child, timeout);
            let cancelled = async move {
                match cancel_rx {
                    // A dropped handle counts as a cancellation request.
                    Some(rx) => {
                        let _ = rx.await;
                    }
                    None => pending::<()>().await,
                }
            };

            tokio::select! {
                biased;
                stop = exited => stop,
                () = cancelled => Stop::Cancelled,
            }
        };

        let reader_grace = self.interrupt_grace.max(MIN_READER_GRACE);
        match stop {
            Stop::Exited(Ok(status)) => {
                let (stdout, stderr) = capture.finish(reader_grace).await;
                let elapsed = started.elapsed();
                if status.success() {
                    debug!(cmd = %command, ?elapsed, "process succeeded");
                    ProcessOutcome::Success { stdout }
                } else {
                    let exit_code = status.code().unwrap_or(-1);
                    debug!(cmd = %command, exit_code, ?elapsed, "process failed");
                    ProcessOutcome::Failed {
                        exit_code,
                        stdout,
                        stderr,
                    }
                }
            }
            Stop::Exited(Err(e)) => {
                warn!(cmd = %command, error = %e, "lost track of process");
                self.destroy(&mut child, pid).await;
                let (stdout, stderr) = capture.finish(reader_grace).await;
                ProcessOutcome::Failed {
                    exit_code: -1,
                    stdout,
                    stderr: format!("{stderr}{e}"),
                }
            }
            Stop::DeadlineReached => {
                let after = started.elapsed();
                warn!(cmd = %command, ?after, "process timed out; destroying process tree");
                self.destroy(&mut child, pid).await;
                let (stdout, stderr) = capture.finish(reader_grace).await;
                ProcessOutcome::TimedOut {
                    after,
                    stdout,
                    stderr,
                }
            }
            Stop::Cancelled => {
                info!(cmd = %command, "cancelling process");
                self.destroy(&mut child, pid).await;
                let (stdout, stderr) = capture.finish(reader_grace).await;
                ProcessOutcome::Cancelled { stdout, stderr }
            }
        }
    }

    async fn wait_for_exit(&self, child: &mut Child, timeout: Option<Duration>) -> Stop {
        let Some(limit) = timeout else {
            return Stop::Exited(child.wait().await);
        };

        let deadline = Instant::now() + limit;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Stop::Exited(Ok(status)),
                Ok(None) => {}
                Err(e) => return Stop::Exited(Err(e)),
            }

            let now = Instant::now();
            if now >= deadline {
                return Stop::DeadlineReached;
            }
            tokio::time::sleep(self.poll_interval.min(deadline - now)).await;
        }
    }

    /// Interrupt the process, give it `interrupt_grace` to stop, then kill
    /// everything left of the tree captured before the interrupt.
    async fn destroy(&self, child: &mut Child, pid: Option<u32>) {
        let Some(pid) = pid else {
            // Already reaped.
            return;
        };

        let tree = ProcessTree::snapshot(pid);
        debug!(pid, members = ?tree.pids(), "captured process tree");

        if tree::interrupt(pid) {
            let deadline = Instant::now() + self.interrupt_grace;
            while Instant::now() < deadline {
                if matches!(child.try_wait(), Ok(Some(_))) {
                    break;
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        }

        let killed = tree.kill_all();
        if killed > 0 {
            debug!(pid, killed, "forcibly killed remaining processes");
        }

        if let Err(e) = child.kill().await {
            debug!(pid, error = %e, "final kill on root process failed");
        }
    }
}

/// Handle to a process started with [`ProcessSupervisor::run_async`].
///
/// Dropping the handle cancels the process.
#[derive(Debug)]
pub struct ProcessHandle {
    pid: Option<u32>,
    cancel: Option<oneshot::Sender<()>>,
    task: JoinHandle<ProcessOutcome>,
}

impl ProcessHandle {
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the process to end on its own.
    pub async fn wait(mut self) -> ProcessOutcome {
        let _keep_alive = self.cancel.take();
        join(&mut self.task).await
    }

    /// Stop the process tree and return its outcome. If the process already
    /// finished, its normal outcome is returned instead.
    pub async fn cancel_and_collect(mut self) -> ProcessOutcome {
        if let Some(cancel) = self.cancel.take() {
            let _ = cancel.send(());
        }
        join(&mut self.task).await
    }
}

async fn join(task: &mut JoinHandle<ProcessOutcome>) -> ProcessOutcome {
    match task.await {
        Ok(outcome) => outcome,
        Err(e) => ProcessOutcome::LaunchFailed {
            error: format!("supervising task failed: {}", e),
        },
    }
}
