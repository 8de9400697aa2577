#![cfg(unix)]

use std::path::Path;
use std::time::{Duration, Instant};

use gradeflow::process::{tree, ProcessOutcome, ProcessSupervisor, ProcessTree, ShellCommand};
use gradeflow_test_utils::{init_tracing, with_timeout};

fn supervisor() -> ProcessSupervisor {
    ProcessSupervisor::new(Duration::from_millis(20), Duration::from_millis(500))
}

/// Wait until `path` holds a pid written by a shell under test.
async fn read_pid(path: &Path) -> u32 {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Ok(content) = std::fs::read_to_string(path) {
            if let Ok(pid) = content.trim().parse() {
                return pid;
            }
        }
        assert!(Instant::now() < deadline, "pid file {path:?} never written");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

async fn wait_until_dead(pid: u32) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if !tree::is_alive(pid) {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

#[tokio::test]
async fn successful_command_returns_stdout() {
    init_tracing();
    let outcome = supervisor()
        .run(&ShellCommand::new("echo hello; echo world"))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(outcome.stdout(), "hello\nworld\n");
}

#[tokio::test]
async fn failing_command_reports_exit_code_and_both_streams() {
    init_tracing();
    let outcome = supervisor()
        .run(&ShellCommand::new("echo partial; echo oops >&2; exit 3"))
        .await;

    match &outcome {
        ProcessOutcome::Failed {
            exit_code,
            stdout,
            stderr,
        } => {
            assert_eq!(*exit_code, 3);
            assert_eq!(stdout, "partial\n");
            assert_eq!(stderr, "oops\n");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(outcome.exit_code(), 3);
}

#[tokio::test]
async fn missing_working_directory_is_a_launch_failure() {
    init_tracing();
    let command = ShellCommand::new("echo never").current_dir("/definitely/not/a/dir");

    let outcome = supervisor().run(&command).await;

    assert!(matches!(outcome, ProcessOutcome::LaunchFailed { .. }));
    assert!(!outcome.is_success());
    assert_eq!(outcome.exit_code(), -1);
}

#[tokio::test]
async fn commands_run_in_their_working_directory_with_env() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("marker.txt"), "here").unwrap();
    let command = ShellCommand::new("cat marker.txt; echo \" $GREETING\"")
        .current_dir(dir.path())
        .env("GREETING", "hi");

    let outcome = supervisor().run(&command).await;

    assert_eq!(outcome.stdout(), "here hi\n");
}

#[tokio::test]
async fn large_output_on_both_streams_does_not_deadlock() {
    init_tracing();
    let command = ShellCommand::new("seq 1 200000; seq 1 200000 >&2");

    let outcome = with_timeout(supervisor().run(&command)).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stdout().lines().count(), 200000);
    assert!(outcome.stdout().ends_with("200000\n"));
}

#[tokio::test]
async fn large_output_with_timeout_is_fully_captured() {
    init_tracing();
    let command = ShellCommand::new("seq 1 100000; seq 1 100000 >&2; exit 1");

    let outcome = with_timeout(
        supervisor().run_with_timeout(&command, Duration::from_secs(8)),
    )
    .await;

    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(outcome.stdout().lines().count(), 100000);
    assert_eq!(outcome.stderr().lines().count(), 100000);
}

#[tokio::test]
async fn timeout_destroys_the_process_and_keeps_partial_output() {
    init_tracing();
    let started = Instant::now();
    let command = ShellCommand::new("echo started; sleep 30");

    let outcome = with_timeout(
        supervisor().run_with_timeout(&command, Duration::from_millis(300)),
    )
    .await;

    match &outcome {
        ProcessOutcome::TimedOut { after, stdout, .. } => {
            assert!(*after >= Duration::from_millis(300));
            assert_eq!(stdout, "started\n");
        }
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(started.elapsed() < Duration::from_secs(8));
    assert_eq!(outcome.exit_code(), -1);
}

#[tokio::test]
async fn quick_command_finishes_before_its_timeout() {
    init_tracing();
    let outcome = supervisor()
        .run_with_timeout(&ShellCommand::new("echo fast"), Duration::from_secs(5))
        .await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stdout(), "fast\n");
}

#[tokio::test]
async fn handle_wait_returns_the_natural_outcome() {
    init_tracing();
    let handle = supervisor().run_async(ShellCommand::new("echo done"));
    assert!(handle.pid().is_some());

    let outcome = with_timeout(handle.wait()).await;

    assert!(outcome.is_success());
    assert_eq!(outcome.stdout(), "done\n");
}

#[tokio::test]
async fn cancel_after_completion_returns_the_normal_outcome() {
    init_tracing();
    let handle = supervisor().run_async(ShellCommand::new("exit 4"));
    let deadline = Instant::now() + Duration::from_secs(5);
    while !handle.is_finished() && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(20)).await;
    }

    let outcome = handle.cancel_and_collect().await;

    assert_eq!(outcome.exit_code(), 4);
}

#[tokio::test]
async fn cancel_kills_the_whole_process_tree() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("grandchild.pid");
    let command = ShellCommand::new(format!(
        "sleep 30 & echo $! > '{}'; echo running; wait",
        pid_file.display()
    ));

    let handle = supervisor().run_async(command);
    let root = handle.pid().unwrap();
    let grandchild = read_pid(&pid_file).await;
    assert!(tree::is_alive(grandchild));
    assert!(ProcessTree::snapshot(root).pids().contains(&grandchild));

    let outcome = with_timeout(handle.cancel_and_collect()).await;

    match &outcome {
        ProcessOutcome::Cancelled { stdout, .. } => assert_eq!(stdout, "running\n"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert!(wait_until_dead(grandchild).await, "grandchild {grandchild} survived");
    assert!(wait_until_dead(root).await, "root {root} survived");
}

#[tokio::test]
async fn dropping_the_handle_cancels_the_process() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let pid_file = dir.path().join("child.pid");
    let command = ShellCommand::new(format!(
        "sleep 30 & echo $! > '{}'; wait",
        pid_file.display()
    ));

    let handle = supervisor().run_async(command);
    let sleeper = read_pid(&pid_file).await;
    drop(handle);

    assert!(wait_until_dead(sleeper).await, "sleeper {sleeper} survived");
}

#[test]
fn tree_snapshot_of_unknown_pid_is_empty() {
    let tree = ProcessTree::snapshot(u32::MAX - 1);

    assert!(tree.is_empty());
    assert_eq!(tree.kill_all(), 0);
    assert!(!tree::interrupt(u32::MAX - 1));
}

#[test]
fn shell_command_displays_its_line() {
    let command = ShellCommand::new("mvn -q test").current_dir("ws/alice");

    assert_eq!(command.line(), "mvn -q test");
    assert_eq!(command.working_dir(), Some(Path::new("ws/alice")));
    assert!(command.to_string().contains("mvn -q test"));
}
