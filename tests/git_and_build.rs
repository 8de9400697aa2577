#![cfg(unix)]

mod common;

use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Duration;

use gradeflow::capability::{git, BuildTool, CapabilityKind, CapabilityRegistry, GitRepo};
use gradeflow::graders::build::{COMPILATION_FAILED, TEST_FAILURES};
use gradeflow::graders::{BuildPartGrader, GitHistoryPartGrader, PartGrader};
use gradeflow::pipeline::{keys, GradingConfiguration, GradingContext, Pipeline};
use gradeflow::process::{ProcessSupervisor, ShellCommand};
use gradeflow::steps::CloneStep;

use common::init_tracing;

fn tool_available(tool: &str) -> bool {
    Command::new(tool)
        .arg("--version")
        .output()
        .is_ok_and(|o| o.status.success())
}

/// Nested cargo builds must not share the target directory of the running
/// test binary.
fn cargo_usable() -> bool {
    tool_available("cargo")
        && std::env::var_os("CARGO_TARGET_DIR").is_none()
        && std::env::var_os("CARGO_BUILD_TARGET_DIR").is_none()
}

fn sh(dir: &Path, script: &str) {
    let status = Command::new("sh")
        .arg("-c")
        .arg(script)
        .current_dir(dir)
        .status()
        .expect("failed to run sh");
    assert!(status.success(), "setup script failed: {script}");
}

/// Bare-bones upstream with two empty commits on `main` and a `feature`
/// branch.
fn upstream(dir: &Path) -> PathBuf {
    sh(
        dir,
        "git init -q origin && cd origin \
         && git symbolic-ref HEAD refs/heads/main \
         && git -c user.name=t -c user.email=t@example.org commit -q --allow-empty -m one \
         && git -c user.name=t -c user.email=t@example.org commit -q --allow-empty -m two \
         && git branch feature",
    );
    dir.join("origin")
}

fn cargo_project(dir: &Path, lib_rs: &str) -> PathBuf {
    let root = dir.join("lab");
    std::fs::create_dir_all(root.join("src")).unwrap();
    std::fs::write(
        root.join("Cargo.toml"),
        "[package]\nname = \"lab\"\nversion = \"0.1.0\"\nedition = \"2021\"\n\n[workspace]\n",
    )
    .unwrap();
    std::fs::write(root.join("src").join("lib.rs"), lib_rs).unwrap();
    root
}

async fn grade_cargo_project(lib_rs: &str) -> (f64, Vec<String>, bool, bool) {
    let dir = tempfile::tempdir().unwrap();
    let root = cargo_project(dir.path(), lib_rs);
    let supervisor = ProcessSupervisor::default();
    let subject = CapabilityRegistry::with_default_providers(supervisor).discover("lab", &root);
    let configuration = GradingConfiguration::new(root.display().to_string(), dir.path());
    let mut ctx = GradingContext::new(&configuration);
    ctx.set_subject(subject);

    let grader = BuildPartGrader::new("build", 10.0).with_timeout(Some(Duration::from_secs(300)));
    let part = grader.grade(&mut ctx).await.unwrap();

    (
        part.grade,
        part.comments,
        ctx.flag(keys::COMPILATION_FAILED),
        ctx.flag(keys::TEST_FAILED),
    )
}

#[tokio::test]
async fn git_repository_queries() {
    init_tracing();
    if !tool_available("git") {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let origin = upstream(dir.path());
    let supervisor = ProcessSupervisor::default();
    let dest = dir.path().join("clone");

    git::clone(&supervisor, &origin.display().to_string(), &dest)
        .await
        .unwrap();
    let repo = GitRepo::new(&dest, supervisor);

    assert_eq!(repo.branch_names().await.unwrap(), vec!["feature", "main"]);
    assert_eq!(repo.commit_count().await.unwrap(), 2);
    assert_eq!(
        repo.remote_urls().await.unwrap(),
        vec![origin.display().to_string()]
    );

    repo.checkout("feature").await.unwrap();
    let head = supervisor
        .run(&ShellCommand::new("git rev-parse --abbrev-ref HEAD").current_dir(&dest))
        .await;
    assert_eq!(head.stdout().trim(), "feature");
    assert!(repo.checkout("does-not-exist").await.is_err());

    std::fs::write(dest.join("junk.txt"), "local change").unwrap();
    repo.force_pull().await.unwrap();
    assert!(!dest.join("junk.txt").exists());
}

#[tokio::test]
async fn commit_history_is_listed_oldest_first_and_graded() {
    init_tracing();
    if !tool_available("git") {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    sh(
        dir.path(),
        "git init -q history && cd history \
         && git -c user.name=t -c user.email=t@example.org commit -q --allow-empty -m 'Initial project layout' \
         && git -c user.name=t -c user.email=t@example.org commit -q --allow-empty -m Mavenize \
         && git -c user.name=t -c user.email=t@example.org commit -q --allow-empty -m 'Add parser for lab files'",
    );
    let root = dir.path().join("history");
    let supervisor = ProcessSupervisor::default();
    let repo = GitRepo::new(&root, supervisor);

    let commits = repo.ordered_commits().await.unwrap();
    let messages: Vec<&str> = commits.iter().map(|c| c.message.as_str()).collect();
    assert_eq!(
        messages,
        vec!["Initial project layout", "Mavenize", "Add parser for lab files"]
    );
    assert!(commits.iter().all(|c| c.id.starts_with(&c.short_id)));

    let subject = CapabilityRegistry::with_default_providers(supervisor).discover("t/history", &root);
    let configuration = GradingConfiguration::new(root.display().to_string(), dir.path());
    let mut ctx = GradingContext::new(&configuration);
    ctx.set_subject(subject);

    let part = GitHistoryPartGrader::new("history", -4.0)
        .grade(&mut ctx)
        .await
        .unwrap();

    assert_eq!(part.grade, -0.5);
    assert_eq!(
        part.comments,
        vec![format!("`{}` Mavenize --> 1 word is too short", commits[1].short_id)]
    );
}

#[tokio::test]
async fn repository_without_remotes_lists_none() {
    init_tracing();
    if !tool_available("git") {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    sh(dir.path(), "git init -q alone");

    let repo = GitRepo::new(dir.path().join("alone"), ProcessSupervisor::default());

    assert!(repo.remote_urls().await.unwrap().is_empty());
}

#[tokio::test]
async fn clone_step_clones_then_force_pulls_and_checks_out_branch() {
    init_tracing();
    if !tool_available("git") {
        eprintln!("git not installed; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let origin = upstream(dir.path());
    let workspace = dir.path().join("ws");
    let supervisor = ProcessSupervisor::default();
    let step = CloneStep::new(CapabilityRegistry::with_default_providers(supervisor), supervisor)
        .branch(Some("feature".to_string()));
    let pipeline = Pipeline::new().add_clone_step(step).add_fn_step("inspect", |ctx| {
        let subject = ctx.subject().expect("subject attached");
        assert_eq!(subject.kinds(), vec![CapabilityKind::VersionControl]);
        ctx.set_data("inspected", true);
        Ok(())
    });
    let configuration = GradingConfiguration::new(origin.display().to_string(), &workspace);

    let (first, ctx) = pipeline.execute(&configuration, GradingContext::new).await;
    let (second, _) = pipeline.execute(&configuration, GradingContext::new).await;

    assert_eq!(first, 0);
    assert_eq!(second, 0);
    assert_eq!(ctx.data("inspected"), Some(&serde_json::Value::Bool(true)));
    let clone_root = workspace.join(dir.path().file_name().unwrap()).join("origin");
    assert!(clone_root.join(".git").is_dir());
}

#[tokio::test]
async fn build_tool_reports_its_version() {
    init_tracing();
    if !cargo_usable() {
        eprintln!("cargo unavailable for nested builds; skipping");
        return;
    }
    let dir = tempfile::tempdir().unwrap();
    let root = cargo_project(dir.path(), "");
    let subject = CapabilityRegistry::with_default_providers(ProcessSupervisor::default())
        .discover("lab", &root);
    let handle = subject.build_tool().expect("cargo project detected");

    let version = handle
        .with_context_async(|project| async move {
            assert_eq!(project.tool(), BuildTool::Cargo);
            project.version().await
        })
        .await
        .unwrap();

    assert!(version.is_some_and(|v| v.starts_with("cargo")));
}

#[tokio::test]
async fn passing_project_gets_full_credit() {
    init_tracing();
    if !cargo_usable() {
        eprintln!("cargo unavailable for nested builds; skipping");
        return;
    }
    let (grade, comments, compile_failed, test_failed) = grade_cargo_project(
        "pub fn add(a: i32, b: i32) -> i32 { a + b }\n\
         #[cfg(test)]\nmod tests {\n    #[test]\n    fn adds() { assert_eq!(super::add(1, 1), 2); }\n}\n",
    )
    .await;

    assert_eq!(grade, 10.0);
    assert!(comments.is_empty());
    assert!(!compile_failed);
    assert!(!test_failed);
}

#[tokio::test]
async fn failing_tests_get_half_credit() {
    init_tracing();
    if !cargo_usable() {
        eprintln!("cargo unavailable for nested builds; skipping");
        return;
    }
    let (grade, comments, compile_failed, test_failed) = grade_cargo_project(
        "pub fn add(a: i32, b: i32) -> i32 { a - b }\n\
         #[cfg(test)]\nmod tests {\n    #[test]\n    fn adds() { assert_eq!(super::add(1, 1), 2); }\n}\n",
    )
    .await;

    assert_eq!(grade, 5.0);
    assert_eq!(comments, vec![TEST_FAILURES.to_string()]);
    assert!(!compile_failed);
    assert!(test_failed);
}

#[tokio::test]
async fn compilation_errors_get_no_credit() {
    init_tracing();
    if !cargo_usable() {
        eprintln!("cargo unavailable for nested builds; skipping");
        return;
    }
    let (grade, comments, compile_failed, test_failed) =
        grade_cargo_project("pub fn broken( -> i32 {\n").await;

    assert_eq!(grade, 0.0);
    assert_eq!(comments, vec![COMPILATION_FAILED.to_string()]);
    assert!(compile_failed);
    assert!(test_failed);
}
