#![allow(dead_code)]

use std::path::{Path, PathBuf};

pub use gradeflow_test_utils::{init_tracing, with_timeout};

/// Write `contents` as `Gradeflow.toml` under `dir` and return its path.
pub fn write_config(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("Gradeflow.toml");
    std::fs::write(&path, contents).expect("failed to write test config");
    path
}

/// Directory that looks like a checked-out Maven project.
pub fn maven_project(dir: &Path) -> PathBuf {
    let root = dir.join("alice").join("lab-1");
    std::fs::create_dir_all(&root).expect("failed to create project dir");
    std::fs::write(root.join("pom.xml"), "<project/>").expect("failed to write pom.xml");
    root
}
