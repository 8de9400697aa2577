// src/capability/build_tool.rs

//! Build-tool capability, detected from the manifest at the subject root.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Result;
use tracing::debug;

use crate::fs::FileSystem;
use crate::process::{ProcessOutcome, ProcessSupervisor, ShellCommand};

use super::{Capability, CapabilityContext, CapabilityHandle, CapabilityKind, CapabilityProvider};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildTool {
    Maven,
    Gradle,
    Cargo,
    Npm,
}

impl BuildTool {
    /// Detection order; the first tool whose manifest exists wins.
    pub const ALL: [BuildTool; 4] = [
        BuildTool::Maven,
        BuildTool::Gradle,
        BuildTool::Cargo,
        BuildTool::Npm,
    ];

    pub fn manifests(self) -> &'static [&'static str] {
        match self {
            BuildTool::Maven => &["pom.xml"],
            BuildTool::Gradle => &["build.gradle", "build.gradle.kts"],
            BuildTool::Cargo => &["Cargo.toml"],
            BuildTool::Npm => &["package.json"],
        }
    }

    fn executable(self) -> &'static str {
        match self {
            BuildTool::Maven => "mvn",
            BuildTool::Gradle => "gradle",
            BuildTool::Cargo => "cargo",
            BuildTool::Npm => "npm",
        }
    }

    fn compile_line(self) -> &'static str {
        match self {
            BuildTool::Maven => "mvn -B -q -DskipTests test-compile",
            BuildTool::Gradle => "gradle -q testClasses",
            BuildTool::Cargo => "cargo build --all-targets --quiet",
            BuildTool::Npm => "npm install --silent && npm run build --if-present --silent",
        }
    }

    fn test_line(self) -> &'static str {
        match self {
            BuildTool::Maven => "mvn -B -q test",
            BuildTool::Gradle => "gradle -q test",
            BuildTool::Cargo => "cargo test --quiet",
            BuildTool::Npm => "npm test --silent",
        }
    }
}

impl fmt::Display for BuildTool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.executable())
    }
}

/// A project buildable by a known tool.
#[derive(Debug, Clone)]
pub struct BuildProject {
    tool: BuildTool,
    root: PathBuf,
    manifest: PathBuf,
    supervisor: ProcessSupervisor,
}

impl CapabilityContext for BuildProject {
    const KIND: CapabilityKind = CapabilityKind::BuildTool;
}

impl BuildProject {
    pub fn new(
        tool: BuildTool,
        root: impl Into<PathBuf>,
        manifest: impl Into<PathBuf>,
        supervisor: ProcessSupervisor,
    ) -> Self {
        Self {
            tool,
            root: root.into(),
            manifest: manifest.into(),
            supervisor,
        }
    }

    pub fn tool(&self) -> BuildTool {
        self.tool
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn manifest(&self) -> &Path {
        &self.manifest
    }

    pub fn compile_command(&self) -> ShellCommand {
        ShellCommand::new(self.tool.compile_line()).current_dir(&self.root)
    }

    pub fn test_command(&self) -> ShellCommand {
        ShellCommand::new(self.tool.test_line()).current_dir(&self.root)
    }

    pub async fn compile(&self, timeout: Option<Duration>) -> ProcessOutcome {
        self.execute(self.compile_command(), timeout).await
    }

    pub async fn test(&self, timeout: Option<Duration>) -> ProcessOutcome {
        self.execute(self.test_command(), timeout).await
    }

    /// First line of `<tool> --version`, if the tool is installed.
    pub async fn version(&self) -> Option<String> {
        let command =
            ShellCommand::new(format!("{} --version", self.tool.executable())).current_dir(&self.root);
        let outcome = self.supervisor.run(&command).await;
        if !outcome.is_success() {
            debug!(tool = %self.tool, exit_code = outcome.exit_code(), "version check failed");
            return None;
        }
        outcome
            .stdout()
            .lines()
            .map(str::trim)
            .find(|l| !l.is_empty())
            .map(str::to_string)
    }

    async fn execute(&self, command: ShellCommand, timeout: Option<Duration>) -> ProcessOutcome {
        match timeout {
            Some(limit) => self.supervisor.run_with_timeout(&command, limit).await,
            None => self.supervisor.run(&command).await,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildToolProvider {
    supervisor: ProcessSupervisor,
}

impl BuildToolProvider {
    pub fn new(supervisor: ProcessSupervisor) -> Self {
        Self { supervisor }
    }
}

impl CapabilityProvider for BuildToolProvider {
    fn kind(&self) -> CapabilityKind {
        CapabilityKind::BuildTool
    }

    fn name(&self) -> &str {
        "build-tool"
    }

    fn detect(&self, root: &Path, fs: &dyn FileSystem) -> Result<Option<Capability>> {
        for tool in BuildTool::ALL {
            for manifest in tool.manifests() {
                let path = root.join(manifest);
                if fs.is_file(&path) {
                    let project = BuildProject::new(tool, root, path, self.supervisor);
                    return Ok(Some(CapabilityHandle::new(project).into()));
                }
            }
        }
        Ok(None)
    }
}
