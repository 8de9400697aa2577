#![allow(dead_code)]

use gradeflow::config::{
    BatchSection, CallbackSection, ConfigFile, GraderSection, PartConfig, ProcessSection,
    RawConfigFile,
};
use gradeflow::types::PartKind;
use std::path::PathBuf;

/// Builder for `ConfigFile` to simplify test setup.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                grader: GraderSection {
                    name: "test-session".to_string(),
                    repo_url_template: "https://github.com/{slug}/exercise".to_string(),
                    workspace: PathBuf::from("target/repositories"),
                    reset_workspace: false,
                    force_pull: true,
                    branch: None,
                },
                callback: CallbackSection::default(),
                batch: BatchSection::default(),
                process: ProcessSection::default(),
                parts: Vec::new(),
            },
        }
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.config.grader.name = name.to_string();
        self
    }

    pub fn with_repo_url_template(mut self, template: &str) -> Self {
        self.config.grader.repo_url_template = template.to_string();
        self
    }

    pub fn with_workspace(mut self, workspace: impl Into<PathBuf>) -> Self {
        self.config.grader.workspace = workspace.into();
        self
    }

    pub fn with_callback(mut self, url: &str, password: Option<&str>) -> Self {
        self.config.callback.url = Some(url.to_string());
        self.config.callback.password = password.map(str::to_string);
        self
    }

    pub fn with_poll_interval(mut self, interval: &str) -> Self {
        self.config.process.poll_interval = interval.to_string();
        self
    }

    pub fn with_part(mut self, part: PartConfig) -> Self {
        self.config.parts.push(part);
        self
    }

    /// The raw, unvalidated config.
    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `PartConfig`.
pub struct PartConfigBuilder {
    part: PartConfig,
}

impl PartConfigBuilder {
    pub fn build_part(name: &str, max_grade: f64) -> Self {
        Self {
            part: PartConfig {
                kind: PartKind::Build,
                name: name.to_string(),
                max_grade: Some(max_grade),
                min_grade: None,
                cmd: None,
                timeout: None,
            },
        }
    }

    pub fn command_part(name: &str, cmd: &str, max_grade: f64) -> Self {
        Self {
            part: PartConfig {
                kind: PartKind::Command,
                name: name.to_string(),
                max_grade: Some(max_grade),
                min_grade: None,
                cmd: Some(cmd.to_string()),
                timeout: None,
            },
        }
    }

    pub fn git_history_part(name: &str, min_grade: f64) -> Self {
        Self {
            part: PartConfig {
                kind: PartKind::GitHistory,
                name: name.to_string(),
                max_grade: None,
                min_grade: Some(min_grade),
                cmd: None,
                timeout: None,
            },
        }
    }

    pub fn max_grade(mut self, max: Option<f64>) -> Self {
        self.part.max_grade = max;
        self
    }

    pub fn min_grade(mut self, min: f64) -> Self {
        self.part.min_grade = Some(min);
        self
    }

    pub fn without_cmd(mut self) -> Self {
        self.part.cmd = None;
        self
    }

    pub fn timeout(mut self, timeout: &str) -> Self {
        self.part.timeout = Some(timeout.to_string());
        self
    }

    pub fn build(self) -> PartConfig {
        self.part
    }
}
