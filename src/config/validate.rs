// src/config/validate.rs

use std::collections::HashSet;

use crate::config::model::{
    ConfigFile, PartConfig, PartSpec, ProcessSection, ProcessSettings, RawConfigFile,
};
use crate::errors::{GradeflowError, Result};
use crate::types::{parse_duration, PartKind};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::GradeflowError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_grader(&raw)?;
        let process = parse_process_section(&raw.process)?;
        let parts = validate_parts(&raw.parts)?;
        Ok(ConfigFile::new_unchecked(
            raw.grader,
            raw.callback,
            raw.batch,
            process,
            parts,
        ))
    }
}

fn validate_grader(cfg: &RawConfigFile) -> Result<()> {
    if cfg.grader.name.trim().is_empty() {
        return Err(GradeflowError::ConfigError(
            "[grader].name must not be empty".to_string(),
        ));
    }

    if !cfg.grader.repo_url_template.contains("{slug}") {
        return Err(GradeflowError::ConfigError(format!(
            "[grader].repo_url_template must contain '{{slug}}' (got '{}')",
            cfg.grader.repo_url_template
        )));
    }

    Ok(())
}

fn parse_process_section(section: &ProcessSection) -> Result<ProcessSettings> {
    let poll_interval = parse_duration(&section.poll_interval).map_err(|e| {
        GradeflowError::ConfigError(format!("invalid [process].poll_interval: {e}"))
    })?;
    let interrupt_grace = parse_duration(&section.interrupt_grace).map_err(|e| {
        GradeflowError::ConfigError(format!("invalid [process].interrupt_grace: {e}"))
    })?;

    if poll_interval.is_zero() {
        return Err(GradeflowError::ConfigError(
            "[process].poll_interval must be > 0".to_string(),
        ));
    }

    Ok(ProcessSettings {
        poll_interval,
        interrupt_grace,
    })
}

fn validate_parts(parts: &[PartConfig]) -> Result<Vec<PartSpec>> {
    if parts.is_empty() {
        return Err(GradeflowError::ConfigError(
            "config must contain at least one [[part]] section".to_string(),
        ));
    }

    let mut seen = HashSet::new();
    let mut specs = Vec::with_capacity(parts.len());

    for part in parts {
        if part.name.trim().is_empty() {
            return Err(GradeflowError::ConfigError(
                "[[part]] name must not be empty".to_string(),
            ));
        }
        if !seen.insert(part.name.as_str()) {
            return Err(GradeflowError::ConfigError(format!(
                "duplicate part name '{}'",
                part.name
            )));
        }
        let min_grade = part.min_grade.unwrap_or(0.0);
        let max_grade = match (part.kind, part.max_grade) {
            (PartKind::GitHistory, Some(_)) => {
                return Err(GradeflowError::ConfigError(format!(
                    "part '{}' of kind \"git_history\" is penalty-only and takes no `max_grade`",
                    part.name
                )));
            }
            (PartKind::GitHistory, None) => {
                if min_grade >= 0.0 {
                    return Err(GradeflowError::ConfigError(format!(
                        "part '{}' of kind \"git_history\" requires a negative `min_grade`",
                        part.name
                    )));
                }
                None
            }
            (_, None) => {
                return Err(GradeflowError::ConfigError(format!(
                    "part '{}' requires a `max_grade`",
                    part.name
                )));
            }
            (_, Some(max)) => {
                if max < 0.0 {
                    return Err(GradeflowError::ConfigError(format!(
                        "part '{}' has a negative max_grade ({})",
                        part.name, max
                    )));
                }
                if min_grade > max {
                    return Err(GradeflowError::ConfigError(format!(
                        "part '{}' has min_grade {} greater than max_grade {}",
                        part.name, min_grade, max
                    )));
                }
                Some(max)
            }
        };

        let cmd = part.cmd.as_ref().map(|c| c.trim().to_string());
        if part.kind == PartKind::Command && cmd.as_deref().is_none_or(str::is_empty) {
            return Err(GradeflowError::ConfigError(format!(
                "part '{}' of kind \"command\" requires a `cmd`",
                part.name
            )));
        }

        let timeout = match part.timeout.as_deref() {
            Some(raw) => Some(parse_duration(raw).map_err(|e| {
                GradeflowError::ConfigError(format!(
                    "part '{}' has an invalid timeout: {}",
                    part.name, e
                ))
            })?),
            None => None,
        };

        specs.push(PartSpec {
            kind: part.kind,
            name: part.name.clone(),
            max_grade,
            min_grade,
            cmd,
            timeout,
        });
    }

    Ok(specs)
}
