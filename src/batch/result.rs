// src/batch/result.rs

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::grade::GradeDetails;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerResult {
    pub owner: String,
    pub grade_details: GradeDetails,
}

/// Outcome of one batch, keyed (and therefore sorted) by subject id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub name: String,
    pub owners: BTreeMap<String, OwnerResult>,
    pub time: DateTime<Utc>,
}

impl BatchResult {
    pub fn grade_of(&self, subject_id: &str) -> Option<f64> {
        self.owners
            .get(subject_id)
            .map(|r| r.grade_details.grade())
    }
}

/// Accumulates per-subject results, keeping the best one per subject.
#[derive(Debug, Clone, Default)]
pub struct BatchResultBuilder {
    name: String,
    owners: BTreeMap<String, OwnerResult>,
}

impl BatchResultBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owners: BTreeMap::new(),
        }
    }

    /// Record a result. A subject already present is only replaced by a
    /// strictly higher total grade. Returns whether `details` was kept.
    pub fn record(&mut self, subject_id: &str, details: GradeDetails) -> bool {
        if let Some(existing) = self.owners.get(subject_id) {
            if details.grade() <= existing.grade_details.grade() {
                return false;
            }
        }
        self.owners.insert(
            subject_id.to_string(),
            OwnerResult {
                owner: owner_of(subject_id).to_string(),
                grade_details: details,
            },
        );
        true
    }

    pub fn get(&self, subject_id: &str) -> Option<&OwnerResult> {
        self.owners.get(subject_id)
    }

    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    pub fn build(&self, time: DateTime<Utc>) -> BatchResult {
        BatchResult {
            name: self.name.clone(),
            owners: self.owners.clone(),
            time,
        }
    }
}

/// Owner part of a subject id (`alice/exercise` -> `alice`).
pub fn owner_of(subject_id: &str) -> &str {
    subject_id.split('/').next().unwrap_or(subject_id)
}
