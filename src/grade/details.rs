// src/grade/details.rs

//! Grade parts and their aggregation.

use serde::{Deserialize, Serialize};

/// One named contribution to a subject's grade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradePart {
    pub id: String,
    pub grade: f64,
    pub max_grade: Option<f64>,
    pub comments: Vec<String>,
}

impl GradePart {
    /// Build a part as-is, without clamping.
    pub fn new(
        id: impl Into<String>,
        grade: f64,
        max_grade: Option<f64>,
        comments: Vec<String>,
    ) -> Self {
        Self {
            id: id.into(),
            grade,
            max_grade,
            comments,
        }
    }

    /// Build a part whose grade is clamped to `[min_grade, max_grade]`.
    ///
    /// A part without maximum is a pure penalty: its upper bound is 0.
    pub fn bounded(
        id: impl Into<String>,
        grade: f64,
        min_grade: f64,
        max_grade: Option<f64>,
        comments: Vec<String>,
    ) -> Self {
        let upper = max_grade.unwrap_or(0.0);
        let clamped = grade.max(min_grade).min(upper);
        Self::new(id, clamped, max_grade, comments)
    }
}

/// Ordered, append-only list of grade parts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GradeDetails {
    parts: Vec<GradePart>,
}

impl GradeDetails {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(parts: Vec<GradePart>) -> Self {
        Self { parts }
    }

    /// Single zero-credit part carrying a failure message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self::from_parts(vec![GradePart::new(
            "<init>",
            0.0,
            None,
            vec![message.into()],
        )])
    }

    pub fn add_part(&mut self, part: GradePart) {
        self.parts.push(part);
    }

    pub fn parts(&self) -> &[GradePart] {
        &self.parts
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Sum of the parts' grades, rounded to 2 decimals, never below 0.
    pub fn grade(&self) -> f64 {
        round(self.parts.iter().map(|p| p.grade).sum(), 2).max(0.0)
    }

    /// Sum of the parts' maxima (absent counts as 0), rounded to 2 decimals.
    pub fn max_grade(&self) -> f64 {
        round(
            self.parts.iter().map(|p| p.max_grade.unwrap_or(0.0)).sum(),
            2,
        )
    }
}

/// Round `value` to `precision` decimal places.
pub fn round(value: f64, precision: i32) -> f64 {
    let scale = 10f64.powi(precision);
    (value * scale).round() / scale
}
