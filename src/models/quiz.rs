// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Publication state of a quiz on the backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuizStatus {
    Draft,
    #[default]
    Published,
    Archived,
}

/// Quiz metadata as returned by `GET /quizzes/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct Quiz {
    pub id: i64,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub subject: String,

    #[serde(default)]
    pub grade_level: String,

    /// Total time allotted to one attempt.
    #[validate(range(min = 1, message = "Quiz duration must be at least one minute."))]
    pub duration_minutes: i64,

    #[serde(default = "default_max_attempts")]
    pub max_attempts: i64,

    /// Percentage needed to pass. Only used for display.
    #[serde(default = "default_passing_score")]
    pub passing_score: f64,

    #[serde(default)]
    pub status: QuizStatus,

    #[serde(default)]
    pub is_ai_generated: bool,

    #[serde(default)]
    pub created_by: Option<i64>,

    #[serde(default)]
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

fn default_max_attempts() -> i64 {
    1
}

fn default_passing_score() -> f64 {
    60.0
}

impl Quiz {
    /// `None` for negative durations or ones too long to count in milliseconds.
    pub fn duration_millis(&self) -> Option<u64> {
        u64::try_from(self.duration_minutes).ok()?.checked_mul(60_000)
    }
}
