// src/models/quiz_result.rs

use serde::{Deserialize, Serialize};

/// Graded attempt returned by the backend after submission.
/// Opaque to the session: it is only displayed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuizResult {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub quiz_id: i64,
    #[serde(default)]
    pub student_id: i64,
    pub score: f64,
    pub total_points: f64,
    pub percentage: f64,
    /// Total seconds across all questions, as counted by the backend.
    #[serde(default)]
    pub time_spent: i64,
    #[serde(default = "default_attempt")]
    pub attempt_number: i64,
    #[serde(default)]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub analytics_data: Option<serde_json::Value>,
}

fn default_attempt() -> i64 {
    1
}

impl QuizResult {
    pub fn passed(&self, passing_score: f64) -> bool {
        self.percentage >= passing_score
    }
}
