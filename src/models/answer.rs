// src/models/answer.rs

use serde::{Deserialize, Serialize};

/// One entry of the payload posted to `POST /quizzes/{id}/take`.
/// Every question of the quiz gets exactly one entry, answered or not.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerCreate {
    pub question_id: i64,

    /// Empty string when the question was left blank.
    pub answer_text: String,

    /// Dwell time on the question, rounded to whole seconds.
    pub time_spent: u64,
}
