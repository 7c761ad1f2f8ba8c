// src/models/question.rs

use serde::{Deserialize, Serialize};

/// Kind of answer a question expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    MultipleChoice,
    TrueFalse,
    ShortAnswer,
    Essay,
}

impl QuestionType {
    /// Label shown next to the question, e.g. "multiple choice".
    pub fn label(&self) -> &'static str {
        match self {
            QuestionType::MultipleChoice => "multiple choice",
            QuestionType::TrueFalse => "true false",
            QuestionType::ShortAnswer => "short answer",
            QuestionType::Essay => "essay",
        }
    }
}

/// A question as served to students by `GET /quizzes/{id}/questions`.
/// The correct answer is never needed client-side and is not modelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The prompt shown to the student.
    pub question_text: String,

    pub question_type: QuestionType,

    /// Only present for `multiple_choice`.
    #[serde(default)]
    pub options: Option<Vec<String>>,

    #[serde(default = "default_points")]
    pub points: i64,

    #[serde(default)]
    pub difficulty_level: Option<String>,

    /// Position within the quiz; questions are presented in ascending order.
    #[serde(default)]
    pub order_index: i64,
}

fn default_points() -> i64 {
    1
}

impl Question {
    /// Selectable answers for choice questions. Empty for free-text types.
    pub fn choices(&self) -> Vec<String> {
        match self.question_type {
            QuestionType::MultipleChoice => self.options.clone().unwrap_or_default(),
            QuestionType::TrueFalse => vec!["True".to_string(), "False".to_string()],
            QuestionType::ShortAnswer | QuestionType::Essay => Vec::new(),
        }
    }

    pub fn is_free_text(&self) -> bool {
        matches!(
            self.question_type,
            QuestionType::ShortAnswer | QuestionType::Essay
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn question(question_type: QuestionType, options: Option<Vec<String>>) -> Question {
        Question {
            id: 1,
            question_text: "Pick one".to_string(),
            question_type,
            options,
            points: 1,
            difficulty_level: None,
            order_index: 0,
        }
    }

    #[test]
    fn test_deserialize_backend_question() {
        let q: Question = serde_json::from_value(serde_json::json!({
            "id": 3,
            "question_text": "2 + 2 = ?",
            "question_type": "multiple_choice",
            "options": ["3", "4"],
            "points": 2,
            "difficulty_level": "easy",
            "order_index": 1,
            "quiz_id": 9,
            "created_at": "2024-01-01T00:00:00Z"
        }))
        .unwrap();

        assert_eq!(q.question_type, QuestionType::MultipleChoice);
        assert_eq!(q.choices(), vec!["3", "4"]);
        assert_eq!(q.points, 2);
    }

    #[test]
    fn test_true_false_choices_are_fixed() {
        let q = question(QuestionType::TrueFalse, None);
        assert_eq!(q.choices(), vec!["True", "False"]);
        assert!(!q.is_free_text());
    }

    #[test]
    fn test_free_text_has_no_choices() {
        let q = question(QuestionType::Essay, Some(vec!["ignored".into()]));
        assert!(q.choices().is_empty());
        assert!(q.is_free_text());
        assert_eq!(QuestionType::ShortAnswer.label(), "short answer");
    }
}
