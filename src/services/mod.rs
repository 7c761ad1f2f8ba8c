// src/services/mod.rs

pub mod http;

use async_trait::async_trait;

use crate::{
    error::ApiError,
    models::{answer::AnswerCreate, question::Question, quiz::Quiz, quiz_result::QuizResult},
};

pub use http::HttpQuizApi;

/// Read-only source of quiz metadata and questions.
#[async_trait]
pub trait QuizProvider: Send + Sync {
    /// Fails with `ApiError::NotFound` if no such quiz exists.
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, ApiError>;

    /// Questions in presentation order. May be empty.
    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, ApiError>;
}

/// Write endpoint that grades and records a completed attempt.
#[async_trait]
pub trait SubmissionSink: Send + Sync {
    async fn submit_answers(
        &self,
        quiz_id: i64,
        answers: &[AnswerCreate],
    ) -> Result<QuizResult, ApiError>;
}
