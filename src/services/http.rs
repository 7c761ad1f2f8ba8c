// src/services/http.rs

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::{
    config::Config,
    error::ApiError,
    models::{answer::AnswerCreate, question::Question, quiz::Quiz, quiz_result::QuizResult},
    services::{QuizProvider, SubmissionSink},
};

/// HTTP client for the quiz backend.
///
/// * Attaches `Authorization: Bearer <token>` when a token is configured.
/// * Maps error statuses to `ApiError`, using the `detail` field of the body as message.
#[derive(Debug, Clone)]
pub struct HttpQuizApi {
    client: Client,
    base_url: Url,
    access_token: Option<String>,
}

impl HttpQuizApi {
    pub fn new(config: &Config) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Self::with_client(client, &config.api_url, config.access_token.clone())
    }

    pub fn with_client(
        client: Client,
        api_url: &str,
        access_token: Option<String>,
    ) -> Result<Self, ApiError> {
        // A trailing slash makes `join` append instead of replacing the last segment.
        let mut base = api_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        Ok(Self {
            client,
            base_url,
            access_token,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        Ok(self.base_url.join(path)?)
    }

    fn authorized(&self, req: RequestBuilder) -> RequestBuilder {
        match &self.access_token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    /// Liveness probe against `GET /health`.
    pub async fn health_check(&self) -> Result<(), ApiError> {
        let url = self.endpoint("health")?;
        let resp = self.client.get(url).send().await?;
        check_status(resp).await.map(|_| ())
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.endpoint(path)?;
        tracing::debug!("GET {}", url);

        let resp = self
            .authorized(self.client.get(url))
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Request to {} failed: {:?}", path, e);
                ApiError::from(e)
            })?;

        Ok(check_status(resp).await?.json::<T>().await?)
    }
}

/// Passes successful responses through, turns the rest into `ApiError`.
async fn check_status(resp: Response) -> Result<Response, ApiError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }

    let body = resp.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v.get("detail").map(detail_to_string))
        .unwrap_or_else(|| {
            if body.is_empty() {
                status.canonical_reason().unwrap_or("request failed").to_string()
            } else {
                body
            }
        });

    Err(ApiError::from_status(status, detail))
}

// Validation errors carry `detail` as a list of objects rather than a string.
fn detail_to_string(detail: &serde_json::Value) -> String {
    match detail {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl QuizProvider for HttpQuizApi {
    async fn get_quiz(&self, quiz_id: i64) -> Result<Quiz, ApiError> {
        self.get_json(&format!("quizzes/{}", quiz_id)).await
    }

    async fn get_questions(&self, quiz_id: i64) -> Result<Vec<Question>, ApiError> {
        self.get_json(&format!("quizzes/{}/questions", quiz_id)).await
    }
}

#[async_trait]
impl SubmissionSink for HttpQuizApi {
    async fn submit_answers(
        &self,
        quiz_id: i64,
        answers: &[AnswerCreate],
    ) -> Result<QuizResult, ApiError> {
        let url = self.endpoint(&format!("quizzes/{}/take", quiz_id))?;
        tracing::info!("Submitting {} answers for quiz {}", answers.len(), quiz_id);

        let resp = self
            .authorized(self.client.post(url))
            .json(answers)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to submit quiz {}: {:?}", quiz_id, e);
                ApiError::from(e)
            })?;

        Ok(check_status(resp).await?.json::<QuizResult>().await?)
    }
}
