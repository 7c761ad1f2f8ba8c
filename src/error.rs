// src/error.rs

use std::fmt;

use reqwest::StatusCode;

/// Errors returned by the backend collaborators (quiz provider, submission sink).
/// Mirrors the HTTP status classes the backend answers with.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiError {
    // 404 Not Found
    NotFound(String),

    // 400 / 422 malformed payload
    Validation(String),

    // 401 expired or missing credential
    Unauthorized(String),

    // 403 quiz not available to this user
    Forbidden(String),

    // 5xx and anything else the backend reports
    ServerError(String),

    // Connection refused, timeout, TLS...
    Transport(String),

    // Response body did not match the expected shape
    Decode(String),
}

impl ApiError {
    /// Maps an HTTP error status plus the `detail` message from the body.
    pub fn from_status(status: StatusCode, detail: String) -> Self {
        match status {
            StatusCode::NOT_FOUND => ApiError::NotFound(detail),
            StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY => {
                ApiError::Validation(detail)
            }
            StatusCode::UNAUTHORIZED => ApiError::Unauthorized(detail),
            StatusCode::FORBIDDEN => ApiError::Forbidden(detail),
            _ => ApiError::ServerError(format!("{}: {}", status.as_u16(), detail)),
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized(_))
    }

    /// Human readable message, without the variant name.
    pub fn message(&self) -> &str {
        match self {
            ApiError::NotFound(msg)
            | ApiError::Validation(msg)
            | ApiError::Unauthorized(msg)
            | ApiError::Forbidden(msg)
            | ApiError::ServerError(msg)
            | ApiError::Transport(msg)
            | ApiError::Decode(msg) => msg,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::Decode(err.to_string())
        } else {
            ApiError::Transport(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

impl From<url::ParseError> for ApiError {
    fn from(err: url::ParseError) -> Self {
        ApiError::Transport(format!("invalid API url: {}", err))
    }
}

/// Errors surfaced by a quiz session.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionError {
    /// The quiz cannot be taken (no questions, non-positive duration).
    /// Fatal to the attempt: the caller must leave the session view.
    InvalidQuizState(String),

    /// Quiz metadata or questions could not be fetched.
    LoadFailure(ApiError),

    /// The sink rejected the attempt. The session is active again and may be resubmitted.
    SubmissionFailure(ApiError),
}

impl SessionError {
    /// True when the caller must send the user back to log in instead of retrying.
    pub fn is_unauthorized(&self) -> bool {
        match self {
            SessionError::LoadFailure(e) | SessionError::SubmissionFailure(e) => {
                e.is_unauthorized()
            }
            SessionError::InvalidQuizState(_) => false,
        }
    }
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::InvalidQuizState(msg) => write!(f, "quiz cannot be started: {}", msg),
            SessionError::LoadFailure(e) => write!(f, "failed to load quiz: {}", e),
            SessionError::SubmissionFailure(e) => write!(f, "failed to submit quiz: {}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::LoadFailure(e) | SessionError::SubmissionFailure(e) => Some(e),
            SessionError::InvalidQuizState(_) => None,
        }
    }
}

impl From<validator::ValidationErrors> for SessionError {
    fn from(err: validator::ValidationErrors) -> Self {
        SessionError::InvalidQuizState(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert_eq!(
            ApiError::from_status(StatusCode::NOT_FOUND, "Quiz not found".into()),
            ApiError::NotFound("Quiz not found".into())
        );
        assert_eq!(
            ApiError::from_status(StatusCode::UNPROCESSABLE_ENTITY, "bad".into()),
            ApiError::Validation("bad".into())
        );
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "expired".into()).is_unauthorized());
        assert_eq!(
            ApiError::from_status(StatusCode::FORBIDDEN, "Quiz not available".into()),
            ApiError::Forbidden("Quiz not available".into())
        );
    }

    #[test]
    fn test_unknown_status_is_server_error() {
        let err = ApiError::from_status(StatusCode::BAD_GATEWAY, "upstream".into());
        assert_eq!(err, ApiError::ServerError("502: upstream".into()));
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn test_session_error_unauthorized_passthrough() {
        let err = SessionError::SubmissionFailure(ApiError::Unauthorized("expired".into()));
        assert!(err.is_unauthorized());
        assert!(!SessionError::InvalidQuizState("empty".into()).is_unauthorized());
        assert!(
            !SessionError::SubmissionFailure(ApiError::ServerError("boom".into()))
                .is_unauthorized()
        );
    }

    #[test]
    fn test_message_strips_variant_name() {
        let err = ApiError::from_status(StatusCode::NOT_FOUND, "Quiz not found".into());
        assert_eq!(err.message(), "Quiz not found");
        assert_eq!(ApiError::Transport("timed out".into()).message(), "timed out");
    }
}
