// tests/session_tests.rs

use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use quiz_session::{
    HttpQuizApi, QuizSession, SessionCommand, SessionError, SessionEvent, SessionSettings,
    config::Config, models::answer::AnswerCreate, run_session, session::SessionStatus,
};
use serde_json::json;
use tokio::sync::mpsc;

#[derive(Default)]
struct MockBackend {
    submissions: Mutex<Vec<Vec<AnswerCreate>>>,
    failures_left: AtomicUsize,
    expired_credentials: std::sync::atomic::AtomicBool,
}

type Shared = Arc<MockBackend>;

async fn get_quiz(Path(id): Path<i64>) -> Response {
    Json(json!({
        "id": id,
        "title": "Geography",
        "subject": "Geography",
        "grade_level": "7",
        "duration_minutes": 10,
        "passing_score": 50.0
    }))
    .into_response()
}

async fn get_questions(Path(id): Path<i64>) -> Response {
    if id == 2 {
        return Json(json!([])).into_response();
    }
    Json(json!([
        {
            "id": 21, "question_text": "Capital of France?", "question_type": "multiple_choice",
            "options": ["Lyon", "Paris"], "points": 1, "order_index": 0
        },
        {
            "id": 22, "question_text": "The Nile is in Africa.", "question_type": "true_false",
            "points": 1, "order_index": 1
        },
        {
            "id": 23, "question_text": "Name a desert.", "question_type": "short_answer",
            "points": 1, "order_index": 2
        }
    ]))
    .into_response()
}

async fn take_quiz(
    State(backend): State<Shared>,
    Path(id): Path<i64>,
    Json(answers): Json<Vec<AnswerCreate>>,
) -> Response {
    if backend.expired_credentials.load(Ordering::SeqCst) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Token expired" })),
        )
            .into_response();
    }
    let failing = backend
        .failures_left
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok();
    if failing {
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "detail": "Try again later" })),
        )
            .into_response();
    }

    let answered = answers.iter().filter(|a| !a.answer_text.is_empty()).count();
    let total = answers.len();
    backend.submissions.lock().unwrap().push(answers);

    Json(json!({
        "quiz_id": id,
        "score": answered as f64,
        "total_points": total as f64,
        "percentage": answered as f64 / total as f64 * 100.0
    }))
    .into_response()
}

async fn spawn_app() -> (HttpQuizApi, Shared) {
    let backend = Shared::default();

    let app = Router::new()
        .route("/quizzes/{id}", get(get_quiz))
        .route("/quizzes/{id}/questions", get(get_questions))
        .route("/quizzes/{id}/take", post(take_quiz))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = format!("http://{}", listener.local_addr().unwrap());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let config = Config {
        api_url: address,
        ..Config::default()
    };
    (HttpQuizApi::new(&config).unwrap(), backend)
}

async fn load(api: HttpQuizApi, quiz_id: i64) -> Result<QuizSession, SessionError> {
    let api = Arc::new(api);
    QuizSession::load(api.as_ref(), api.clone(), quiz_id, SessionSettings::default()).await
}

#[tokio::test]
async fn test_full_attempt_over_http() {
    let (api, backend) = spawn_app().await;
    let mut session = load(api, 1).await.unwrap();

    assert_eq!(session.quiz().title, "Geography");
    assert_eq!(session.remaining_millis(), 600_000);

    let (tx, mut commands) = mpsc::channel(8);
    let (events_tx, mut events) = mpsc::unbounded_channel();

    tx.send(SessionCommand::Choose(1)).await.unwrap();
    tx.send(SessionCommand::Next).await.unwrap();
    tx.send(SessionCommand::Next).await.unwrap();
    tx.send(SessionCommand::Answer("Sahara".into())).await.unwrap();
    tx.send(SessionCommand::Submit).await.unwrap();

    let result = run_session(&mut session, &mut commands, &events_tx)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(result.score, 2.0);
    assert!(result.passed(session.quiz().passing_score));
    assert_eq!(session.status(), SessionStatus::Submitted);

    let submissions = backend.submissions.lock().unwrap().clone();
    assert_eq!(submissions.len(), 1);
    let texts: Vec<&str> = submissions[0].iter().map(|a| a.answer_text.as_str()).collect();
    assert_eq!(texts, vec!["Paris", "", "Sahara"]);

    let mut submitted = 0;
    while let Ok(event) = events.try_recv() {
        if matches!(event, SessionEvent::Submitted(_)) {
            submitted += 1;
        }
    }
    assert_eq!(submitted, 1);
}

#[tokio::test]
async fn test_quiz_without_questions_cannot_start() {
    let (api, _) = spawn_app().await;

    let err = load(api, 2).await.unwrap_err();

    assert!(matches!(err, SessionError::InvalidQuizState(_)));
}

#[tokio::test]
async fn test_retry_after_server_failure() {
    let (api, backend) = spawn_app().await;
    backend.failures_left.store(1, Ordering::SeqCst);
    let mut session = load(api, 1).await.unwrap();

    session.record_answer(21, "Paris");

    let err = session.submit().await.unwrap_err();
    assert!(matches!(err, SessionError::SubmissionFailure(_)));
    assert!(!err.is_unauthorized());
    assert_eq!(session.status(), SessionStatus::Active);
    assert_eq!(session.answer(21), Some("Paris"));

    let result = session.submit().await.unwrap();
    assert!(result.is_some());
    assert_eq!(backend.submissions.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_expired_credentials_surface_as_unauthorized() {
    let (api, backend) = spawn_app().await;
    backend.expired_credentials.store(true, Ordering::SeqCst);
    let mut session = load(api, 1).await.unwrap();

    let (tx, mut commands) = mpsc::channel(8);
    let (events_tx, _events) = mpsc::unbounded_channel();
    tx.send(SessionCommand::Submit).await.unwrap();

    let err = run_session(&mut session, &mut commands, &events_tx)
        .await
        .unwrap_err();

    assert!(err.is_unauthorized());
    assert_eq!(session.status(), SessionStatus::Errored);
    assert!(!session.countdown_running());
}
