// src/session/controller.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use tokio::{task::AbortHandle, time::Instant};
use validator::Validate;

use crate::{
    error::{ApiError, SessionError},
    models::{answer::AnswerCreate, question::Question, quiz::Quiz, quiz_result::QuizResult},
    services::{QuizProvider, SubmissionSink},
    session::countdown::Countdown,
    utils::format,
};

/// Lifecycle of one attempt.
///
/// `Active -> Submitting -> Submitted` on success,
/// `Active -> Submitting -> Active` when the sink rejects the attempt.
/// `Errored` is terminal and only entered through [`QuizSession::abort`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Active,
    Submitting,
    Submitted,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Countdown period; each tick removes this much from the remaining time.
    pub tick_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_secs(1),
        }
    }
}

/// Result of applying one countdown tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Time left after the tick.
    Running { remaining_millis: u64 },
    /// Time is up and the session is still active: it must be submitted.
    Expired,
    /// The session is not active; the tick changed nothing.
    Idle,
}

/// State machine for one timed quiz attempt.
///
/// All mutations take `&mut self`, so ticks, navigation and submission never
/// interleave. The status guard makes a second submit a no-op.
pub struct QuizSession {
    quiz: Quiz,
    questions: Vec<Question>,
    current_index: usize,
    answers: HashMap<i64, String>,
    /// Accumulated dwell time per question id, in milliseconds.
    time_spent: HashMap<i64, u64>,
    duration_millis: u64,
    remaining_millis: u64,
    status: SessionStatus,
    /// When the current question became current. Moved together with `current_index`.
    dwell_start: Instant,
    started_at: DateTime<Utc>,
    started: Instant,
    countdown: Countdown,
    sink: Arc<dyn SubmissionSink>,
}

impl std::fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizSession")
            .field("quiz_id", &self.quiz.id)
            .field("status", &self.status)
            .field("current_index", &self.current_index)
            .field("remaining_millis", &self.remaining_millis)
            .field("answers", &self.answers)
            .field("time_spent", &self.time_spent)
            .finish()
    }
}

impl QuizSession {
    /// Starts an attempt and its countdown.
    ///
    /// Fails with `InvalidQuizState` (and starts no timer) when there are no
    /// questions or the duration is not positive.
    /// Must be called from within a tokio runtime.
    pub fn start(
        quiz: Quiz,
        questions: Vec<Question>,
        sink: Arc<dyn SubmissionSink>,
        settings: SessionSettings,
    ) -> Result<Self, SessionError> {
        if questions.is_empty() {
            return Err(SessionError::InvalidQuizState(format!(
                "quiz {} has no questions",
                quiz.id
            )));
        }
        quiz.validate()?;
        if settings.tick_interval.is_zero() {
            return Err(SessionError::InvalidQuizState(
                "tick interval must be positive".to_string(),
            ));
        }

        let Some(duration_millis) = quiz.duration_millis() else {
            return Err(SessionError::InvalidQuizState(format!(
                "quiz {} duration of {} minutes is out of range",
                quiz.id, quiz.duration_minutes
            )));
        };
        let now = Instant::now();

        tracing::info!(
            "Starting quiz {} ({} questions, {} minutes)",
            quiz.id,
            questions.len(),
            quiz.duration_minutes
        );

        Ok(Self {
            quiz,
            questions,
            current_index: 0,
            answers: HashMap::new(),
            time_spent: HashMap::new(),
            duration_millis,
            remaining_millis: duration_millis,
            status: SessionStatus::Active,
            dwell_start: now,
            started_at: Utc::now(),
            started: now,
            countdown: Countdown::start(settings.tick_interval),
            sink,
        })
    }

    /// Fetches the quiz and its questions, then starts the attempt.
    /// Questions are presented by ascending `order_index`.
    pub async fn load<P>(
        provider: &P,
        sink: Arc<dyn SubmissionSink>,
        quiz_id: i64,
        settings: SessionSettings,
    ) -> Result<Self, SessionError>
    where
        P: QuizProvider + ?Sized,
    {
        let quiz = provider.get_quiz(quiz_id).await.map_err(|e| {
            tracing::error!("Failed to fetch quiz {}: {}", quiz_id, e);
            SessionError::LoadFailure(e)
        })?;

        let mut questions = provider.get_questions(quiz_id).await.map_err(|e| {
            tracing::error!("Failed to fetch questions for quiz {}: {}", quiz_id, e);
            SessionError::LoadFailure(e)
        })?;
        questions.sort_by_key(|q| q.order_index);

        Self::start(quiz, questions, sink, settings)
    }

    /// Upserts the answer for a question. Ignored unless active and the id belongs to this quiz.
    pub fn record_answer(&mut self, question_id: i64, text: impl Into<String>) -> bool {
        if self.status != SessionStatus::Active {
            tracing::debug!("Ignoring answer for question {}: session not active", question_id);
            return false;
        }
        if !self.questions.iter().any(|q| q.id == question_id) {
            tracing::debug!("Ignoring answer for unknown question {}", question_id);
            return false;
        }

        self.answers.insert(question_id, text.into());
        true
    }

    /// Answers the current question.
    pub fn answer_current(&mut self, text: impl Into<String>) -> bool {
        let question_id = self.current_question().id;
        self.record_answer(question_id, text)
    }

    /// Moves to `index`, crediting the time spent on the question being left.
    /// Out of range or inactive: no-op, nothing changes.
    pub fn go_to_question(&mut self, index: usize) -> bool {
        if self.status != SessionStatus::Active || index >= self.questions.len() {
            tracing::debug!("Ignoring navigation to question index {}", index);
            return false;
        }

        self.flush_dwell(Instant::now());
        self.current_index = index;
        true
    }

    pub fn next(&mut self) -> bool {
        self.go_to_question(self.current_index + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current_index.checked_sub(1) {
            Some(index) => self.go_to_question(index),
            None => false,
        }
    }

    /// Applies one countdown tick.
    ///
    /// Remaining time only moves while active. A tick that finds no time left
    /// reports `Expired` again, so an auto-submit that failed is forced once more.
    pub fn tick(&mut self) -> TickOutcome {
        if self.status != SessionStatus::Active {
            return TickOutcome::Idle;
        }

        let step = u64::try_from(self.countdown.interval().as_millis()).unwrap_or(u64::MAX);
        self.remaining_millis = self.remaining_millis.saturating_sub(step);

        if self.remaining_millis == 0 {
            TickOutcome::Expired
        } else {
            TickOutcome::Running {
                remaining_millis: self.remaining_millis,
            }
        }
    }

    /// Waits for the next countdown tick. Never resolves once the countdown is cancelled.
    pub async fn next_tick(&mut self) {
        self.countdown.tick().await
    }

    /// Submits the attempt through the sink. Manual submit and timer expiry share this path.
    ///
    /// * `Ok(None)` when the session is not active (already submitting or done).
    /// * `Ok(Some(result))` once accepted; the countdown is stopped.
    /// * `Err(SubmissionFailure)` when rejected; the session is active again with
    ///   answers and dwell times intact. No automatic retry.
    pub async fn submit(&mut self) -> Result<Option<QuizResult>, SessionError> {
        let Some(payload) = self.begin_submit() else {
            return Ok(None);
        };

        let sink = Arc::clone(&self.sink);
        let outcome = sink.submit_answers(self.quiz.id, &payload).await;

        self.finish_submit(outcome).map(Some)
    }

    /// First half of [`submit`](Self::submit): flushes dwell time, moves to
    /// `Submitting` and returns the payload. `None` if not active.
    pub fn begin_submit(&mut self) -> Option<Vec<AnswerCreate>> {
        if self.status != SessionStatus::Active {
            tracing::debug!("Ignoring submit for quiz {}: status {:?}", self.quiz.id, self.status);
            return None;
        }

        self.flush_dwell(Instant::now());
        self.status = SessionStatus::Submitting;

        Some(self.build_payload())
    }

    /// Second half of [`submit`](Self::submit): applies the sink's answer.
    pub fn finish_submit(
        &mut self,
        outcome: Result<QuizResult, ApiError>,
    ) -> Result<QuizResult, SessionError> {
        if self.status != SessionStatus::Submitting {
            return Err(SessionError::InvalidQuizState(format!(
                "no submission in flight (status {:?})",
                self.status
            )));
        }

        match outcome {
            Ok(result) => {
                self.status = SessionStatus::Submitted;
                self.countdown.cancel();
                tracing::info!(
                    "Quiz {} submitted: {}/{} ({:.1}%)",
                    self.quiz.id,
                    result.score,
                    result.total_points,
                    result.percentage
                );
                Ok(result)
            }
            Err(e) => {
                self.status = SessionStatus::Active;
                self.dwell_start = Instant::now();
                tracing::warn!("Submission of quiz {} failed: {}", self.quiz.id, e);
                Err(SessionError::SubmissionFailure(e))
            }
        }
    }

    /// Ends the attempt without submitting, e.g. after the credential expired.
    pub fn abort(&mut self) {
        if self.status == SessionStatus::Submitted {
            return;
        }
        tracing::warn!("Aborting quiz {} session", self.quiz.id);
        self.status = SessionStatus::Errored;
        self.countdown.cancel();
    }

    /// Releases the countdown. Dropping the session does the same.
    pub fn close(&mut self) {
        self.countdown.cancel();
    }

    fn flush_dwell(&mut self, now: Instant) {
        let elapsed = now.saturating_duration_since(self.dwell_start);
        let elapsed = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        let question_id = self.questions[self.current_index].id;
        let total = self.time_spent.entry(question_id).or_insert(0);
        *total = total.saturating_add(elapsed);

        self.dwell_start = now;
    }

    fn build_payload(&self) -> Vec<AnswerCreate> {
        self.questions
            .iter()
            .map(|q| AnswerCreate {
                question_id: q.id,
                answer_text: self.answers.get(&q.id).cloned().unwrap_or_default(),
                time_spent: round_to_seconds(self.time_spent_millis(q.id)),
            })
            .collect()
    }

    pub fn quiz(&self) -> &Quiz {
        &self.quiz
    }

    pub fn quiz_id(&self) -> i64 {
        self.quiz.id
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current_question(&self) -> &Question {
        &self.questions[self.current_index]
    }

    pub fn is_first_question(&self) -> bool {
        self.current_index == 0
    }

    pub fn is_last_question(&self) -> bool {
        self.current_index + 1 == self.questions.len()
    }

    pub fn answer(&self, question_id: i64) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    pub fn answers(&self) -> &HashMap<i64, String> {
        &self.answers
    }

    /// A blank answer does not count as answered.
    pub fn is_answered(&self, question_id: i64) -> bool {
        self.answer(question_id).is_some_and(|a| !a.is_empty())
    }

    pub fn answered_count(&self) -> usize {
        self.questions.iter().filter(|q| self.is_answered(q.id)).count()
    }

    /// Dwell time credited so far; excludes the ongoing visit to the current question.
    pub fn time_spent_millis(&self, question_id: i64) -> u64 {
        self.time_spent.get(&question_id).copied().unwrap_or(0)
    }

    pub fn time_spent(&self) -> &HashMap<i64, u64> {
        &self.time_spent
    }

    pub fn duration_millis(&self) -> u64 {
        self.duration_millis
    }

    pub fn remaining_millis(&self) -> u64 {
        self.remaining_millis
    }

    pub fn is_time_warning(&self) -> bool {
        format::is_time_warning(self.remaining_millis)
    }

    pub fn progress_percent(&self) -> f64 {
        format::progress_percent(self.current_index, self.questions.len())
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    pub fn countdown_running(&self) -> bool {
        self.countdown.is_running()
    }

    pub fn countdown_handle(&self) -> Option<AbortHandle> {
        self.countdown.abort_handle()
    }
}

/// Whole seconds, halves rounded up.
fn round_to_seconds(millis: u64) -> u64 {
    millis.saturating_add(500) / 1000
}
