// src/session/runner.rs

use tokio::sync::mpsc;

use crate::{
    error::SessionError,
    models::{question::Question, quiz_result::QuizResult},
    session::controller::{QuizSession, SessionStatus, TickOutcome},
};

/// User input fed to [`run_session`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionCommand {
    /// Answer the current question.
    Answer(String),
    /// Pick the n-th (0-based) choice of the current question.
    Choose(usize),
    AnswerQuestion { question_id: i64, text: String },
    GoTo(usize),
    Next,
    Previous,
    Submit,
    /// Leave the attempt without submitting.
    Quit,
}

/// What the view needs to redraw.
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    QuestionShown {
        index: usize,
        total: usize,
        /// Share of the quiz reached, in percent.
        progress: f64,
        question: Question,
        answer: Option<String>,
    },
    Tick {
        remaining_millis: u64,
        warning: bool,
    },
    /// Time ran out; a submission is being forced.
    Expired,
    Submitting,
    SubmissionFailed {
        message: String,
        unauthorized: bool,
    },
    Submitted(QuizResult),
}

/// Drives a session until it is submitted or abandoned.
///
/// Commands and countdown ticks are handled one at a time. Expiry goes through
/// the same `submit()` as the `Submit` command.
///
/// * `Ok(Some(result))` once the attempt is accepted.
/// * `Ok(None)` on `Quit` or when the command channel closes; the countdown is released.
/// * `Err(..)` when a submission is rejected as unauthorized; the session is aborted
///   and the caller must re-authenticate. Other submission failures are reported
///   as events and the session keeps running.
pub async fn run_session(
    session: &mut QuizSession,
    commands: &mut mpsc::Receiver<SessionCommand>,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> Result<Option<QuizResult>, SessionError> {
    show_current(session, events);

    loop {
        let command = tokio::select! {
            command = commands.recv() => Some(command.unwrap_or(SessionCommand::Quit)),
            _ = session.next_tick() => on_tick(session, events),
        };

        let Some(command) = command else {
            continue;
        };

        match command {
            SessionCommand::Answer(text) => {
                session.answer_current(text);
            }
            SessionCommand::Choose(n) => {
                let choice = session.current_question().choices().get(n).cloned();
                match choice {
                    Some(choice) => {
                        session.answer_current(choice);
                    }
                    None => tracing::debug!("Ignoring out of range choice {}", n),
                }
            }
            SessionCommand::AnswerQuestion { question_id, text } => {
                session.record_answer(question_id, text);
            }
            SessionCommand::GoTo(index) => {
                if session.go_to_question(index) {
                    show_current(session, events);
                }
            }
            SessionCommand::Next => {
                if session.next() {
                    show_current(session, events);
                }
            }
            SessionCommand::Previous => {
                if session.previous() {
                    show_current(session, events);
                }
            }
            SessionCommand::Submit => {
                if session.status() != SessionStatus::Active {
                    continue;
                }
                let _ = events.send(SessionEvent::Submitting);

                match session.submit().await {
                    Ok(Some(result)) => {
                        let _ = events.send(SessionEvent::Submitted(result.clone()));
                        return Ok(Some(result));
                    }
                    Ok(None) => {}
                    Err(err) => {
                        let unauthorized = err.is_unauthorized();
                        let _ = events.send(SessionEvent::SubmissionFailed {
                            message: err.to_string(),
                            unauthorized,
                        });
                        if unauthorized {
                            session.abort();
                            return Err(err);
                        }
                        // Input sent against the submitting view is not applied.
                        if discard_pending(session, commands) {
                            tracing::info!("Leaving quiz {} without submitting", session.quiz_id());
                            session.close();
                            return Ok(None);
                        }
                    }
                }
            }
            SessionCommand::Quit => {
                tracing::info!("Leaving quiz {} without submitting", session.quiz_id());
                session.close();
                return Ok(None);
            }
        }
    }
}

fn on_tick(
    session: &mut QuizSession,
    events: &mpsc::UnboundedSender<SessionEvent>,
) -> Option<SessionCommand> {
    match session.tick() {
        TickOutcome::Running { remaining_millis } => {
            let _ = events.send(SessionEvent::Tick {
                remaining_millis,
                warning: session.is_time_warning(),
            });
            None
        }
        TickOutcome::Expired => {
            tracing::info!("Time is up for quiz {}", session.quiz_id());
            let _ = events.send(SessionEvent::Tick {
                remaining_millis: 0,
                warning: false,
            });
            let _ = events.send(SessionEvent::Expired);
            Some(SessionCommand::Submit)
        }
        TickOutcome::Idle => None,
    }
}

/// Drops commands queued while a submission was in flight.
/// Returns true if one of them was `Quit`.
fn discard_pending(
    session: &QuizSession,
    commands: &mut mpsc::Receiver<SessionCommand>,
) -> bool {
    let mut quit = false;
    while let Ok(command) = commands.try_recv() {
        if command == SessionCommand::Quit {
            quit = true;
        } else {
            tracing::debug!(
                "Discarding {:?} sent while quiz {} was submitting",
                command,
                session.quiz_id()
            );
        }
    }
    quit
}

fn show_current(session: &QuizSession, events: &mpsc::UnboundedSender<SessionEvent>) {
    let question = session.current_question();
    let _ = events.send(SessionEvent::QuestionShown {
        index: session.current_index(),
        total: session.questions().len(),
        progress: session.progress_percent(),
        question: question.clone(),
        answer: session.answer(question.id).map(str::to_string),
    });
}
