// src/main.rs

use std::{process, sync::Arc};

use quiz_session::{
    config::Config,
    error::SessionError,
    services::HttpQuizApi,
    session::{QuizSession, SessionCommand, SessionEvent, run_session},
    utils::format::format_time,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const HELP: &str = "Commands: n (next), p (previous), g N (go to question N), \
c N (choose option N), a TEXT (answer), s (submit), q (quit), h (help)";

#[tokio::main]
async fn main() {
    // Load configuration from environment (.env included)
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "quiz-session.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    // stdout belongs to the quiz itself
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    let quiz_id = match std::env::args().nth(1).and_then(|arg| arg.parse::<i64>().ok()) {
        Some(id) => id,
        None => {
            eprintln!("usage: quiz-session <quiz_id>");
            process::exit(2);
        }
    };

    let api = match HttpQuizApi::new(&config) {
        Ok(api) => Arc::new(api),
        Err(e) => {
            tracing::error!("Failed to build API client: {}", e);
            process::exit(1);
        }
    };

    if let Err(e) = api.health_check().await {
        tracing::warn!("Backend at {} is not healthy: {}", config.api_url, e.message());
    }

    let mut session =
        match QuizSession::load(api.as_ref(), api.clone(), quiz_id, config.session_settings())
            .await
        {
            Ok(session) => session,
            Err(e) if e.is_unauthorized() => {
                eprintln!("Your session has expired. Please log in again.");
                process::exit(1);
            }
            Err(SessionError::InvalidQuizState(_)) => {
                eprintln!("Quiz not found: it doesn't exist or has no questions.");
                process::exit(1);
            }
            Err(SessionError::LoadFailure(e)) => {
                eprintln!("Failed to load quiz: {}", e.message());
                process::exit(1);
            }
            Err(e) => {
                eprintln!("{}", e);
                process::exit(1);
            }
        };

    let quiz = session.quiz().clone();
    println!("{}", quiz.title);
    if !quiz.subject.is_empty() {
        println!("{} • {}", quiz.subject, quiz.grade_level);
    }
    println!(
        "{} questions, {} to complete. {}",
        session.questions().len(),
        format_time(session.remaining_millis()),
        HELP
    );

    let (command_tx, mut commands) = mpsc::channel(16);
    let (events_tx, mut events) = mpsc::unbounded_channel();

    tokio::spawn(read_commands(command_tx));
    let printer = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            render(&event);
        }
    });

    let outcome = run_session(&mut session, &mut commands, &events_tx).await;
    drop(events_tx);
    let _ = printer.await;

    println!(
        "Started {}, time taken {}",
        session.started_at().format("%Y-%m-%d %H:%M UTC"),
        format_time(session.elapsed().as_millis() as u64)
    );

    match outcome {
        Ok(Some(result)) => {
            println!(
                "Score: {}/{} ({:.1}%)",
                result.score, result.total_points, result.percentage
            );
            if result.passed(quiz.passing_score) {
                println!("Passed (needed {:.0}%).", quiz.passing_score);
            } else {
                println!("Not passed (needed {:.0}%).", quiz.passing_score);
            }
        }
        Ok(None) => println!("Quiz left without submitting."),
        Err(e) => {
            eprintln!("{}. Please log in again.", e);
            drop(guard);
            process::exit(1);
        }
    }

    // The stdin reader may still be blocked on a read, which would hold up runtime shutdown.
    drop(guard);
    process::exit(0);
}

/// Forwards stdin lines as commands until EOF or the session stops listening.
async fn read_commands(tx: mpsc::Sender<SessionCommand>) {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Ok(Some(line)) = lines.next_line().await {
        match parse_command(&line) {
            Ok(Some(command)) => {
                if tx.send(command).await.is_err() {
                    break;
                }
            }
            Ok(None) => println!("{}", HELP),
            Err(msg) => println!("{}", msg),
        }
    }
}

/// `Ok(None)` asks for the help text.
fn parse_command(line: &str) -> Result<Option<SessionCommand>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match word {
        "n" | "next" => SessionCommand::Next,
        "p" | "prev" | "previous" => SessionCommand::Previous,
        "s" | "submit" => SessionCommand::Submit,
        "q" | "quit" => SessionCommand::Quit,
        "h" | "help" | "?" | "" => return Ok(None),
        "g" | "goto" => SessionCommand::GoTo(parse_position(rest)?),
        "c" | "choose" => SessionCommand::Choose(parse_position(rest)?),
        "a" | "answer" => SessionCommand::Answer(rest.to_string()),
        other => return Err(format!("Unknown command '{}'", other)),
    };

    Ok(Some(command))
}

/// 1-based position typed by the user to 0-based index.
fn parse_position(arg: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Expected a number from 1, got '{}'", arg)),
    }
}

fn render(event: &SessionEvent) {
    match event {
        SessionEvent::QuestionShown {
            index,
            total,
            progress,
            question,
            answer,
        } => {
            println!();
            println!(
                "Question {} of {} ({:.0}% complete) [{}, {} point{}]",
                index + 1,
                total,
                progress,
                question.question_type.label(),
                question.points,
                if question.points == 1 { "" } else { "s" }
            );
            println!("{}", question.question_text);
            for (i, choice) in question.choices().iter().enumerate() {
                let marker = if answer.as_deref() == Some(choice.as_str()) { "*" } else { " " };
                println!(" {}{}) {}", marker, i + 1, choice);
            }
            if question.is_free_text() {
                if let Some(answer) = answer {
                    println!("Your answer: {}", answer);
                }
            }
        }
        SessionEvent::Tick {
            remaining_millis,
            warning,
        } => {
            let remaining = *remaining_millis;
            let announce = remaining % 60_000 == 0
                || (*warning && remaining % 30_000 == 0)
                || remaining <= 10_000;
            if announce {
                if *warning {
                    println!(
                        "Warning: you have {} remaining to complete the quiz.",
                        format_time(remaining)
                    );
                } else if remaining > 0 {
                    println!("{} remaining", format_time(remaining));
                }
            }
        }
        SessionEvent::Expired => println!("Time is up, submitting your answers..."),
        SessionEvent::Submitting => println!("Submitting..."),
        SessionEvent::SubmissionFailed { message, unauthorized } => {
            if *unauthorized {
                println!("Your session has expired: {}", message);
            } else {
                println!("Failed to submit quiz. Please try again. ({})", message);
            }
        }
        SessionEvent::Submitted(_) => println!("Quiz submitted successfully!"),
    }
}
