// src/lib.rs

pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod session;
pub mod utils;

// Re-export specific items for convenience
pub use error::{ApiError, SessionError};
pub use services::{HttpQuizApi, QuizProvider, SubmissionSink};
pub use session::{QuizSession, SessionCommand, SessionEvent, SessionSettings, run_session};
