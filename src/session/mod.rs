// src/session/mod.rs

pub mod controller;
pub mod countdown;
pub mod runner;

pub use controller::{QuizSession, SessionSettings, SessionStatus, TickOutcome};
pub use countdown::Countdown;
pub use runner::{SessionCommand, SessionEvent, run_session};
