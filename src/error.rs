//! Crate error type.

use thiserror::Error;

use crate::cp::SolverStatus;
use crate::validation::ValidationError;

/// Errors raised while loading, validating or solving a scheduling problem.
#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Invalid input: {}", summarize(.0))]
    Validation(Vec<ValidationError>),

    #[error("No feasible solution (solver status: {status:?})")]
    NoFeasibleSolution { status: SolverStatus },

    #[error("Solver error: {0}")]
    Solver(String),
}

impl ScheduleError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<toml::de::Error> for ScheduleError {
    fn from(err: toml::de::Error) -> Self {
        Self::config(format!("TOML parsing error: {err}"))
    }
}

impl From<Vec<ValidationError>> for ScheduleError {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::Validation(errors)
    }
}

fn summarize(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

pub type Result<T> = std::result::Result<T, ScheduleError>;
