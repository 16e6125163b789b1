//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::SessionMetaError;
use storage::repository::StorageError;
use storage::sqlite::SqliteInitError;

use crate::quiz::QuizPhase;

/// Errors emitted by a `QuestionSource`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("question request failed with status {0}")]
    Status(reqwest::StatusCode),
    #[error("question provider returned response code {0}")]
    Provider(u8),
    #[error("malformed question payload: {0}")]
    Malformed(String),
    #[error("question request timed out")]
    Timeout,
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Input the player has to fix before the action can go through.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("player name cannot be empty")]
    EmptyPlayerName,
    #[error("unanswered questions: {missing:?}")]
    IncompleteAnswers { missing: Vec<usize> },
    #[error("question index {index} is out of range (total {total})")]
    QuestionIndexOutOfRange { index: usize, total: usize },
    #[error("option {option:?} is not offered for question {index}")]
    UnknownOption { index: usize, option: String },
}

impl From<SessionMetaError> for ValidationError {
    fn from(err: SessionMetaError) -> Self {
        match err {
            SessionMetaError::EmptyPlayerName => ValidationError::EmptyPlayerName,
        }
    }
}

/// Errors emitted by `QuizSession`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuizError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("start throttled, retry in {remaining_secs}s")]
    Throttled { remaining_secs: u64 },
    #[error("no questions for this selection")]
    EmptyResult,
    #[error("question fetch timed out")]
    Timeout,
    #[error("question fetch failed: {0}")]
    Transport(FetchError),
    #[error("cannot {operation} while {phase:?}")]
    InvalidState {
        operation: &'static str,
        phase: QuizPhase,
    },
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl From<FetchError> for QuizError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout => QuizError::Timeout,
            other => QuizError::Transport(other),
        }
    }
}

impl QuizError {
    /// Message suitable for showing to the player.
    #[must_use]
    pub fn user_message(&self) -> &'static str {
        match self {
            QuizError::Validation(ValidationError::EmptyPlayerName) => {
                "Please enter your name to begin!"
            }
            QuizError::Validation(ValidationError::IncompleteAnswers { .. }) => {
                "Please answer all questions."
            }
            QuizError::Validation(_) => "That answer is not one of the options.",
            QuizError::Throttled { .. } => {
                "Please wait a few seconds before starting another quiz."
            }
            QuizError::EmptyResult => "No questions found for this selection.",
            QuizError::Timeout | QuizError::Transport(_) => {
                "Failed to load quiz questions. Please check your connection or try again later."
            }
            QuizError::InvalidState { .. } => "That action is not available right now.",
            QuizError::Storage(_) => "Your score could not be saved to the leaderboard.",
        }
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid question source URL: {0}")]
    InvalidApiUrl(String),
    #[error("invalid value for {var}: {raw}")]
    InvalidNumber { var: &'static str, raw: String },
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}
