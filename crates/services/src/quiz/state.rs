use quiz_core::model::{LeaderboardRecord, PresentedQuestion, ScoreResult, SessionMeta, Selection};

use crate::error::QuizError;
use crate::source::QuestionRequest;

/// Externally visible lifecycle phase of a quiz session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuizPhase {
    Idle,
    Requesting,
    Answering,
    Scored,
}

/// Handle for one question fetch attempt.
///
/// The generation ties a response to the attempt that asked for it, so a
/// response arriving after a timeout or a newer start is ignored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    generation: u64,
    request: QuestionRequest,
}

impl FetchTicket {
    pub(crate) fn new(generation: u64, request: QuestionRequest) -> Self {
        Self {
            generation,
            request,
        }
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn request(&self) -> &QuestionRequest {
        &self.request
    }
}

/// What happened to a fetch result handed back to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchDisposition {
    /// Questions were accepted; the session is answering.
    Ready { questions: usize },
    /// The ticket belongs to a superseded attempt; nothing changed.
    Stale,
}

/// Session-owned data for each phase. Everything here is dropped on reset.
#[derive(Debug)]
pub(crate) enum SessionState {
    Idle,
    Requesting {
        meta: SessionMeta,
    },
    Answering {
        meta: SessionMeta,
        questions: Vec<PresentedQuestion>,
        selection: Selection,
    },
    Scored {
        meta: SessionMeta,
        result: ScoreResult,
        top: Vec<LeaderboardRecord>,
        save_error: Option<QuizError>,
    },
}

impl SessionState {
    pub(crate) fn phase(&self) -> QuizPhase {
        match self {
            SessionState::Idle => QuizPhase::Idle,
            SessionState::Requesting { .. } => QuizPhase::Requesting,
            SessionState::Answering { .. } => QuizPhase::Answering,
            SessionState::Scored { .. } => QuizPhase::Scored,
        }
    }

    pub(crate) fn meta(&self) -> Option<&SessionMeta> {
        match self {
            SessionState::Idle => None,
            SessionState::Requesting { meta }
            | SessionState::Answering { meta, .. }
            | SessionState::Scored { meta, .. } => Some(meta),
        }
    }
}
