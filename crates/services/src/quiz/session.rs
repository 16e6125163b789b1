use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use tokio::time::Instant;
use tracing::{debug, info, warn};

use quiz_core::catalog::{category_label, difficulty_label};
use quiz_core::model::{
    LeaderboardRecord, PresentedQuestion, Question, ScoreError, ScoreResult, Selection,
    SessionMeta, decode_entities, present, score,
};

use super::progress::QuizProgress;
use super::state::{FetchDisposition, FetchTicket, QuizPhase, SessionState};
use crate::Clock;
use crate::config::QuizConfig;
use crate::error::{FetchError, QuizError, ValidationError};
use crate::leaderboard::{LeaderboardStore, PODIUM_SIZE};
use crate::profile::PlayerProfileService;
use crate::source::{FetchParams, QuestionRequest, QuestionSource};
use crate::throttle::RequestThrottle;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Single-player quiz lifecycle: `Idle → Requesting → Answering → Scored`.
///
/// Failures while requesting fall back to `Idle`; `retake` goes from `Scored`
/// back to `Idle`. All collaborators (question source, stores, clock, random
/// source) are injected so tests can drive the machine deterministically.
pub struct QuizSession {
    source: Arc<dyn QuestionSource>,
    leaderboard: LeaderboardStore,
    profiles: PlayerProfileService,
    throttle: RequestThrottle,
    clock: Clock,
    rng: Box<dyn RngCore + Send>,
    fetch_timeout: Duration,
    generation: u64,
    state: SessionState,
}

impl QuizSession {
    #[must_use]
    pub fn new(
        source: Arc<dyn QuestionSource>,
        leaderboard: LeaderboardStore,
        profiles: PlayerProfileService,
    ) -> Self {
        let config = QuizConfig::default();
        Self {
            source,
            leaderboard,
            profiles,
            throttle: RequestThrottle::new(config.throttle_interval),
            clock: Clock::system(),
            rng: Box::new(StdRng::from_os_rng()),
            fetch_timeout: config.fetch_timeout,
            generation: 0,
            state: SessionState::Idle,
        }
    }

    /// Apply timeout and throttle settings from `config`.
    #[must_use]
    pub fn with_config(mut self, config: &QuizConfig) -> Self {
        self.fetch_timeout = config.fetch_timeout;
        self.throttle = RequestThrottle::new(config.throttle_interval);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_rng(mut self, rng: impl RngCore + Send + 'static) -> Self {
        self.rng = Box::new(rng);
        self
    }

    #[must_use]
    pub fn with_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    /// Mutable access to the clock, for advancing a fixed clock.
    pub fn clock_mut(&mut self) -> &mut Clock {
        &mut self.clock
    }

    #[must_use]
    pub fn phase(&self) -> QuizPhase {
        self.state.phase()
    }

    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub fn meta(&self) -> Option<&SessionMeta> {
        self.state.meta()
    }

    #[must_use]
    pub fn leaderboard(&self) -> &LeaderboardStore {
        &self.leaderboard
    }

    #[must_use]
    pub fn profiles(&self) -> &PlayerProfileService {
        &self.profiles
    }

    /// Presented questions while answering; empty otherwise.
    #[must_use]
    pub fn questions(&self) -> &[PresentedQuestion] {
        match &self.state {
            SessionState::Answering { questions, .. } => questions,
            _ => &[],
        }
    }

    /// Current answer for `index` while answering.
    #[must_use]
    pub fn selection(&self, index: usize) -> Option<&str> {
        match &self.state {
            SessionState::Answering { selection, .. } => selection.get(index),
            _ => None,
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        match &self.state {
            SessionState::Answering {
                questions,
                selection,
                ..
            } => {
                let total = questions.len();
                let answered = total - selection.missing(total).len();
                QuizProgress {
                    total,
                    answered,
                    remaining: total - answered,
                    is_complete: answered == total,
                }
            }
            _ => QuizProgress {
                total: 0,
                answered: 0,
                remaining: 0,
                is_complete: false,
            },
        }
    }

    /// Result of the last submitted quiz.
    #[must_use]
    pub fn result(&self) -> Option<&ScoreResult> {
        match &self.state {
            SessionState::Scored { result, .. } => Some(result),
            _ => None,
        }
    }

    /// Why the last scored quiz is missing from the leaderboard, if it is.
    #[must_use]
    pub fn save_error(&self) -> Option<&QuizError> {
        match &self.state {
            SessionState::Scored { save_error, .. } => save_error.as_ref(),
            _ => None,
        }
    }

    /// Top leaderboard entries captured when the quiz was scored.
    #[must_use]
    pub fn leaderboard_top(&self) -> &[LeaderboardRecord] {
        match &self.state {
            SessionState::Scored { top, .. } => top,
            _ => &[],
        }
    }

    //
    // ─── STARTING ──────────────────────────────────────────────────────────────
    //

    /// Start a quiz: validate, throttle, fetch with a timeout, then present.
    ///
    /// Returns the number of questions ready to answer.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless idle or scored,
    /// `QuizError::Validation` for a blank name, `QuizError::Throttled` inside
    /// the cool-down, and `QuizError::EmptyResult`, `QuizError::Timeout` or
    /// `QuizError::Transport` when the fetch fails. Every fetch failure leaves
    /// the session idle.
    pub async fn start(
        &mut self,
        player_name: &str,
        params: FetchParams,
    ) -> Result<usize, QuizError> {
        let ticket = self.begin_start(player_name, params).await?;
        let source = Arc::clone(&self.source);
        let fetch_timeout = self.fetch_timeout;
        let mut pending = PendingFetch {
            session: self,
            generation: ticket.generation(),
        };

        let started = Instant::now();
        let outcome = match tokio::time::timeout(fetch_timeout, source.fetch(ticket.request())).await
        {
            Ok(result) => result,
            Err(_elapsed) => Err(FetchError::Timeout),
        };
        debug!(
            elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            generation = ticket.generation(),
            "question fetch finished"
        );

        match pending.session.complete_fetch(&ticket, outcome)? {
            FetchDisposition::Ready { questions } => Ok(questions),
            FetchDisposition::Stale => Err(QuizError::InvalidState {
                operation: "start",
                phase: pending.session.phase(),
            }),
        }
    }

    /// First half of [`QuizSession::start`]: validate and move to `Requesting`.
    ///
    /// The returned ticket must be handed back to [`QuizSession::complete_fetch`]
    /// together with the fetch outcome.
    ///
    /// # Errors
    ///
    /// Same validation, throttle and state errors as `start`. The session is
    /// unchanged on error.
    pub async fn begin_start(
        &mut self,
        player_name: &str,
        params: FetchParams,
    ) -> Result<FetchTicket, QuizError> {
        if !matches!(self.phase(), QuizPhase::Idle | QuizPhase::Scored) {
            return Err(QuizError::InvalidState {
                operation: "start",
                phase: self.phase(),
            });
        }

        let meta = SessionMeta::new(
            player_name,
            category_label(params.category),
            difficulty_label(params.difficulty),
        )
        .map_err(ValidationError::from)?;

        self.throttle
            .try_acquire(&self.clock)
            .map_err(|remaining_secs| QuizError::Throttled { remaining_secs })?;

        if let Err(err) = self.profiles.remember_player_name(meta.player_name()).await {
            warn!(error = %err, "could not remember player name");
        }

        self.generation += 1;
        info!(
            generation = self.generation,
            category = meta.category_label(),
            difficulty = meta.difficulty_label(),
            "quiz requested"
        );
        self.state = SessionState::Requesting { meta };

        Ok(FetchTicket::new(
            self.generation,
            QuestionRequest::from_params(params),
        ))
    }

    /// Second half of [`QuizSession::start`]: apply a fetch outcome.
    ///
    /// Outcomes for a ticket that is no longer current are discarded and
    /// reported as `FetchDisposition::Stale`.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::EmptyResult`, `QuizError::Timeout` or
    /// `QuizError::Transport` after moving the session back to `Idle`.
    pub fn complete_fetch(
        &mut self,
        ticket: &FetchTicket,
        outcome: Result<Vec<Question>, FetchError>,
    ) -> Result<FetchDisposition, QuizError> {
        if ticket.generation() != self.generation || self.phase() != QuizPhase::Requesting {
            debug!(
                ticket = ticket.generation(),
                current = self.generation,
                "discarding stale fetch result"
            );
            return Ok(FetchDisposition::Stale);
        }

        let questions = match outcome {
            Ok(questions) if questions.is_empty() => {
                self.reset_to_idle();
                return Err(QuizError::EmptyResult);
            }
            Ok(questions) => questions,
            Err(err) => {
                warn!(error = %err, "question fetch failed");
                self.reset_to_idle();
                return Err(err.into());
            }
        };

        let SessionState::Requesting { meta } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            return Ok(FetchDisposition::Stale);
        };

        let presented: Vec<PresentedQuestion> = questions
            .iter()
            .map(|q| present(q, &mut *self.rng))
            .collect();
        let count = presented.len();

        self.state = SessionState::Answering {
            meta,
            questions: presented,
            selection: Selection::new(),
        };
        debug!(questions = count, "quiz ready");

        Ok(FetchDisposition::Ready { questions: count })
    }

    /// Abandon an in-flight request and return to `Idle`.
    ///
    /// Any outstanding [`FetchTicket`] becomes stale. The throttle window
    /// opened by the abandoned start still applies.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless requesting.
    pub fn cancel(&mut self) -> Result<(), QuizError> {
        if self.phase() != QuizPhase::Requesting {
            return Err(QuizError::InvalidState {
                operation: "cancel",
                phase: self.phase(),
            });
        }
        self.abandon_request();
        Ok(())
    }

    fn abandon_request(&mut self) {
        self.generation += 1;
        info!(generation = self.generation, "quiz request abandoned");
        self.reset_to_idle();
    }

    //
    // ─── ANSWERING ─────────────────────────────────────────────────────────────
    //

    /// Record `option` as the answer for question `index`, replacing any earlier pick.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless answering, and
    /// `QuizError::Validation` for an out-of-range index or an option the
    /// question does not offer.
    pub fn select_answer(&mut self, index: usize, option: &str) -> Result<(), QuizError> {
        let phase = self.phase();
        let SessionState::Answering {
            questions,
            selection,
            ..
        } = &mut self.state
        else {
            return Err(QuizError::InvalidState {
                operation: "select an answer",
                phase,
            });
        };

        let total = questions.len();
        let question = questions
            .get(index)
            .ok_or(ValidationError::QuestionIndexOutOfRange { index, total })?;

        if !question.has_option(option) {
            return Err(ValidationError::UnknownOption {
                index,
                option: option.to_owned(),
            }
            .into());
        }

        selection.select(index, decode_entities(option));
        Ok(())
    }

    /// Select by 0-based option position, as shown to the player.
    ///
    /// # Errors
    ///
    /// Same as [`QuizSession::select_answer`].
    pub fn select_option(&mut self, index: usize, position: usize) -> Result<(), QuizError> {
        if self.phase() != QuizPhase::Answering {
            return Err(QuizError::InvalidState {
                operation: "select an answer",
                phase: self.phase(),
            });
        }

        let total = self.questions().len();
        let question = self
            .questions()
            .get(index)
            .ok_or(ValidationError::QuestionIndexOutOfRange { index, total })?;
        let option = question
            .option(position)
            .map(str::to_owned)
            .ok_or_else(|| ValidationError::UnknownOption {
                index,
                option: format!("#{}", position + 1),
            })?;

        self.select_answer(index, &option)
    }

    /// Score the quiz, persist a leaderboard record and capture the top entries.
    ///
    /// A write failure on the leaderboard does not discard the score; it is
    /// reported through [`QuizSession::save_error`].
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless answering, and
    /// `QuizError::Validation` listing unanswered questions. On a validation
    /// error the session stays in `Answering` with all selections intact.
    pub async fn submit(&mut self) -> Result<&ScoreResult, QuizError> {
        let phase = self.phase();
        let SessionState::Answering {
            questions,
            selection,
            ..
        } = &self.state
        else {
            return Err(QuizError::InvalidState {
                operation: "submit",
                phase,
            });
        };

        let missing = selection.missing(questions.len());
        if !missing.is_empty() {
            return Err(ValidationError::IncompleteAnswers { missing }.into());
        }

        let raw: Vec<Question> = questions.iter().map(|p| p.question().clone()).collect();
        let result = score(&raw, selection).map_err(|err| {
            let missing = match err {
                ScoreError::MissingSelection { index } => vec![index],
                _ => Vec::new(),
            };
            QuizError::from(ValidationError::IncompleteAnswers { missing })
        })?;

        let SessionState::Answering { meta, .. } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            return Err(QuizError::InvalidState {
                operation: "submit",
                phase,
            });
        };

        let record = LeaderboardRecord::from_result(&meta, &result);
        let save_error = match self.leaderboard.append(record).await {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "could not save leaderboard record");
                Some(QuizError::Storage(err))
            }
        };
        let top = self.leaderboard.top_n(PODIUM_SIZE).await;

        info!(
            correct = result.correct_count(),
            total = result.total(),
            tier = %result.tier(),
            "quiz scored"
        );
        self.state = SessionState::Scored {
            meta,
            result,
            top,
            save_error,
        };

        match &self.state {
            SessionState::Scored { result, .. } => Ok(result),
            _ => Err(QuizError::InvalidState {
                operation: "submit",
                phase: self.phase(),
            }),
        }
    }

    /// Drop the finished quiz and return to `Idle`. The leaderboard is kept.
    ///
    /// The next `start` fetches a fresh set of questions.
    ///
    /// # Errors
    ///
    /// Returns `QuizError::InvalidState` unless scored.
    pub fn retake(&mut self) -> Result<(), QuizError> {
        if self.phase() != QuizPhase::Scored {
            return Err(QuizError::InvalidState {
                operation: "retake",
                phase: self.phase(),
            });
        }
        self.reset_to_idle();
        Ok(())
    }

    fn reset_to_idle(&mut self) {
        debug!(from = ?self.phase(), "session reset to idle");
        self.state = SessionState::Idle;
    }
}

/// Returns the session to `Idle` if `start` is dropped while its fetch is
/// still pending.
struct PendingFetch<'a> {
    session: &'a mut QuizSession,
    generation: u64,
}

impl Drop for PendingFetch<'_> {
    fn drop(&mut self) {
        if self.session.generation == self.generation
            && self.session.phase() == QuizPhase::Requesting
        {
            self.session.abandon_request();
        }
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("phase", &self.phase())
            .field("generation", &self.generation)
            .field("questions_len", &self.questions().len())
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    struct NeverCalled;

    #[async_trait::async_trait]
    impl QuestionSource for NeverCalled {
        async fn fetch(&self, _request: &QuestionRequest) -> Result<Vec<Question>, FetchError> {
            Err(FetchError::Malformed("unexpected fetch".into()))
        }
    }

    fn idle_session() -> QuizSession {
        let repo = Arc::new(InMemoryRepository::new());
        QuizSession::new(
            Arc::new(NeverCalled),
            LeaderboardStore::new(repo.clone()),
            PlayerProfileService::new(repo),
        )
        .with_clock(quiz_core::time::fixed_clock())
    }

    #[test]
    fn idle_session_has_nothing_to_answer() {
        let mut session = idle_session();
        assert_eq!(session.phase(), QuizPhase::Idle);
        assert_eq!(session.generation(), 0);
        assert!(session.questions().is_empty());
        assert!(!session.progress().is_complete);
        assert!(matches!(
            session.select_answer(0, "x"),
            Err(QuizError::InvalidState {
                phase: QuizPhase::Idle,
                ..
            })
        ));
        assert!(session.retake().is_err());
        assert!(format!("{session:?}").contains("Idle"));
    }

    #[tokio::test]
    async fn submit_outside_answering_is_invalid() {
        let mut session = idle_session();
        assert!(matches!(
            session.submit().await,
            Err(QuizError::InvalidState {
                operation: "submit",
                ..
            })
        ));
    }

    #[tokio::test]
    async fn begin_start_bumps_generation_and_requests() {
        let mut session = idle_session();
        let ticket = session
            .begin_start("Ada", FetchParams::default())
            .await
            .unwrap();
        assert_eq!(ticket.generation(), 1);
        assert_eq!(ticket.request().amount, 5);
        assert_eq!(session.phase(), QuizPhase::Requesting);
        assert_eq!(session.meta().unwrap().category_label(), "Unknown");

        let err = session
            .begin_start("Ada", FetchParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, QuizError::InvalidState { .. }));
    }
}
