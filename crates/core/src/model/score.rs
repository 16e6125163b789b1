use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

use super::entities::decode_entities;
use super::question::Question;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

/// Reasons a set of answers cannot be scored.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScoreError {
    #[error("no questions to score")]
    NoQuestions,
    #[error("question {index} has no selected answer")]
    MissingSelection { index: usize },
}

//
// ─── SELECTION ────────────────────────────────────────────────────────────────
//

/// Chosen option per 0-based question index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    answers: BTreeMap<usize, String>,
}

impl Selection {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record (or replace) the answer for `index`.
    pub fn select(&mut self, index: usize, option: impl Into<String>) {
        self.answers.insert(index, option.into());
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&str> {
        self.answers.get(&index).map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    /// Indices in `[0, total)` without an answer, ascending.
    #[must_use]
    pub fn missing(&self, total: usize) -> Vec<usize> {
        (0..total)
            .filter(|i| !self.answers.contains_key(i))
            .collect()
    }
}

//
// ─── TIER ─────────────────────────────────────────────────────────────────────
//

/// Achievement tier derived from the fraction of correct answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tier {
    Beginner,
    Bronze,
    Silver,
    Gold,
}

impl Tier {
    /// Classify `correct` out of `total`.
    ///
    /// Rules are checked top-down: all correct is Gold, then at least 70% is
    /// Silver, at least 40% is Bronze, anything else is Beginner. Thresholds
    /// are compared in integer arithmetic so 7/10 is exactly Silver.
    #[must_use]
    pub fn classify(correct: u32, total: u32) -> Self {
        let correct = u64::from(correct);
        let total = u64::from(total);
        if total == 0 {
            Tier::Beginner
        } else if correct == total {
            Tier::Gold
        } else if correct * 10 >= total * 7 {
            Tier::Silver
        } else if correct * 10 >= total * 4 {
            Tier::Bronze
        } else {
            Tier::Beginner
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::Beginner => "Beginner",
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

//
// ─── SCORE RESULT ─────────────────────────────────────────────────────────────
//

/// Per-question outcome, with all text decoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionOutcome {
    pub question_text: String,
    pub user_answer: String,
    pub correct_answer: String,
    pub is_correct: bool,
}

/// Result of scoring one completed session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreResult {
    correct_count: u32,
    total: u32,
    tier: Tier,
    per_question: Vec<QuestionOutcome>,
}

impl ScoreResult {
    #[must_use]
    pub fn correct_count(&self) -> u32 {
        self.correct_count
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn tier(&self) -> Tier {
        self.tier
    }

    #[must_use]
    pub fn per_question(&self) -> &[QuestionOutcome] {
        &self.per_question
    }
}

/// Score `selections` against `questions`.
///
/// Completeness is validated before anything is scored: a missing selection is
/// an error, never a wrong answer. Comparison is exact and case-sensitive after
/// decoding entities on both sides.
///
/// # Errors
///
/// Returns `ScoreError::NoQuestions` for an empty question set and
/// `ScoreError::MissingSelection` for the first unanswered index.
pub fn score(questions: &[Question], selections: &Selection) -> Result<ScoreResult, ScoreError> {
    if questions.is_empty() {
        return Err(ScoreError::NoQuestions);
    }
    if let Some(&index) = selections.missing(questions.len()).first() {
        return Err(ScoreError::MissingSelection { index });
    }

    let mut correct_count = 0_u32;
    let mut per_question = Vec::with_capacity(questions.len());

    for (index, question) in questions.iter().enumerate() {
        let raw = selections
            .get(index)
            .ok_or(ScoreError::MissingSelection { index })?;
        let user_answer = decode_entities(raw);
        let correct_answer = decode_entities(question.correct_answer());
        let is_correct = user_answer == correct_answer;
        if is_correct {
            correct_count = correct_count.saturating_add(1);
        }

        per_question.push(QuestionOutcome {
            question_text: question.display_text(),
            user_answer,
            correct_answer,
            is_correct,
        });
    }

    let total = u32::try_from(questions.len()).unwrap_or(u32::MAX);

    Ok(ScoreResult {
        correct_count,
        total,
        tier: Tier::classify(correct_count, total),
        per_question,
    })
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
