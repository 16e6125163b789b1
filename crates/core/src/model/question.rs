use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entities::decode_entities;

//
// ─── ERRORS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,
    #[error("correct answer cannot be empty")]
    EmptyCorrectAnswer,
}

//
// ─── QUESTION ─────────────────────────────────────────────────────────────────
//

/// A trivia question as received from the question source.
///
/// Text fields are stored exactly as the provider sent them (possibly
/// entity-encoded). Use [`Question::display_text`] or [`present`] to get
/// decoded text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    text: String,
    correct_answer: String,
    incorrect_answers: Vec<String>,
    category: Option<String>,
    difficulty: Option<String>,
}

impl Question {
    /// Create a question from raw provider fields.
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` if the text or the correct answer is blank.
    pub fn new(
        text: impl Into<String>,
        correct_answer: impl Into<String>,
        incorrect_answers: Vec<String>,
    ) -> Result<Self, QuestionError> {
        let text = text.into();
        let correct_answer = correct_answer.into();
        if text.trim().is_empty() {
            return Err(QuestionError::EmptyText);
        }
        if correct_answer.trim().is_empty() {
            return Err(QuestionError::EmptyCorrectAnswer);
        }

        Ok(Self {
            text,
            correct_answer,
            incorrect_answers,
            category: None,
            difficulty: None,
        })
    }

    /// Attach the provider's category name and difficulty token.
    #[must_use]
    pub fn with_source_labels(
        mut self,
        category: Option<String>,
        difficulty: Option<String>,
    ) -> Self {
        self.category = category;
        self.difficulty = difficulty;
        self
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    #[must_use]
    pub fn correct_answer(&self) -> &str {
        &self.correct_answer
    }

    #[must_use]
    pub fn incorrect_answers(&self) -> &[String] {
        &self.incorrect_answers
    }

    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    #[must_use]
    pub fn difficulty(&self) -> Option<&str> {
        self.difficulty.as_deref()
    }

    /// Question text with entities decoded.
    #[must_use]
    pub fn display_text(&self) -> String {
        decode_entities(&self.text)
    }

    /// Number of options a presentation of this question will offer.
    #[must_use]
    pub fn option_count(&self) -> usize {
        1 + self.incorrect_answers.len()
    }
}

//
// ─── PRESENTED QUESTION ───────────────────────────────────────────────────────
//

/// A question together with its option order for one presentation.
///
/// `shuffled_options` holds the decoded correct answer and distractors in a
/// random order that stays fixed while the question is on screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresentedQuestion {
    question: Question,
    display_text: String,
    shuffled_options: Vec<String>,
}

impl PresentedQuestion {
    #[must_use]
    pub fn question(&self) -> &Question {
        &self.question
    }

    #[must_use]
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    #[must_use]
    pub fn shuffled_options(&self) -> &[String] {
        &self.shuffled_options
    }

    /// Option at a 0-based position, if any.
    #[must_use]
    pub fn option(&self, position: usize) -> Option<&str> {
        self.shuffled_options.get(position).map(String::as_str)
    }

    /// True if `option` is one of this question's options after decoding.
    #[must_use]
    pub fn has_option(&self, option: &str) -> bool {
        let decoded = decode_entities(option);
        self.shuffled_options.iter().any(|o| *o == decoded)
    }
}

/// Build a presentation of `question` with a uniformly shuffled option order.
///
/// The shuffle is Fisher–Yates (from the last index down, swapping with a
/// uniform index in `[0, i]`), driven by the supplied random source.
pub fn present<R: Rng + ?Sized>(question: &Question, rng: &mut R) -> PresentedQuestion {
    let mut options = Vec::with_capacity(question.option_count());
    options.extend(question.incorrect_answers.iter().map(|a| decode_entities(a)));
    options.push(decode_entities(&question.correct_answer));
    options.shuffle(rng);

    PresentedQuestion {
        question: question.clone(),
        display_text: question.display_text(),
        shuffled_options: options,
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn sample() -> Question {
        Question::new(
            "Which planet is known as the &quot;Red Planet&quot;?",
            "Mars",
            vec!["Venus".into(), "Jupiter".into(), "Saturn".into()],
        )
        .unwrap()
    }

    fn sorted(mut v: Vec<String>) -> Vec<String> {
        v.sort();
        v
    }

    #[test]
    fn blank_fields_are_rejected() {
        assert_eq!(
            Question::new("  ", "A", vec![]).unwrap_err(),
            QuestionError::EmptyText
        );
        assert_eq!(
            Question::new("Q", "", vec![]).unwrap_err(),
            QuestionError::EmptyCorrectAnswer
        );
    }

    #[test]
    fn presented_options_are_a_permutation() {
        let q = sample();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..50 {
            let p = present(&q, &mut rng);
            assert_eq!(p.shuffled_options().len(), 4);
            assert_eq!(
                sorted(p.shuffled_options().to_vec()),
                sorted(vec![
                    "Mars".into(),
                    "Venus".into(),
                    "Jupiter".into(),
                    "Saturn".into()
                ])
            );
        }
    }

    #[test]
    fn presentation_decodes_text_and_options() {
        let q = Question::new(
            "Who said &#039;Hello&#039;?",
            "Tom &amp; Jerry",
            vec!["Caf&eacute;".into()],
        )
        .unwrap();
        let p = present(&q, &mut StdRng::seed_from_u64(1));
        assert_eq!(p.display_text(), "Who said 'Hello'?");
        assert!(p.has_option("Tom & Jerry"));
        assert!(p.has_option("Tom &amp; Jerry"));
        assert!(p.has_option("Café"));
        assert!(!p.has_option("Cafe"));
    }

    #[test]
    fn shuffle_has_no_positional_bias() {
        let q = sample();
        let options = ["Mars", "Venus", "Jupiter", "Saturn"];
        let mut rng = StdRng::seed_from_u64(7);
        let runs = 8_000;
        let mut counts = [[0_u32; 4]; 4];

        for _ in 0..runs {
            let p = present(&q, &mut rng);
            for (pos, opt) in p.shuffled_options().iter().enumerate() {
                let idx = options.iter().position(|o| o == opt).unwrap();
                counts[idx][pos] += 1;
            }
        }

        // Expected 2000 per cell; allow a generous band.
        for row in counts {
            for cell in row {
                assert!((1_700..=2_300).contains(&cell), "biased cell count {cell}");
            }
        }
    }

    #[test]
    fn question_without_distractors_presents_single_option() {
        let q = Question::new("True?", "Yes", vec![]).unwrap();
        let p = present(&q, &mut StdRng::seed_from_u64(3));
        assert_eq!(p.shuffled_options(), ["Yes".to_string()]);
        assert_eq!(p.option(0), Some("Yes"));
        assert_eq!(p.option(1), None);
    }
}
