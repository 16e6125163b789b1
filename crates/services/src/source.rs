use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use quiz_core::catalog::{CategoryId, Difficulty};
use quiz_core::model::Question;

use crate::config::QuizConfig;
use crate::error::FetchError;

/// Number of questions requested per session.
pub const QUESTIONS_PER_QUIZ: u8 = 5;

/// Provider response code meaning "not enough questions for this filter".
const RESPONSE_NO_RESULTS: u8 = 1;

/// Player-chosen filters for a quiz.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FetchParams {
    pub category: Option<CategoryId>,
    pub difficulty: Option<Difficulty>,
}

impl FetchParams {
    #[must_use]
    pub fn new(category: Option<CategoryId>, difficulty: Option<Difficulty>) -> Self {
        Self {
            category,
            difficulty,
        }
    }
}

/// Request shape sent to a question source.
///
/// Amount and question type are fixed: five multiple-choice questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRequest {
    pub amount: u8,
    pub category: Option<CategoryId>,
    pub difficulty: Option<Difficulty>,
}

impl QuestionRequest {
    pub const KIND: &'static str = "multiple";

    #[must_use]
    pub fn from_params(params: FetchParams) -> Self {
        Self {
            amount: QUESTIONS_PER_QUIZ,
            category: params.category,
            difficulty: params.difficulty,
        }
    }

    /// Query pairs in the provider's format.
    #[must_use]
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![
            ("amount", self.amount.to_string()),
            ("type", Self::KIND.to_owned()),
        ];
        if let Some(category) = self.category {
            pairs.push(("category", category.to_string()));
        }
        if let Some(difficulty) = self.difficulty {
            pairs.push(("difficulty", difficulty.token().to_owned()));
        }
        pairs
    }
}

/// Anything that can hand out a batch of trivia questions.
///
/// An empty `Vec` means the provider had nothing for the given filters.
#[async_trait]
pub trait QuestionSource: Send + Sync {
    /// Fetch questions matching `request`.
    ///
    /// # Errors
    ///
    /// Returns `FetchError` on transport failures or unusable responses.
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, FetchError>;
}

/// Open Trivia DB compatible HTTP source (also works against a pass-through proxy).
#[derive(Clone)]
pub struct OpenTdbSource {
    client: Client,
    endpoint: String,
}

impl OpenTdbSource {
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &QuizConfig) -> Self {
        Self::new(config.api_url.clone())
    }

    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl QuestionSource for OpenTdbSource {
    async fn fetch(&self, request: &QuestionRequest) -> Result<Vec<Question>, FetchError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&request.query_pairs())
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body: OpenTdbResponse = response.json().await?;
        debug!(
            response_code = body.response_code,
            results = body.results.len(),
            "question source responded"
        );
        body.into_questions()
    }
}

#[derive(Debug, Deserialize)]
struct OpenTdbResponse {
    #[serde(default)]
    response_code: u8,
    #[serde(default)]
    results: Vec<OpenTdbQuestion>,
}

#[derive(Debug, Deserialize)]
struct OpenTdbQuestion {
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    difficulty: Option<String>,
    question: String,
    correct_answer: String,
    #[serde(default)]
    incorrect_answers: Vec<String>,
}

impl OpenTdbResponse {
    fn into_questions(self) -> Result<Vec<Question>, FetchError> {
        match self.response_code {
            0 => {}
            RESPONSE_NO_RESULTS => return Ok(Vec::new()),
            code => return Err(FetchError::Provider(code)),
        }

        self.results
            .into_iter()
            .map(|raw| {
                Question::new(raw.question, raw.correct_answer, raw.incorrect_answers)
                    .map(|q| q.with_source_labels(raw.category, raw.difficulty))
                    .map_err(|err| FetchError::Malformed(err.to_string()))
            })
            .collect()
    }
}
