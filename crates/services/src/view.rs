use quiz_core::model::{LeaderboardRecord, ScoreResult, SessionMeta, Tier};

/// One answered question as shown on the result screen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    pub number: usize,
    pub question: String,
    pub your_answer: String,
    pub is_correct: bool,
    /// Only set when the player got it wrong.
    pub correct_answer: Option<String>,
}

/// Presentation-agnostic result screen for a scored quiz.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultView {
    pub player_name: String,
    pub topic: String,
    pub level: String,
    pub correct: u32,
    pub total: u32,
    pub tier: Tier,
    pub items: Vec<ResultItem>,
}

impl ResultView {
    #[must_use]
    pub fn from_result(meta: &SessionMeta, result: &ScoreResult) -> Self {
        let items = result
            .per_question()
            .iter()
            .enumerate()
            .map(|(i, outcome)| ResultItem {
                number: i + 1,
                question: outcome.question_text.clone(),
                your_answer: outcome.user_answer.clone(),
                is_correct: outcome.is_correct,
                correct_answer: (!outcome.is_correct).then(|| outcome.correct_answer.clone()),
            })
            .collect();

        Self {
            player_name: meta.player_name().to_owned(),
            topic: meta.category_label().to_owned(),
            level: meta.difficulty_label().to_owned(),
            correct: result.correct_count(),
            total: result.total(),
            tier: result.tier(),
            items,
        }
    }

    /// Plain-text rendering, one line per entry.
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Result for {}", self.player_name),
            format!("Topic: {}", self.topic),
            format!("Level: {}", self.level),
            format!("Correct: {}/{}", self.correct, self.total),
            format!("Badge: {}", self.tier),
        ];
        for item in &self.items {
            lines.push(String::new());
            lines.push(format!("Q{}: {}", item.number, item.question));
            let mark = if item.is_correct { "correct" } else { "wrong" };
            lines.push(format!("Your answer: {} ({mark})", item.your_answer));
            if let Some(correct) = &item.correct_answer {
                lines.push(format!("Correct answer: {correct}"));
            }
        }
        lines
    }
}

/// `"{name} — {category} ({difficulty}): {score}/{total}"`
#[must_use]
pub fn leaderboard_line(record: &LeaderboardRecord) -> String {
    format!(
        "{} — {} ({}): {}/{}",
        record.player_name,
        record.category_label,
        record.difficulty_label,
        record.correct_count,
        record.total
    )
}
