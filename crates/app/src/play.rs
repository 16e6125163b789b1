use std::fmt;
use std::io::{self, BufRead, Write};

use quiz_core::catalog::{CategoryId, Difficulty, KNOWN_CATEGORIES};
use services::{
    AppServices, FetchParams, LeaderboardStore, QuizError, QuizSession, ResultView,
    ValidationError, leaderboard_line,
};

/// Line-oriented prompt over any reader/writer pair.
pub struct Terminal<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Terminal<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn say(&mut self, line: impl fmt::Display) -> io::Result<()> {
        writeln!(self.output, "{line}")
    }

    /// Prompt and read one trimmed line. `None` at end of input.
    pub fn ask(&mut self, prompt: &str) -> io::Result<Option<String>> {
        write!(self.output, "{prompt}")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_owned()))
    }

    pub fn confirm(&mut self, prompt: &str) -> io::Result<bool> {
        Ok(matches!(
            self.ask(prompt)?.as_deref(),
            Some("y" | "Y" | "yes" | "Yes")
        ))
    }

    #[cfg(test)]
    fn into_output(self) -> W {
        self.output
    }
}

/// Interactive quiz loop: welcome, answer, result, optional retake.
pub async fn play<R: BufRead, W: Write>(
    services: &AppServices,
    term: &mut Terminal<R, W>,
) -> io::Result<()> {
    let mut session = services.new_session();
    term.say("Welcome to the trivia quiz!")?;

    loop {
        let Some(name) = ask_name(services, term).await? else {
            return Ok(());
        };
        let Some(category) = ask_category(term)? else {
            return Ok(());
        };
        let Some(difficulty) = ask_difficulty(term)? else {
            return Ok(());
        };

        term.say("Loading questions...")?;
        if let Err(err) = session
            .start(&name, FetchParams::new(category, difficulty))
            .await
        {
            term.say(err.user_message())?;
            continue;
        }

        if !answer_questions(&mut session, term).await? {
            return Ok(());
        }
        show_result(&session, term)?;

        if !term.confirm("Retake quiz? [y/N] ")? {
            return Ok(());
        }
        if let Err(err) = session.retake() {
            term.say(err.user_message())?;
        }
    }
}

async fn ask_name<R: BufRead, W: Write>(
    services: &AppServices,
    term: &mut Terminal<R, W>,
) -> io::Result<Option<String>> {
    let remembered = services.profiles().last_player_name().await;
    let prompt = match &remembered {
        Some(name) => format!("Your name [{name}]: "),
        None => "Your name: ".to_owned(),
    };
    let Some(raw) = term.ask(&prompt)? else {
        return Ok(None);
    };
    if raw.is_empty() {
        return Ok(Some(remembered.unwrap_or_default()));
    }
    Ok(Some(raw))
}

fn ask_category<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
) -> io::Result<Option<Option<CategoryId>>> {
    term.say("Topic:")?;
    term.say("  0) Any")?;
    for (pos, (_, label)) in KNOWN_CATEGORIES.iter().enumerate() {
        term.say(format!("  {}) {label}", pos + 1))?;
    }
    let picked = ask_menu(term, KNOWN_CATEGORIES.len())?;
    Ok(picked.map(|choice| choice.map(|pos| CategoryId::new(KNOWN_CATEGORIES[pos].0))))
}

fn ask_difficulty<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
) -> io::Result<Option<Option<Difficulty>>> {
    term.say("Level:")?;
    term.say("  0) Any")?;
    for (pos, difficulty) in Difficulty::ALL.iter().enumerate() {
        term.say(format!("  {}) {}", pos + 1, difficulty.label()))?;
    }
    let picked = ask_menu(term, Difficulty::ALL.len())?;
    Ok(picked.map(|choice| choice.map(|pos| Difficulty::ALL[pos])))
}

/// Read menu choices until one is valid. Outer `None` is end of input,
/// inner `None` is "any".
fn ask_menu<R: BufRead, W: Write>(
    term: &mut Terminal<R, W>,
    len: usize,
) -> io::Result<Option<Option<usize>>> {
    loop {
        let Some(raw) = term.ask("Choice [0]: ")? else {
            return Ok(None);
        };
        match parse_menu_choice(&raw, len) {
            Some(choice) => return Ok(Some(choice)),
            None => term.say(format!("Enter a number from 0 to {len}."))?,
        }
    }
}

fn parse_menu_choice(raw: &str, len: usize) -> Option<Option<usize>> {
    if raw.is_empty() {
        return Some(None);
    }
    match raw.parse::<usize>() {
        Ok(0) => Some(None),
        Ok(n) if n <= len => Some(Some(n - 1)),
        _ => None,
    }
}

/// Walk the questions until the player submits. Returns `false` at end of input.
async fn answer_questions<R: BufRead, W: Write>(
    session: &mut QuizSession,
    term: &mut Terminal<R, W>,
) -> io::Result<bool> {
    let total = session.questions().len();
    let mut cursor = 0;

    loop {
        if cursor < total {
            let question = &session.questions()[cursor];
            let current = session.selection(cursor);
            term.say("")?;
            term.say(format!(
                "Question {}/{total}: {}",
                cursor + 1,
                question.display_text()
            ))?;
            for (pos, option) in question.shuffled_options().iter().enumerate() {
                let marker = if current == Some(option.as_str()) { '*' } else { ' ' };
                term.say(format!(" {marker}{}) {option}", pos + 1))?;
            }

            let Some(raw) = term.ask("Answer (number, p = previous): ")? else {
                return Ok(false);
            };
            if raw.eq_ignore_ascii_case("p") {
                cursor = cursor.saturating_sub(1);
                continue;
            }
            match raw.parse::<usize>() {
                Ok(n) if n >= 1 => match session.select_option(cursor, n - 1) {
                    Ok(()) => cursor += 1,
                    Err(err) => term.say(err.user_message())?,
                },
                _ => term.say("Enter the number of an option.")?,
            }
            continue;
        }

        let progress = session.progress();
        term.say("")?;
        term.say(format!("Answered {}/{}", progress.answered, progress.total))?;
        let Some(raw) = term.ask("Question number to change, or s to submit: ")? else {
            return Ok(false);
        };

        if raw.eq_ignore_ascii_case("s") {
            match session.submit().await {
                Ok(_) => return Ok(true),
                Err(QuizError::Validation(ValidationError::IncompleteAnswers { missing })) => {
                    term.say("Please answer all questions.")?;
                    cursor = missing.first().copied().unwrap_or(0);
                }
                Err(err) => {
                    term.say(err.user_message())?;
                    return Ok(false);
                }
            }
            continue;
        }

        match raw.parse::<usize>() {
            Ok(n) if (1..=total).contains(&n) => cursor = n - 1,
            _ => term.say(format!("Enter a number from 1 to {total}, or s."))?,
        }
    }
}

fn show_result<R: BufRead, W: Write>(
    session: &QuizSession,
    term: &mut Terminal<R, W>,
) -> io::Result<()> {
    let (Some(meta), Some(result)) = (session.meta(), session.result()) else {
        return Ok(());
    };

    term.say("")?;
    for line in ResultView::from_result(meta, result).lines() {
        term.say(line)?;
    }
    if let Some(err) = session.save_error() {
        term.say(err.user_message())?;
    }

    term.say("")?;
    term.say("Top scores:")?;
    print_ranking(session.leaderboard_top(), term)
}

/// Print the `n` best records from the persisted leaderboard.
pub async fn show_leaderboard<R: BufRead, W: Write>(
    store: &LeaderboardStore,
    n: usize,
    term: &mut Terminal<R, W>,
) -> io::Result<()> {
    let top = store.top_n(n).await;
    print_ranking(&top, term)
}

fn print_ranking<R: BufRead, W: Write>(
    records: &[quiz_core::model::LeaderboardRecord],
    term: &mut Terminal<R, W>,
) -> io::Result<()> {
    if records.is_empty() {
        return term.say("No scores yet.");
    }
    for (rank, record) in records.iter().enumerate() {
        term.say(format!("{}. {}", rank + 1, leaderboard_line(record)))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use async_trait::async_trait;
    use quiz_core::model::Question;
    use quiz_core::time::fixed_clock;
    use services::{FetchError, QuestionRequest, QuestionSource, QuizConfig};
    use storage::repository::Storage;

    struct QueueSource(Mutex<VecDeque<Vec<Question>>>);

    #[async_trait]
    impl QuestionSource for QueueSource {
        async fn fetch(&self, _request: &QuestionRequest) -> Result<Vec<Question>, FetchError> {
            Ok(self.0.lock().unwrap().pop_front().unwrap_or_default())
        }
    }

    fn services_with(batches: Vec<Vec<Question>>) -> AppServices {
        AppServices::from_parts(
            Storage::in_memory(),
            Arc::new(QueueSource(Mutex::new(batches.into()))),
            QuizConfig::default(),
            fixed_clock(),
        )
    }

    fn questions() -> Vec<Question> {
        (0..5)
            .map(|i| {
                Question::new(
                    format!("Q{i} &amp; more"),
                    format!("A{i}"),
                    vec![format!("W{i}a"), format!("W{i}b"), format!("W{i}c")],
                )
                .unwrap()
            })
            .collect()
    }

    fn terminal(input: &str) -> Terminal<Cursor<Vec<u8>>, Vec<u8>> {
        Terminal::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn menu_choice_parsing() {
        assert_eq!(parse_menu_choice("", 4), Some(None));
        assert_eq!(parse_menu_choice("0", 4), Some(None));
        assert_eq!(parse_menu_choice("4", 4), Some(Some(3)));
        assert_eq!(parse_menu_choice("5", 4), None);
        assert_eq!(parse_menu_choice("x", 4), None);
    }

    #[tokio::test]
    async fn plays_one_quiz_to_the_result_screen() {
        let services = services_with(vec![questions()]);
        let mut term = terminal("Ada\n1\n1\n1\n1\n1\n1\n1\ns\nn\n");

        play(&services, &mut term).await.unwrap();
        let out = String::from_utf8(term.into_output()).unwrap();

        assert!(out.contains("Question 1/5: Q0 & more"));
        assert!(out.contains("Result for Ada"));
        assert!(out.contains("Top scores:"));
        assert!(out.contains("1. Ada — General Knowledge (Easy): "));
        assert_eq!(services.leaderboard().all().await.len(), 1);
    }

    #[tokio::test]
    async fn prefills_remembered_name_and_reports_empty_result() {
        let services = services_with(Vec::new());
        services.profiles().remember_player_name("Grace").await.unwrap();
        let mut term = terminal("\n0\n0\n");

        play(&services, &mut term).await.unwrap();
        let out = String::from_utf8(term.into_output()).unwrap();

        assert!(out.contains("Your name [Grace]: "));
        assert!(out.contains("No questions found for this selection."));
    }

    #[tokio::test]
    async fn leaderboard_listing_handles_empty_store() {
        let services = services_with(Vec::new());
        let mut term = terminal("");
        show_leaderboard(&services.leaderboard(), 3, &mut term)
            .await
            .unwrap();
        assert_eq!(
            String::from_utf8(term.into_output()).unwrap(),
            "No scores yet.\n"
        );
    }
}
