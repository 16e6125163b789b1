mod entities;
mod leaderboard;
mod meta;
mod question;
mod score;

pub use entities::decode_entities;
pub use leaderboard::{LeaderboardRecord, rank_top};
pub use meta::{SessionMeta, SessionMetaError};
pub use question::{PresentedQuestion, Question, QuestionError, present};
pub use score::{QuestionOutcome, ScoreError, ScoreResult, Selection, Tier, score};
