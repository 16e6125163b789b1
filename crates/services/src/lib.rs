#![forbid(unsafe_code)]

pub mod app_services;
pub mod config;
pub mod error;
pub mod leaderboard;
pub mod profile;
pub mod quiz;
pub mod source;
pub mod throttle;
pub mod view;

pub use quiz_core::Clock;

pub use app_services::AppServices;
pub use config::QuizConfig;
pub use error::{AppServicesError, ConfigError, FetchError, QuizError, ValidationError};
pub use leaderboard::{LeaderboardStore, PODIUM_SIZE};
pub use profile::PlayerProfileService;
pub use quiz::{FetchDisposition, FetchTicket, QuizPhase, QuizProgress, QuizSession};
pub use source::{FetchParams, OpenTdbSource, QuestionRequest, QuestionSource};
pub use throttle::RequestThrottle;
pub use view::{ResultItem, ResultView, leaderboard_line};
