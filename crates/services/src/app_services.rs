use std::sync::Arc;

use storage::repository::Storage;

use crate::config::QuizConfig;
use crate::error::AppServicesError;
use crate::leaderboard::LeaderboardStore;
use crate::profile::PlayerProfileService;
use crate::quiz::QuizSession;
use crate::source::{OpenTdbSource, QuestionSource};
use crate::Clock;

/// Assembles app-facing services around one persisted store.
#[derive(Clone)]
pub struct AppServices {
    config: QuizConfig,
    clock: Clock,
    source: Arc<dyn QuestionSource>,
    leaderboard: LeaderboardStore,
    profiles: PlayerProfileService,
}

impl AppServices {
    /// Build services backed by `SQLite` storage and the HTTP question source.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError` if storage initialization fails.
    pub async fn new_sqlite(
        db_url: &str,
        config: QuizConfig,
        clock: Clock,
    ) -> Result<Self, AppServicesError> {
        let storage = Storage::sqlite(db_url).await?;
        let source: Arc<dyn QuestionSource> = Arc::new(OpenTdbSource::from_config(&config));
        Ok(Self::from_parts(storage, source, config, clock))
    }

    #[must_use]
    pub fn from_parts(
        storage: Storage,
        source: Arc<dyn QuestionSource>,
        config: QuizConfig,
        clock: Clock,
    ) -> Self {
        Self {
            config,
            clock,
            source,
            leaderboard: LeaderboardStore::new(Arc::clone(&storage.entries)),
            profiles: PlayerProfileService::new(storage.entries),
        }
    }

    #[must_use]
    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    #[must_use]
    pub fn leaderboard(&self) -> LeaderboardStore {
        self.leaderboard.clone()
    }

    #[must_use]
    pub fn profiles(&self) -> PlayerProfileService {
        self.profiles.clone()
    }

    /// A fresh, idle quiz session wired to these services.
    #[must_use]
    pub fn new_session(&self) -> QuizSession {
        QuizSession::new(
            Arc::clone(&self.source),
            self.leaderboard.clone(),
            self.profiles.clone(),
        )
        .with_config(&self.config)
        .with_clock(self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quiz::QuizPhase;
    use quiz_core::time::fixed_clock;

    #[tokio::test]
    async fn services_share_one_store() {
        let services = AppServices::from_parts(
            Storage::in_memory(),
            Arc::new(OpenTdbSource::new("http://127.0.0.1:9/api.php")),
            QuizConfig::default(),
            fixed_clock(),
        );

        services.profiles().remember_player_name("Ada").await.unwrap();
        let session = services.new_session();
        assert_eq!(session.phase(), QuizPhase::Idle);
        assert_eq!(
            session.profiles().last_player_name().await.as_deref(),
            Some("Ada")
        );
        assert!(services.leaderboard().all().await.is_empty());
    }
}
