use std::sync::Arc;

use tracing::warn;

use storage::repository::{KeyValueRepository, StorageError, keys};

/// Remembers the last player name so the welcome prompt can prefill it.
#[derive(Clone)]
pub struct PlayerProfileService {
    repo: Arc<dyn KeyValueRepository>,
}

impl PlayerProfileService {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>) -> Self {
        Self { repo }
    }

    /// Last remembered name, if any. Read failures count as "no name".
    pub async fn last_player_name(&self) -> Option<String> {
        match self.repo.get(keys::LAST_PLAYER).await {
            Ok(name) => name
                .map(|n| n.trim().to_owned())
                .filter(|n| !n.is_empty()),
            Err(err) => {
                warn!(error = %err, "last player name unreadable");
                None
            }
        }
    }

    /// Store `name` (trimmed) as the last player.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the name cannot be written.
    pub async fn remember_player_name(&self, name: &str) -> Result<(), StorageError> {
        self.repo.put(keys::LAST_PLAYER, name.trim()).await
    }
}
