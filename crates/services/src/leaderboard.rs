use std::sync::Arc;

use tracing::warn;

use quiz_core::model::{LeaderboardRecord, rank_top};
use storage::repository::{KeyValueRepository, StorageError, keys};

/// Number of entries shown next to a finished quiz.
pub const PODIUM_SIZE: usize = 3;

/// Append-only leaderboard log kept under a single persisted key.
///
/// The whole log is one JSON array, read and rewritten on every append.
/// A missing or unreadable document reads as an empty log.
#[derive(Clone)]
pub struct LeaderboardStore {
    repo: Arc<dyn KeyValueRepository>,
}

impl LeaderboardStore {
    #[must_use]
    pub fn new(repo: Arc<dyn KeyValueRepository>) -> Self {
        Self { repo }
    }

    /// Every record in insertion order.
    pub async fn all(&self) -> Vec<LeaderboardRecord> {
        let raw = match self.repo.get(keys::LEADERBOARD).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                warn!(error = %err, "leaderboard unreadable, treating as empty");
                return Vec::new();
            }
        };

        match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(err) => {
                warn!(error = %err, "leaderboard corrupt, treating as empty");
                Vec::new()
            }
        }
    }

    /// Add `record` to the end of the log.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the updated log cannot be written.
    pub async fn append(&self, record: LeaderboardRecord) -> Result<(), StorageError> {
        let mut log = self.all().await;
        log.push(record);
        let encoded = serde_json::to_string(&log)
            .map_err(|err| StorageError::Serialization(err.to_string()))?;
        self.repo.put(keys::LEADERBOARD, &encoded).await
    }

    /// Up to `n` highest-scoring records; ties keep insertion order.
    pub async fn top_n(&self, n: usize) -> Vec<LeaderboardRecord> {
        rank_top(&self.all().await, n)
    }

    /// Irreversibly drop every record. Callers confirm with the player first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the persisted key cannot be removed.
    pub async fn clear(&self) -> Result<(), StorageError> {
        self.repo.remove(keys::LEADERBOARD).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::repository::InMemoryRepository;

    fn store() -> (LeaderboardStore, InMemoryRepository) {
        let repo = InMemoryRepository::new();
        (LeaderboardStore::new(Arc::new(repo.clone())), repo)
    }

    fn rec(name: &str, score: u32) -> LeaderboardRecord {
        LeaderboardRecord::new(name, "Computer", "Medium", score, 5)
    }

    #[tokio::test]
    async fn top_three_orders_by_score_then_insertion() {
        let (store, _) = store();
        for (name, score) in [("a", 2), ("b", 5), ("c", 5), ("d", 1), ("e", 3)] {
            store.append(rec(name, score)).await.unwrap();
        }

        let top = store.top_n(PODIUM_SIZE).await;
        let names: Vec<_> = top.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(names, ["b", "c", "e"]);

        // Reading a ranked view leaves the log in insertion order.
        let all = store.all().await;
        let names: Vec<_> = all.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(names, ["a", "b", "c", "d", "e"]);
    }

    #[tokio::test]
    async fn clear_empties_the_log() {
        let (store, _) = store();
        store.append(rec("a", 4)).await.unwrap();
        store.clear().await.unwrap();
        for n in [0, 1, 3, 100] {
            assert!(store.top_n(n).await.is_empty());
        }
    }

    #[tokio::test]
    async fn corrupt_document_reads_as_empty() {
        let (store, repo) = store();
        repo.put(keys::LEADERBOARD, "{not json").await.unwrap();
        assert!(store.all().await.is_empty());

        store.append(rec("a", 1)).await.unwrap();
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn reads_the_persisted_layout() {
        let (store, repo) = store();
        repo.put(
            keys::LEADERBOARD,
            r#"[{"name":"Ada","score":3,"total":5,"category":"History","difficulty":"Easy"}]"#,
        )
        .await
        .unwrap();

        let all = store.all().await;
        assert_eq!(all, vec![LeaderboardRecord::new("Ada", "History", "Easy", 3, 5)]);
    }
}
