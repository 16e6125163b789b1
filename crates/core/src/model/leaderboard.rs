use serde::{Deserialize, Serialize};

use super::meta::SessionMeta;
use super::score::ScoreResult;

/// One finished, scored session as stored in the leaderboard log.
///
/// Field names on the wire match the persisted layout
/// (`name`, `score`, `total`, `category`, `difficulty`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeaderboardRecord {
    #[serde(rename = "name")]
    pub player_name: String,
    #[serde(rename = "category")]
    pub category_label: String,
    #[serde(rename = "difficulty")]
    pub difficulty_label: String,
    #[serde(rename = "score")]
    pub correct_count: u32,
    pub total: u32,
}

impl LeaderboardRecord {
    #[must_use]
    pub fn new(
        player_name: impl Into<String>,
        category_label: impl Into<String>,
        difficulty_label: impl Into<String>,
        correct_count: u32,
        total: u32,
    ) -> Self {
        Self {
            player_name: player_name.into(),
            category_label: category_label.into(),
            difficulty_label: difficulty_label.into(),
            correct_count,
            total,
        }
    }

    #[must_use]
    pub fn from_result(meta: &SessionMeta, result: &ScoreResult) -> Self {
        Self::new(
            meta.player_name(),
            meta.category_label(),
            meta.difficulty_label(),
            result.correct_count(),
            result.total(),
        )
    }
}

/// Up to `n` records ordered by `correct_count` descending.
///
/// The sort is stable, so equal scores keep their insertion order.
#[must_use]
pub fn rank_top(records: &[LeaderboardRecord], n: usize) -> Vec<LeaderboardRecord> {
    let mut ranked: Vec<&LeaderboardRecord> = records.iter().collect();
    ranked.sort_by(|a, b| b.correct_count.cmp(&a.correct_count));
    ranked.into_iter().take(n).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(name: &str, score: u32) -> LeaderboardRecord {
        LeaderboardRecord::new(name, "History", "Easy", score, 5)
    }

    #[test]
    fn ties_keep_insertion_order() {
        let log = vec![
            rec("a", 2),
            rec("b", 5),
            rec("c", 5),
            rec("d", 1),
            rec("e", 3),
        ];
        let top = rank_top(&log, 3);
        let names: Vec<_> = top.iter().map(|r| r.player_name.as_str()).collect();
        assert_eq!(names, ["b", "c", "e"]);
    }

    #[test]
    fn fewer_records_than_requested() {
        let log = vec![rec("a", 1)];
        assert_eq!(rank_top(&log, 3).len(), 1);
        assert!(rank_top(&log, 0).is_empty());
        assert!(rank_top(&[], 3).is_empty());
    }

    #[test]
    fn serializes_with_persisted_field_names() {
        let json = serde_json::to_value(rec("Ada", 4)).unwrap();
        assert_eq!(json["name"], "Ada");
        assert_eq!(json["score"], 4);
        assert_eq!(json["total"], 5);
        assert_eq!(json["category"], "History");
        assert_eq!(json["difficulty"], "Easy");
    }
}
