use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionMetaError {
    #[error("player name cannot be empty")]
    EmptyPlayerName,
}

/// Who is playing and what they picked, fixed for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMeta {
    player_name: String,
    category_label: String,
    difficulty_label: String,
}

impl SessionMeta {
    /// Build session metadata, trimming the player name.
    ///
    /// # Errors
    ///
    /// Returns `SessionMetaError::EmptyPlayerName` if the name is blank after trimming.
    pub fn new(
        player_name: &str,
        category_label: impl Into<String>,
        difficulty_label: impl Into<String>,
    ) -> Result<Self, SessionMetaError> {
        let player_name = player_name.trim();
        if player_name.is_empty() {
            return Err(SessionMetaError::EmptyPlayerName);
        }

        Ok(Self {
            player_name: player_name.to_owned(),
            category_label: category_label.into(),
            difficulty_label: difficulty_label.into(),
        })
    }

    #[must_use]
    pub fn player_name(&self) -> &str {
        &self.player_name
    }

    #[must_use]
    pub fn category_label(&self) -> &str {
        &self.category_label
    }

    #[must_use]
    pub fn difficulty_label(&self) -> &str {
        &self.difficulty_label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn player_name_is_trimmed() {
        let meta = SessionMeta::new("  Ada  ", "History", "Easy").unwrap();
        assert_eq!(meta.player_name(), "Ada");
        assert_eq!(meta.category_label(), "History");
        assert_eq!(meta.difficulty_label(), "Easy");
    }

    #[test]
    fn blank_player_name_is_rejected() {
        let err = SessionMeta::new(" \t ", "History", "Easy").unwrap_err();
        assert_eq!(err, SessionMetaError::EmptyPlayerName);
    }
}
