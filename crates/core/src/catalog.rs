//! Category and difficulty identifiers and their display labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Label used for category ids the catalog does not know.
pub const UNKNOWN_CATEGORY_LABEL: &str = "Unknown";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("invalid category id: {0}")]
    InvalidCategory(String),
    #[error("invalid difficulty: {0}")]
    InvalidDifficulty(String),
}

/// Opaque provider category identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CategoryId(u32);

impl CategoryId {
    #[must_use]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub fn value(&self) -> u32 {
        self.0
    }

    /// Human-readable label, or `"Unknown"` for ids outside the catalog.
    #[must_use]
    pub fn label(&self) -> &'static str {
        KNOWN_CATEGORIES
            .iter()
            .find(|(id, _)| *id == self.0)
            .map_or(UNKNOWN_CATEGORY_LABEL, |(_, label)| label)
    }
}

impl fmt::Debug for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CategoryId({})", self.0)
    }
}

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u32>()
            .map(Self)
            .map_err(|_| CatalogError::InvalidCategory(s.to_owned()))
    }
}

/// Categories offered to players, in menu order.
pub const KNOWN_CATEGORIES: [(u32, &str); 4] = [
    (9, "General Knowledge"),
    (18, "Computer"),
    (20, "Mythology"),
    (23, "History"),
];

/// Label for an optional category selection.
#[must_use]
pub fn category_label(category: Option<CategoryId>) -> &'static str {
    category.map_or(UNKNOWN_CATEGORY_LABEL, |c| c.label())
}

/// Difficulty filter accepted by the question source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    /// Lowercase token as sent to the provider.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }

    #[must_use]
    pub fn label(self) -> String {
        capitalize(self.token())
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for Difficulty {
    type Err = CatalogError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(CatalogError::InvalidDifficulty(other.to_owned())),
        }
    }
}

/// Label for an optional difficulty selection; empty when none was picked.
#[must_use]
pub fn difficulty_label(difficulty: Option<Difficulty>) -> String {
    difficulty.map(Difficulty::label).unwrap_or_default()
}

/// Upper-case the first character, leaving the rest untouched.
#[must_use]
pub fn capitalize(token: &str) -> String {
    let mut chars = token.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
