//! Hint data set
//!
//! A non-empty list of (caption, content) pairs. One is picked at random
//! whenever a life is lost or the game ends. A missing or malformed set is
//! the only fatal configuration error: the game refuses to start without it.

use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading the hint data set
#[derive(Debug, Error)]
pub enum HintError {
    #[error("failed to read hints: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse hints: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("hint data set is empty")]
    Empty,

    #[error("hint #{index} has an empty caption or content")]
    IllFormed { index: usize },
}

/// A single hint entry
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hint {
    pub caption: String,
    pub content: String,
}

impl Hint {
    pub fn new(caption: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            caption: caption.into(),
            content: content.into(),
        }
    }

    /// Either field empty
    pub fn is_ill_formed(&self) -> bool {
        self.caption.is_empty() || self.content.is_empty()
    }
}

/// Validated, non-empty hint collection
#[derive(Debug, Clone, Serialize)]
pub struct HintSet {
    entries: Vec<Hint>,
}

impl HintSet {
    /// Validate and wrap a list of hints
    pub fn new(entries: Vec<Hint>) -> Result<Self, HintError> {
        if entries.is_empty() {
            return Err(HintError::Empty);
        }
        if let Some(index) = entries.iter().position(Hint::is_ill_formed) {
            return Err(HintError::IllFormed { index });
        }
        Ok(Self { entries })
    }

    /// Parse a JSON array of `{ "caption": .., "content": .. }` objects
    pub fn from_json(json: &str) -> Result<Self, HintError> {
        let entries: Vec<Hint> = serde_json::from_str(json)?;
        Self::new(entries)
    }

    /// Load hints from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HintError> {
        let json = std::fs::read_to_string(path.as_ref())?;
        let set = Self::from_json(&json)?;
        log::info!("Loaded {} hints from {}", set.len(), path.as_ref().display());
        Ok(set)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always false for a constructed set; provided for API symmetry
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[Hint] {
        &self.entries
    }

    /// Pick a hint uniformly at random
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> &Hint {
        &self.entries[rng.random_range(0..self.entries.len())]
    }
}
