//! Core types for the tutoring domain.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Discrete difficulty label derived from a numeric difficulty score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    Medium,
    Hard,
}

impl DifficultyLevel {
    /// Upper bound (exclusive) of the supported difficulty scale.
    pub const MAX_SCORE: f64 = 11.0;

    /// Map a numeric difficulty onto its label.
    ///
    /// Bins are half-open: [0,3) easy, [3,7) medium, [7,11) hard.
    /// Anything outside [0,11), including NaN, is rejected.
    pub fn from_score(score: f64) -> Result<Self> {
        if (0.0..3.0).contains(&score) {
            Ok(Self::Easy)
        } else if (3.0..7.0).contains(&score) {
            Ok(Self::Medium)
        } else if (7.0..Self::MAX_SCORE).contains(&score) {
            Ok(Self::Hard)
        } else {
            Err(CoreError::DifficultyOutOfRange { value: score })
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }
}

impl std::fmt::Display for DifficultyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format the completion service is asked to answer in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Labeled plain-text sections (`QUESTION:`, `CORRECT:`, ...).
    #[default]
    Labeled,
    /// A single JSON object.
    Json,
}

/// Practice problem extracted from a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedProblem {
    pub question: String,
    pub solution: String,
    pub hints: Vec<String>,
}

impl GeneratedProblem {
    /// Hints joined the way they are stored in the problems table.
    pub fn joined_hints(&self) -> String {
        self.hints.join(";")
    }
}

/// Graded answer extracted from a model response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub is_correct: bool,
    pub score: i32,
    pub feedback: String,
}

impl Assessment {
    /// Assessment used when the grader output cannot be parsed.
    pub fn ungraded(raw: &str) -> Self {
        Self {
            is_correct: false,
            score: 0,
            feedback: raw.to_string(),
        }
    }
}

/// One prior chat turn used as context for the next prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryTurn {
    pub question: String,
    pub answer: String,
}
