//! Core tutoring logic shared by the backend.
//!
//! Provides:
//! - Difficulty binning for generated practice problems
//! - Prompt builders for the completion service
//! - Parsers that turn free-text model output into structured results
//! - The mastery update rule used for progress tracking

pub mod error;
pub mod mastery;
pub mod parser;
pub mod prompts;
pub mod types;

pub use error::{CoreError, Result};
pub use mastery::{accuracy_percent, MasteryCounters};
pub use parser::{parse_assessment, parse_learning_path, parse_problem, SOLUTION_FAILED};
pub use types::{Assessment, DifficultyLevel, GeneratedProblem, HistoryTurn, OutputFormat};
