//! Mastery tracking rule.
//!
//! Every recorded attempt increments the attempt counter, increments the
//! correct counter when the answer was graded correct, and derives the
//! mastery level from the two counters. The level is never stored on its
//! own terms.

use serde::{Deserialize, Serialize};

/// Attempt counters for one (user, topic) pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MasteryCounters {
    pub attempted: i32,
    pub correct: i32,
}

impl MasteryCounters {
    pub fn new(attempted: i32, correct: i32) -> Self {
        Self { attempted, correct }
    }

    /// Counters after recording one more graded attempt.
    pub fn record(self, correct: bool) -> Self {
        Self {
            attempted: self.attempted + 1,
            correct: self.correct + i32::from(correct),
        }
    }

    /// correct / attempted, or 0 when nothing has been attempted.
    pub fn mastery_level(&self) -> f64 {
        if self.attempted <= 0 {
            0.0
        } else {
            f64::from(self.correct) / f64::from(self.attempted)
        }
    }
}

/// Accuracy as a percentage in [0, 100].
pub fn accuracy_percent(counters: MasteryCounters) -> f64 {
    counters.mastery_level() * 100.0
}
