//! Parsers for completion service output.
//!
//! Each parser first tries to read a JSON object (structured output mode)
//! and otherwise falls back to the labeled text format:
//!
//! ```text
//! QUESTION: Solve 2x + 3 = 7
//! SOLUTION: Subtract 3, then divide by 2. x = 2
//! HINTS: Isolate x; Undo the addition first
//! ```
//!
//! Parsing never fails. Output that matches neither format degrades to a
//! best-effort value built from the raw text.

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::types::{Assessment, GeneratedProblem};

/// Solution text used when the model output had no solution section.
pub const SOLUTION_FAILED: &str = "Solution generation failed";

const QUESTION_MARKER: &str = "QUESTION:";
const SOLUTION_MARKER: &str = "SOLUTION:";
const HINTS_MARKER: &str = "HINTS:";
const CORRECT_MARKER: &str = "CORRECT:";
const SCORE_MARKER: &str = "SCORE:";
const FEEDBACK_MARKER: &str = "FEEDBACK:";

/// Parse a generated practice problem.
pub fn parse_problem(raw: &str) -> GeneratedProblem {
    if let Some(problem) = parse_json::<ProblemJson>(raw) {
        if !problem.question.trim().is_empty() {
            return GeneratedProblem {
                question: problem.question.trim().to_string(),
                solution: problem.solution.trim().to_string(),
                hints: clean_hints(problem.hints.iter().map(String::as_str)),
            };
        }
    }

    let Some((head, rest)) = raw.split_once(SOLUTION_MARKER) else {
        return GeneratedProblem {
            question: raw.to_string(),
            solution: SOLUTION_FAILED.to_string(),
            hints: Vec::new(),
        };
    };

    let question = head.replace(QUESTION_MARKER, "").trim().to_string();
    // A repeated SOLUTION: section ends the first one and is ignored.
    let rest = rest.split(SOLUTION_MARKER).next().unwrap_or(rest);
    let (solution, hints) = rest.split_once(HINTS_MARKER).unwrap_or((rest, ""));

    GeneratedProblem {
        question,
        solution: solution.trim().to_string(),
        hints: clean_hints(hints.split(';')),
    }
}

/// Parse a graded answer.
///
/// Only a literal `Yes` on the `CORRECT:` line counts as correct, so a
/// `Partial` verdict is reported as incorrect.
pub fn parse_assessment(raw: &str) -> Assessment {
    if let Some(graded) = parse_json::<AssessmentJson>(raw) {
        return Assessment {
            is_correct: graded.correct.is_yes(),
            score: graded.score,
            feedback: graded.feedback.trim().to_string(),
        };
    }

    parse_labeled_assessment(raw).unwrap_or_else(|| Assessment::ungraded(raw))
}

fn parse_labeled_assessment(raw: &str) -> Option<Assessment> {
    let correct_line = find_labeled_line(raw, CORRECT_MARKER)?;
    let score_line = find_labeled_line(raw, SCORE_MARKER)?;

    let score = score_line.split(':').nth(1)?.trim().parse::<i32>().ok()?;
    let (_, feedback) = raw.split_once(FEEDBACK_MARKER)?;

    Some(Assessment {
        is_correct: correct_line.contains("Yes"),
        score,
        feedback: feedback.trim().to_string(),
    })
}

fn find_labeled_line<'a>(raw: &'a str, marker: &str) -> Option<&'a str> {
    raw.lines()
        .map(str::trim_start)
        .find(|line| line.starts_with(marker))
}

/// Parse an ordered learning path.
///
/// Keeps lines that start with a digit or a dash and strips the
/// enumeration prefix. Everything else is dropped.
pub fn parse_learning_path(raw: &str) -> Vec<String> {
    if let Some(path) = parse_json::<LearningPathJson>(raw) {
        return path
            .topics
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();
    }

    raw.lines()
        .map(str::trim)
        .filter(|line| line.starts_with(|c: char| c.is_ascii_digit() || c == '-'))
        .map(|line| {
            line.trim_start_matches(|c: char| c.is_ascii_digit() || ".-) ".contains(c))
                .trim()
        })
        .filter(|topic| !topic.is_empty())
        .map(str::to_string)
        .collect()
}

fn clean_hints<'a>(hints: impl Iterator<Item = &'a str>) -> Vec<String> {
    hints
        .map(str::trim)
        .filter(|h| !h.is_empty())
        .map(str::to_string)
        .collect()
}

/// Read a JSON object, tolerating a surrounding markdown code fence.
fn parse_json<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let mut body = raw.trim();
    if let Some(rest) = body.strip_prefix("```") {
        body = rest.trim_start_matches("json").trim_end_matches("```").trim();
    }
    if !body.starts_with('{') {
        return None;
    }
    serde_json::from_str(body).ok()
}

#[derive(Deserialize)]
struct ProblemJson {
    question: String,
    #[serde(default)]
    solution: String,
    #[serde(default)]
    hints: Vec<String>,
}

#[derive(Deserialize)]
struct AssessmentJson {
    correct: Verdict,
    score: i32,
    feedback: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Verdict {
    Flag(bool),
    Label(String),
}

impl Verdict {
    fn is_yes(&self) -> bool {
        match self {
            Self::Flag(flag) => *flag,
            Self::Label(label) => label.contains("Yes"),
        }
    }
}

#[derive(Deserialize)]
struct LearningPathJson {
    topics: Vec<String>,
}
