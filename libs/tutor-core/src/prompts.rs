//! Prompt builders for the completion service.

use crate::types::{DifficultyLevel, HistoryTurn, OutputFormat};

/// Number of prior chat turns included as context.
pub const HISTORY_WINDOW: usize = 3;

const TUTOR_PERSONA: &str = "You are an expert tutor. Your goal is to help students learn by:
1. Not giving direct answers immediately
2. Asking guiding questions to help them think
3. Breaking down complex problems into smaller steps
4. Encouraging them when they make progress
5. Providing hints when they're stuck
6. Being patient and supportive

Use the Socratic method to guide learning.";

/// A system instruction plus the user-facing prompt.
#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

/// Socratic tutoring prompt.
///
/// Only the last [`HISTORY_WINDOW`] turns of `history` are used; `history`
/// is expected in chronological order.
pub fn tutor_chat(question: &str, topic: Option<&str>, history: &[HistoryTurn]) -> Prompt {
    let mut context = String::new();

    if let Some(topic) = topic.filter(|t| !t.trim().is_empty()) {
        context.push_str(&format!("\n\nCurrent topic: {}", topic));
    }

    let recent = &history[history.len().saturating_sub(HISTORY_WINDOW)..];
    if !recent.is_empty() {
        let rendered = recent
            .iter()
            .map(|turn| format!("Student: {}\nTutor: {}", turn.question, turn.answer))
            .collect::<Vec<_>>()
            .join("\n");
        context.push_str(&format!("\n\nRecent conversation:\n{}", rendered));
    }

    Prompt {
        system: TUTOR_PERSONA.to_string(),
        user: format!(
            "{}\n\nStudent's question: {}\n\nYour response:",
            context, question
        ),
    }
}

/// Practice problem generation prompt.
pub fn practice_problem(
    topic: &str,
    level: DifficultyLevel,
    problem_type: &str,
    format: OutputFormat,
) -> Prompt {
    let instructions = match format {
        OutputFormat::Labeled => {
            "Format your response EXACTLY as follows:
QUESTION: [The problem statement here]
SOLUTION: [Step-by-step solution]
HINTS: [2-3 helpful hints, separated by semicolons]"
        }
        OutputFormat::Json => {
            "Respond with a single JSON object with exactly these keys:
\"question\": the problem statement,
\"solution\": a step-by-step solution,
\"hints\": an array of 2-3 helpful hints"
        }
    };

    Prompt {
        system: format!(
            "You are a problem generator. Create a {} difficulty practice problem about {}.\n\n{}",
            level, topic, instructions
        ),
        user: format!(
            "Generate a {} problem about {} at {} difficulty level.",
            problem_type, topic, level
        ),
    }
}

/// Answer grading prompt.
pub fn assessment(
    question: &str,
    solution: &str,
    student_answer: &str,
    format: OutputFormat,
) -> Prompt {
    let instructions = match format {
        OutputFormat::Labeled => {
            "Format your response EXACTLY as:
CORRECT: [Yes/No/Partial]
SCORE: [0-100]
FEEDBACK: [Detailed feedback on what was right/wrong and how to improve]"
        }
        OutputFormat::Json => {
            "Respond with a single JSON object with exactly these keys:
\"correct\": one of \"Yes\", \"No\" or \"Partial\",
\"score\": an integer from 0 to 100,
\"feedback\": detailed feedback on what was right/wrong and how to improve"
        }
    };

    Prompt {
        system: format!(
            "You are an expert grader. Evaluate the student's answer and provide constructive feedback.\n\n{}",
            instructions
        ),
        user: format!(
            "Question: {}\n\nCorrect Solution: {}\n\nStudent's Answer: {}\n\nEvaluate the student's answer.",
            question, solution, student_answer
        ),
    }
}

/// Learning path prompt. Empty goals fall back to general mastery.
pub fn learning_path(
    subject: &str,
    current_level: &str,
    goals: Option<&str>,
    format: OutputFormat,
) -> Prompt {
    let goals = goals
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .unwrap_or("General mastery");

    let instructions = match format {
        OutputFormat::Labeled => "Format your response as a numbered list of topics in learning order.",
        OutputFormat::Json => {
            "Respond with a single JSON object with one key, \"topics\": an array of topic names in learning order."
        }
    };

    Prompt {
        system: format!(
            "You are a curriculum designer. Create a logical learning path.\n\n{}",
            instructions
        ),
        user: format!(
            "Create a learning path for {}.\nCurrent level: {}\nGoals: {}\n\nList the topics in order from foundational to advanced.",
            subject, current_level, goals
        ),
    }
}
