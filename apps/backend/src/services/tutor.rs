//! Tutoring service: prompt building, completion and response parsing.

use std::sync::Arc;

use tutor_core::{
    parse_assessment, parse_learning_path, parse_problem, prompts, prompts::Prompt, Assessment,
    DifficultyLevel, GeneratedProblem, HistoryTurn, OutputFormat, SOLUTION_FAILED,
};

use super::completion::{CompletionService, CompletionStatus};

/// A tutoring result together with how the completion call went.
///
/// When `status` is not `Ok`, `value` was built from placeholder text.
#[derive(Debug, Clone)]
pub struct Tutored<T> {
    pub value: T,
    pub status: CompletionStatus,
}

impl<T> Tutored<T> {
    pub fn is_degraded(&self) -> bool {
        self.status != CompletionStatus::Ok
    }
}

pub struct TutorService {
    completion: Arc<dyn CompletionService>,
    format: OutputFormat,
}

impl TutorService {
    pub fn new(completion: Arc<dyn CompletionService>, format: OutputFormat) -> Self {
        Self { completion, format }
    }

    /// Whether the completion service has credentials.
    pub fn is_configured(&self) -> bool {
        self.completion.is_configured()
    }

    async fn ask(&self, purpose: &str, prompt: &Prompt) -> Tutored<String> {
        let completion = self
            .completion
            .complete(&prompt.user, Some(&prompt.system))
            .await;
        let status = completion.status();
        if status != CompletionStatus::Ok {
            tracing::warn!(?status, "Degraded {} response", purpose);
        }

        Tutored {
            value: completion.into_text(),
            status,
        }
    }

    /// Answer a student question in the Socratic style.
    pub async fn chat(
        &self,
        question: &str,
        topic: Option<&str>,
        history: &[HistoryTurn],
    ) -> Tutored<String> {
        let prompt = prompts::tutor_chat(question, topic, history);
        self.ask("chat", &prompt).await
    }

    /// Generate a practice problem. Fails before any upstream call when the
    /// difficulty is outside the supported scale.
    pub async fn generate_problem(
        &self,
        topic: &str,
        difficulty: f64,
        problem_type: &str,
    ) -> tutor_core::Result<Tutored<GeneratedProblem>> {
        let level = DifficultyLevel::from_score(difficulty)?;
        let prompt = prompts::practice_problem(topic, level, problem_type, self.format);

        let reply = self.ask("problem", &prompt).await;
        let problem = parse_problem(&reply.value);
        if problem.solution == SOLUTION_FAILED {
            tracing::debug!("Problem response had no SOLUTION section, using raw text");
        }

        Ok(Tutored {
            value: problem,
            status: reply.status,
        })
    }

    /// Grade a student answer against a reference solution.
    pub async fn assess_answer(
        &self,
        question: &str,
        solution: &str,
        student_answer: &str,
    ) -> Tutored<Assessment> {
        let prompt = prompts::assessment(question, solution, student_answer, self.format);

        let reply = self.ask("assessment", &prompt).await;
        let assessment = parse_assessment(&reply.value);
        if assessment == Assessment::ungraded(&reply.value) {
            tracing::debug!("Assessment response was not in the expected format");
        }

        Tutored {
            value: assessment,
            status: reply.status,
        }
    }

    /// Produce an ordered list of topics for a subject.
    pub async fn learning_path(
        &self,
        subject: &str,
        current_level: &str,
        goals: Option<&str>,
    ) -> Tutored<Vec<String>> {
        let prompt = prompts::learning_path(subject, current_level, goals, self.format);

        let reply = self.ask("learning path", &prompt).await;
        let topics = parse_learning_path(&reply.value);
        if topics.is_empty() {
            tracing::debug!("Learning path response contained no list items");
        }

        Tutored {
            value: topics,
            status: reply.status,
        }
    }
}
