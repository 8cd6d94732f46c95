//! Evaluation pipeline: one answer scored against one question through the
//! same oracle + parser stack as question generation.

use tracing::{debug, warn};

use crate::errors::AppError;
use crate::interview::models::{Evaluation, ExperienceLevel};
use crate::interview::parser::parse_evaluation;
use crate::interview::prompts::build_evaluation_prompt;
use crate::llm_client::Oracle;

/// Scores a single free-text answer and returns the structured critique.
///
/// An empty answer is still evaluated — the timer can force submission before
/// the user has typed anything, and the oracle scores what is there.
pub async fn evaluate_answer(
    oracle: &dyn Oracle,
    question: &str,
    answer: &str,
    job_role: &str,
    experience_level: ExperienceLevel,
) -> Result<Evaluation, AppError> {
    if question.trim().is_empty() {
        return Err(AppError::Validation("question cannot be empty".to_string()));
    }

    let prompt = build_evaluation_prompt(question, answer, job_role, experience_level);
    let raw = oracle
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Generation(e.to_string()))?;

    match parse_evaluation(&raw) {
        Ok(evaluation) => {
            debug!(score = evaluation.score, "answer evaluated");
            Ok(evaluation)
        }
        Err(e) => {
            warn!(raw = e.raw(), "evaluation parse failed");
            Err(e.into())
        }
    }
}
