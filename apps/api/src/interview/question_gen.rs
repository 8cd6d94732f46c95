//! Question generation pipeline: prompt → oracle → parse.

use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::models::{InterviewConfig, Question};
use crate::interview::parser::parse_question_set;
use crate::interview::prompts::build_question_prompt;
use crate::llm_client::Oracle;

/// Generates the ordered question set for one interview configuration.
///
/// A parse failure on the overall array discards the whole batch — the caller
/// (or user) retries by re-invoking. There is no automatic retry.
pub async fn generate_question_set(
    oracle: &dyn Oracle,
    config: &InterviewConfig,
) -> Result<Vec<Question>, AppError> {
    if config.job_role.trim().is_empty() {
        return Err(AppError::Validation("jobRole cannot be empty".to_string()));
    }
    if config.question_count == 0 {
        return Err(AppError::Validation(
            "questionCount must be at least 1".to_string(),
        ));
    }

    let prompt = build_question_prompt(config);
    let raw = oracle
        .generate(&prompt)
        .await
        .map_err(|e| AppError::Generation(e.to_string()))?;

    match parse_question_set(&raw) {
        Ok(questions) => {
            info!(
                count = questions.len(),
                requested = config.question_count,
                job_role = %config.job_role,
                "generated question set"
            );
            Ok(questions)
        }
        Err(e) => {
            warn!(raw = e.raw(), "question set parse failed");
            Err(e.into())
        }
    }
}
