//! Axum route handlers for the interview API: question generation, answer
//! evaluation, and the persisted interview records.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluation::evaluate_answer;
use crate::interview::models::{Evaluation, ExperienceLevel, InterviewConfig, Question};
use crate::interview::question_gen::generate_question_set;
use crate::interview::store::{get_interview, list_interviews, save_interview, InterviewRow};
use crate::session::repository::{ScopedSessionRepository, SessionRepository};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub config: InterviewConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsResponse {
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswerRequest {
    pub question: String,
    pub answer: String,
    pub job_role: String,
    pub experience_level: ExperienceLevel,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluateAnswerResponse {
    pub evaluation: Evaluation,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub config: InterviewConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInterviewResponse {
    pub id: Uuid,
    pub questions: Vec<Question>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListInterviewsParams {
    pub user_id: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/questions/generate
///
/// Generates a question set for an interview configuration without creating
/// a record. The set is mirrored into the caller's recovery cache so a
/// reloading client can resume without a second oracle call.
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(request): Json<GenerateQuestionsRequest>,
) -> Result<Json<GenerateQuestionsResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("userId cannot be empty".to_string()));
    }

    let questions = generate_question_set(state.oracle.as_ref(), &request.config).await?;

    let scoped = ScopedSessionRepository::new(state.repository.as_ref(), &request.user_id);
    scoped.set_interview_config(&request.config);
    scoped.set_current_questions(&questions);

    Ok(Json(GenerateQuestionsResponse { questions }))
}

/// POST /api/v1/answers/evaluate
///
/// Scores one free-text answer against one question.
pub async fn handle_evaluate_answer(
    State(state): State<AppState>,
    Json(request): Json<EvaluateAnswerRequest>,
) -> Result<Json<EvaluateAnswerResponse>, AppError> {
    let evaluation = evaluate_answer(
        state.oracle.as_ref(),
        &request.question,
        &request.answer,
        &request.job_role,
        request.experience_level,
    )
    .await?;

    Ok(Json(EvaluateAnswerResponse { evaluation }))
}

/// POST /api/v1/interviews
///
/// Generates a question set and persists the interview record in one step.
/// Unlike the end-of-session write, this insert is load-bearing: a failure
/// here is an error, not a logged warning.
pub async fn handle_create_interview(
    State(state): State<AppState>,
    Json(request): Json<CreateInterviewRequest>,
) -> Result<Json<CreateInterviewResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("userId cannot be empty".to_string()));
    }

    let questions = generate_question_set(state.oracle.as_ref(), &request.config).await?;
    let id = save_interview(&state.db, &request.user_id, &request.config, &questions).await?;

    Ok(Json(CreateInterviewResponse { id, questions }))
}

/// GET /api/v1/interviews/:id
pub async fn handle_get_interview(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<InterviewRow>, AppError> {
    let row = get_interview(&state.db, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("interview {id}")))?;
    Ok(Json(row))
}

/// GET /api/v1/interviews?userId=
pub async fn handle_list_interviews(
    State(state): State<AppState>,
    Query(params): Query<ListInterviewsParams>,
) -> Result<Json<Vec<InterviewRow>>, AppError> {
    let rows = list_interviews(&state.db, &params.user_id).await?;
    Ok(Json(rows))
}
