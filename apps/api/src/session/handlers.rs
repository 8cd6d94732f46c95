//! Axum route handlers for live interview sessions.
//!
//! Session state lives in the shared map behind `AppState.sessions`. Oracle
//! calls are never made while holding the lock: the stop flow moves the
//! machine into `Evaluating` (which rejects every other transition), drops
//! the lock for the duration of the call, then records the outcome.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::evaluation::evaluate_answer;
use crate::interview::models::{InterviewConfig, Question};
use crate::interview::question_gen::generate_question_set;
use crate::interview::store::save_interview;
use crate::results::{self, ResultsReport};
use crate::session::repository::ScopedSessionRepository;
use crate::session::timer::spawn_countdown;
use crate::session::{Advance, SessionController, SessionSnapshot};
use crate::state::{AppState, SessionEntry};

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    pub user_id: String,
    #[serde(flatten)]
    pub config: InterviewConfig,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub questions: Vec<Question>,
    pub snapshot: SessionSnapshot,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoverSessionRequest {
    pub user_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub snapshot: SessionSnapshot,
    pub current_question: Option<Question>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureErrorBody {
    pub reason: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub snapshot: SessionSnapshot,
    /// Present when capture could not be opened; the session still records.
    pub capture_error: Option<CaptureErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerTextRequest {
    pub answer_text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NextQuestionResponse {
    pub finished: bool,
    pub snapshot: SessionSnapshot,
    pub report: Option<ResultsReport>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsResponse {
    pub report: ResultsReport,
    pub summary: String,
    /// Downloadable document: {questions, answers, overallScore}.
    pub export: serde_json::Value,
}

// ────────────────────────────────────────────────────────────────────────────
// Shared flow
// ────────────────────────────────────────────────────────────────────────────

/// Stops the current recording and runs the evaluation pipeline. Used by both
/// the manual stop handler and the countdown's forced stop. On evaluation
/// failure the answer is stored unscored and the failure is flagged in the
/// snapshot — the user retries by re-taking the question.
pub(crate) async fn submit_current_answer(
    state: &AppState,
    session_id: Uuid,
) -> Result<SessionSnapshot, AppError> {
    let pending = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions
            .get_mut(&session_id)
            .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
        entry.controller.stop_recording()?
    };

    let evaluation = match evaluate_answer(
        state.oracle.as_ref(),
        &pending.question.question,
        &pending.answer_text,
        &pending.job_role,
        pending.experience_level,
    )
    .await
    {
        Ok(evaluation) => Some(evaluation),
        Err(e) => {
            warn!(%session_id, index = pending.question_index, error = %e, "answer evaluation failed");
            None
        }
    };

    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    entry.controller.record_evaluation(evaluation)?;
    Ok(entry.controller.snapshot())
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions
///
/// Generates the question set and opens a live session around it.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Json(request): Json<CreateSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("userId cannot be empty".to_string()));
    }

    let questions = generate_question_set(state.oracle.as_ref(), &request.config).await?;
    let scoped = ScopedSessionRepository::new(state.repository.as_ref(), &request.user_id);
    let controller = SessionController::new(request.config, questions.clone(), &scoped);
    let snapshot = controller.snapshot();

    let session_id = Uuid::new_v4();
    state.sessions.write().await.insert(
        session_id,
        SessionEntry {
            controller,
            timer: None,
            user_id: request.user_id,
        },
    );

    Ok(Json(CreateSessionResponse {
        session_id,
        questions,
        snapshot,
    }))
}

/// POST /api/v1/sessions/recover
///
/// Rebuilds a session from the caller's recovery cache after a client reload,
/// avoiding a second oracle call for the same question set. Only slots written
/// under the caller's own scope are considered.
pub async fn handle_recover_session(
    State(state): State<AppState>,
    Json(request): Json<RecoverSessionRequest>,
) -> Result<Json<CreateSessionResponse>, AppError> {
    if request.user_id.trim().is_empty() {
        return Err(AppError::Validation("userId cannot be empty".to_string()));
    }

    let scoped = ScopedSessionRepository::new(state.repository.as_ref(), &request.user_id);
    let controller = SessionController::recover(&scoped)
        .ok_or_else(|| AppError::NotFound("no recoverable session in cache".to_string()))?;

    let questions = controller.questions().to_vec();
    let snapshot = controller.snapshot();
    let session_id = Uuid::new_v4();
    state.sessions.write().await.insert(
        session_id,
        SessionEntry {
            controller,
            timer: None,
            user_id: request.user_id,
        },
    );

    Ok(Json(CreateSessionResponse {
        session_id,
        questions,
        snapshot,
    }))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let sessions = state.sessions.read().await;
    let entry = sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    Ok(Json(SessionView {
        snapshot: entry.controller.snapshot(),
        current_question: entry.controller.current_question().cloned(),
    }))
}

/// POST /api/v1/sessions/:id/start
///
/// Starts recording the current question and arms its countdown. A capture
/// failure is reported inline; recording proceeds without capture.
pub async fn handle_start_recording(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<StartSessionResponse>, AppError> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    let capture_error = entry
        .controller
        .start_recording(state.capture.as_ref())?
        .map(|e| CaptureErrorBody {
            reason: e.reason_code(),
            message: e.to_string(),
        });

    // Replace any previous countdown; the epoch guard also protects against
    // a stale task that has not observed the abort yet.
    if let Some(old) = entry.timer.take() {
        old.abort();
    }
    let epoch = entry.controller.timer_epoch();
    entry.timer = Some(spawn_countdown(state.clone(), session_id, epoch));

    Ok(Json(StartSessionResponse {
        snapshot: entry.controller.snapshot(),
        capture_error,
    }))
}

/// POST /api/v1/sessions/:id/answer
///
/// Updates the free-text answer collected while recording.
pub async fn handle_set_answer(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    Json(request): Json<AnswerTextRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    entry.controller.set_answer_text(request.answer_text)?;
    Ok(Json(entry.controller.snapshot()))
}

/// POST /api/v1/sessions/:id/stop
///
/// Manual stop: ends the recording and evaluates the collected answer.
pub async fn handle_stop_recording(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let snapshot = submit_current_answer(&state, session_id).await?;
    Ok(Json(snapshot))
}

/// POST /api/v1/sessions/:id/retry
///
/// Re-arms the current question after a failed evaluation.
pub async fn handle_retry_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
    entry.controller.retry_question()?;
    Ok(Json(entry.controller.snapshot()))
}

/// POST /api/v1/sessions/:id/next
///
/// Advances past a reviewed question. After the last question the interview
/// is persisted best-effort — a store failure is logged and never blocks the
/// results — the aggregated report is returned, and the session entry is
/// removed from the map: a finished session lives on only as the persisted
/// record and the caller's recovery cache.
pub async fn handle_next_question(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<NextQuestionResponse>, AppError> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    let scoped = ScopedSessionRepository::new(state.repository.as_ref(), &entry.user_id);
    let advance = entry.controller.next_question(&scoped)?;
    let snapshot = entry.controller.snapshot();

    match advance {
        Advance::NextQuestion(_) => Ok(Json(NextQuestionResponse {
            finished: false,
            snapshot,
            report: None,
        })),
        Advance::Finished => {
            // The controller is spent; dropping the entry also aborts any
            // straggling countdown task.
            let entry = sessions
                .remove(&session_id)
                .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;
            let report = results::aggregate(entry.controller.answers());

            let pool = state.db.clone();
            let user_id = entry.user_id.clone();
            let config = entry.controller.config().clone();
            let questions = entry.controller.questions().to_vec();
            tokio::spawn(async move {
                if let Err(e) = save_interview(&pool, &user_id, &config, &questions).await {
                    warn!(error = %e, "failed to persist finished interview");
                }
            });

            Ok(Json(NextQuestionResponse {
                finished: true,
                snapshot,
                report: Some(report),
            }))
        }
    }
}

/// GET /api/v1/sessions/:id/results
///
/// Aggregated report over whatever has been evaluated so far, plus the
/// downloadable export document and a one-line shareable summary. Serves
/// in-flight sessions only; a finished session returns its final report from
/// the advance that completed it.
pub async fn handle_get_results(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ResultsResponse>, AppError> {
    let sessions = state.sessions.read().await;
    let entry = sessions
        .get(&session_id)
        .ok_or_else(|| AppError::NotFound(format!("session {session_id}")))?;

    let questions = entry.controller.questions();
    let answers = entry.controller.answers();
    let report = results::aggregate(answers);
    let export = results::export_document(questions, answers, &report);
    let summary = results::summary_line(&report);

    Ok(Json(ResultsResponse {
        report,
        summary,
        export,
    }))
}
