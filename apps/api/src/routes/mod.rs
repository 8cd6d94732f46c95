pub mod health;

use axum::{
    routing::{get, post},
    Router,
};

use crate::interview::handlers as interview;
use crate::session::handlers as session;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Question generation / evaluation pipeline
        .route(
            "/api/v1/questions/generate",
            post(interview::handle_generate_questions),
        )
        .route(
            "/api/v1/answers/evaluate",
            post(interview::handle_evaluate_answer),
        )
        // Persisted interview records
        .route(
            "/api/v1/interviews",
            post(interview::handle_create_interview).get(interview::handle_list_interviews),
        )
        .route("/api/v1/interviews/:id", get(interview::handle_get_interview))
        // Live sessions
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/recover",
            post(session::handle_recover_session),
        )
        .route("/api/v1/sessions/:id", get(session::handle_get_session))
        .route(
            "/api/v1/sessions/:id/start",
            post(session::handle_start_recording),
        )
        .route(
            "/api/v1/sessions/:id/answer",
            post(session::handle_set_answer),
        )
        .route(
            "/api/v1/sessions/:id/stop",
            post(session::handle_stop_recording),
        )
        .route(
            "/api/v1/sessions/:id/retry",
            post(session::handle_retry_question),
        )
        .route(
            "/api/v1/sessions/:id/next",
            post(session::handle_next_question),
        )
        .route(
            "/api/v1/sessions/:id/results",
            get(session::handle_get_results),
        )
        .with_state(state)
}
