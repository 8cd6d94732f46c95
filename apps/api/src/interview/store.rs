//! Persistence gateway for finished and created interviews.
//!
//! One row per interview; the generated question set is stored as an opaque
//! serialized-JSON text column. `created_by` is an opaque identity string
//! from the external auth provider — no referential integrity is enforced.

use anyhow::anyhow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::models::{InterviewConfig, Question};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct InterviewRow {
    pub id: Uuid,
    pub job_title: String,
    pub job_role: String,
    pub experience_level: String,
    pub purpose: String,
    /// Opaque serialized-JSON question set.
    pub questions: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

/// Inserts one interview record. The id is generated client-side before the
/// insert; the store enforces only primary-key uniqueness.
pub async fn save_interview(
    pool: &PgPool,
    created_by: &str,
    config: &InterviewConfig,
    questions: &[Question],
) -> Result<Uuid, AppError> {
    let id = Uuid::new_v4();
    let questions_json = serde_json::to_string(questions)
        .map_err(|e| AppError::Internal(anyhow!("failed to serialize question set: {e}")))?;

    sqlx::query(
        r#"
        INSERT INTO mock_interviews
            (id, job_title, job_role, experience_level, purpose, questions, created_by, created_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        "#,
    )
    .bind(id)
    .bind(&config.job_title)
    .bind(&config.job_role)
    .bind(config.experience_level.as_str())
    .bind(config.purpose.as_str())
    .bind(&questions_json)
    .bind(created_by)
    .bind(Utc::now())
    .execute(pool)
    .await?;

    info!(%id, created_by, "interview persisted");
    Ok(id)
}

pub async fn get_interview(pool: &PgPool, id: Uuid) -> Result<Option<InterviewRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewRow>(
        r#"
        SELECT id, job_title, job_role, experience_level, purpose, questions, created_by, created_at
        FROM mock_interviews
        WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

pub async fn list_interviews(
    pool: &PgPool,
    created_by: &str,
) -> Result<Vec<InterviewRow>, sqlx::Error> {
    sqlx::query_as::<_, InterviewRow>(
        r#"
        SELECT id, job_title, job_role, experience_level, purpose, questions, created_by, created_at
        FROM mock_interviews
        WHERE created_by = $1
        ORDER BY created_at DESC
        "#,
    )
    .bind(created_by)
    .fetch_all(pool)
    .await
}
