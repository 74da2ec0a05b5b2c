/// Persisted state of the basic-project evaluator
///
/// The transient "awaiting score" state is never stored; a row is always
/// either in progress at some step or terminal.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE project_status AS ENUM ('in_progress', 'passed', 'certified');
///
/// CREATE TABLE project_progress (
///     user_id UUID PRIMARY KEY REFERENCES users(id) ON DELETE CASCADE,
///     current_step SMALLINT NOT NULL DEFAULT 0 CHECK (current_step >= 0),
///     status project_status NOT NULL DEFAULT 'in_progress',
///     last_score SMALLINT,
///     last_feedback TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "project_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    InProgress,
    Passed,
    Certified,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectProgress {
    pub user_id: Uuid,
    pub current_step: i16,
    pub status: ProjectStatus,
    pub last_score: Option<i16>,
    pub last_feedback: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Values written back after a submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveProgress {
    pub current_step: i16,
    pub status: ProjectStatus,
    pub last_score: Option<i16>,
    pub last_feedback: Option<String>,
}

impl ProjectProgress {
    /// Returns the learner's row, starting at step 0 on first use.
    pub async fn ensure(pool: &PgPool, user_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, ProjectProgress>(
            r#"
            INSERT INTO project_progress (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, current_step, status, last_score, last_feedback,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
    }

    pub async fn find(pool: &PgPool, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, ProjectProgress>(
            r#"
            SELECT user_id, current_step, status, last_score, last_feedback,
                   created_at, updated_at
            FROM project_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies the result of a submission made at `from_step`.
    ///
    /// The update only lands while the row is still in progress at
    /// `from_step`; `None` means another submission moved it first.
    pub async fn transition<'e, E>(
        executor: E,
        user_id: Uuid,
        from_step: i16,
        data: SaveProgress,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, ProjectProgress>(
            r#"
            UPDATE project_progress SET
                current_step = $3,
                status = $4,
                last_score = $5,
                last_feedback = $6,
                updated_at = NOW()
            WHERE user_id = $1 AND current_step = $2 AND status = 'in_progress'
            RETURNING user_id, current_step, status, last_score, last_feedback,
                      created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(from_step)
        .bind(data.current_step)
        .bind(data.status)
        .bind(data.last_score)
        .bind(data.last_feedback)
        .fetch_optional(executor)
        .await
    }
}
