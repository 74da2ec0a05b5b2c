/// Per-learner lesson progress
///
/// One row per (user, lesson), created lazily the first time the learner
/// opens the lesson and updated on every quiz submission.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lesson_progress (
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     lesson_id UUID NOT NULL REFERENCES lessons(id) ON DELETE CASCADE,
///     completed BOOLEAN NOT NULL DEFAULT FALSE,
///     quiz_score INTEGER,
///     quiz_passed BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (user_id, lesson_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonProgress {
    pub user_id: Uuid,
    pub lesson_id: Uuid,
    pub completed: bool,
    /// Latest quiz attempt, 0-100
    pub quiz_score: Option<i32>,
    /// Sticky: once true it stays true
    pub quiz_passed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl LessonProgress {
    pub async fn find(
        pool: &PgPool,
        user_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, LessonProgress>(
            r#"
            SELECT user_id, lesson_id, completed, quiz_score, quiz_passed, created_at, updated_at
            FROM lesson_progress
            WHERE user_id = $1 AND lesson_id = $2
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_optional(pool)
        .await
    }

    /// Returns the row, creating an empty one on first visit.
    pub async fn ensure(pool: &PgPool, user_id: Uuid, lesson_id: Uuid) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, LessonProgress>(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET user_id = EXCLUDED.user_id
            RETURNING user_id, lesson_id, completed, quiz_score, quiz_passed, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .fetch_one(pool)
        .await
    }

    /// Stores a quiz attempt.
    ///
    /// The score is always the latest attempt; `quiz_passed` and `completed`
    /// only ever flip from false to true.
    pub async fn record_quiz(
        pool: &PgPool,
        user_id: Uuid,
        lesson_id: Uuid,
        score: i32,
        passed: bool,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, LessonProgress>(
            r#"
            INSERT INTO lesson_progress (user_id, lesson_id, completed, quiz_score, quiz_passed)
            VALUES ($1, $2, $4, $3, $4)
            ON CONFLICT (user_id, lesson_id) DO UPDATE SET
                quiz_score = EXCLUDED.quiz_score,
                quiz_passed = lesson_progress.quiz_passed OR EXCLUDED.quiz_passed,
                completed = lesson_progress.completed OR EXCLUDED.completed,
                updated_at = NOW()
            RETURNING user_id, lesson_id, completed, quiz_score, quiz_passed, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(lesson_id)
        .bind(score)
        .bind(passed)
        .fetch_one(pool)
        .await
    }

    /// All progress rows for a learner
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, LessonProgress>(
            r#"
            SELECT user_id, lesson_id, completed, quiz_score, quiz_passed, created_at, updated_at
            FROM lesson_progress
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }
}
