/// Project comments
///
/// Replies are one level deep: `reply_to` always points at a root comment of
/// the same project. Re-parenting happens in [`crate::social`] before insert.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE comments (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     text TEXT NOT NULL,
///     reply_to UUID REFERENCES comments(id) ON DELETE SET NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

/// Comment with its author's display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub author_name: String,
    pub text: String,
    pub reply_to: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// Minimal row used to resolve reply targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct CommentRef {
    pub id: Uuid,
    pub project_id: Uuid,
    pub reply_to: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateComment {
    pub project_id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    /// Already resolved to a root comment
    pub reply_to: Option<Uuid>,
}

impl Comment {
    pub async fn create<'e, E>(executor: E, data: CreateComment) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Comment>(
            r#"
            WITH inserted AS (
                INSERT INTO comments (project_id, user_id, text, reply_to)
                VALUES ($1, $2, $3, $4)
                RETURNING id, project_id, user_id, text, reply_to, created_at
            )
            SELECT i.id, i.project_id, i.user_id, u.name AS author_name,
                   i.text, i.reply_to, i.created_at
            FROM inserted i
            JOIN users u ON u.id = i.user_id
            "#,
        )
        .bind(data.project_id)
        .bind(data.user_id)
        .bind(data.text)
        .bind(data.reply_to)
        .fetch_one(executor)
        .await
    }

    pub async fn find_ref(pool: &PgPool, id: Uuid) -> Result<Option<CommentRef>, sqlx::Error> {
        sqlx::query_as::<_, CommentRef>(
            "SELECT id, project_id, reply_to FROM comments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Flat list in creation order
    pub async fn list_for_project(pool: &PgPool, project_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Comment>(
            r#"
            SELECT c.id, c.project_id, c.user_id, u.name AS author_name,
                   c.text, c.reply_to, c.created_at
            FROM comments c
            JOIN users u ON u.id = c.user_id
            WHERE c.project_id = $1
            ORDER BY c.created_at ASC, c.id ASC
            "#,
        )
        .bind(project_id)
        .fetch_all(pool)
        .await
    }
}
