/// Admin notification feed
///
/// Persisted copy of everything published on the admin channel, so a console
/// that connects late can catch up before subscribing to the live stream.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE admin_notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     kind VARCHAR(64) NOT NULL,
///     title VARCHAR(200) NOT NULL,
///     body TEXT NOT NULL,
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AdminNotification {
    pub id: Uuid,
    /// `broadcast`, `user_registered`, `project_created`
    pub kind: String,
    pub title: String,
    pub body: String,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl AdminNotification {
    pub async fn create(
        pool: &PgPool,
        kind: &str,
        title: &str,
        body: &str,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, AdminNotification>(
            r#"
            INSERT INTO admin_notifications (kind, title, body)
            VALUES ($1, $2, $3)
            RETURNING id, kind, title, body, read, created_at
            "#,
        )
        .bind(kind)
        .bind(title)
        .bind(body)
        .fetch_one(pool)
        .await
    }

    /// Newest first
    pub async fn list_recent(pool: &PgPool, limit: i64) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminNotification>(
            r#"
            SELECT id, kind, title, body, read, created_at
            FROM admin_notifications
            ORDER BY created_at DESC, id DESC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(pool)
        .await
    }

    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, AdminNotification>(
            r#"
            UPDATE admin_notifications SET read = TRUE
            WHERE id = $1
            RETURNING id, kind, title, body, read, created_at
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }
}
