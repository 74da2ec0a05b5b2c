/// Push device registrations
///
/// A token belongs to exactly one user; registering a token that is already
/// known moves it to the caller.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE device_tokens (
///     token VARCHAR(255) PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     platform VARCHAR(32),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DeviceToken {
    pub token: String,
    pub user_id: Uuid,
    pub platform: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl DeviceToken {
    pub async fn register(
        pool: &PgPool,
        user_id: Uuid,
        token: &str,
        platform: Option<&str>,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, DeviceToken>(
            r#"
            INSERT INTO device_tokens (token, user_id, platform)
            VALUES ($1, $2, $3)
            ON CONFLICT (token) DO UPDATE SET
                user_id = EXCLUDED.user_id,
                platform = COALESCE(EXCLUDED.platform, device_tokens.platform)
            RETURNING token, user_id, platform, created_at
            "#,
        )
        .bind(token)
        .bind(user_id)
        .bind(platform)
        .fetch_one(pool)
        .await
    }

    /// Removes the caller's token. Returns false when it is unknown or owned by someone else.
    pub async fn unregister(pool: &PgPool, user_id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM device_tokens WHERE token = $1 AND user_id = $2")
            .bind(token)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn tokens_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> =
            sqlx::query_as("SELECT token FROM device_tokens WHERE user_id = $1 ORDER BY created_at")
                .bind(user_id)
                .fetch_all(pool)
                .await?;

        Ok(rows.into_iter().map(|(token,)| token).collect())
    }

    pub async fn all_tokens(pool: &PgPool) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as("SELECT token FROM device_tokens ORDER BY created_at")
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(|(token,)| token).collect())
    }
}
