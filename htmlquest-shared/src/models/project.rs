/// Project hub entries and the like ledger
///
/// `like_count` and `comment_count` are denormalized onto the project row but
/// always recomputed from the ledger tables when they change, so the value
/// returned to clients is authoritative.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE projects (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     owner_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     title VARCHAR(200) NOT NULL,
///     description TEXT NOT NULL DEFAULT '',
///     image_path VARCHAR(512),
///     github_link VARCHAR(512),
///     like_count INTEGER NOT NULL DEFAULT 0,
///     comment_count INTEGER NOT NULL DEFAULT 0,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE TABLE project_likes (
///     project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     PRIMARY KEY (project_id, user_id)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

const PROJECT_COLUMNS: &str = "id, owner_id, title, description, image_path, github_link, \
                               like_count, comment_count, created_at, updated_at";

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    /// Relative path of an already stored image
    pub image_path: Option<String>,
    pub github_link: Option<String>,
    pub like_count: i32,
    pub comment_count: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Listing row: project plus owner name and the caller's like state
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProjectCard {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_name: String,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub github_link: Option<String>,
    pub like_count: i32,
    pub comment_count: i32,
    pub liked_by_me: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateProject {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub image_path: Option<String>,
    pub github_link: Option<String>,
}

/// Partial update; `None` leaves the column unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProject {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_path: Option<String>,
    pub github_link: Option<String>,
}

/// Result of a like toggle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeState {
    pub liked: bool,
    pub like_count: i32,
}

impl Project {
    pub async fn create(pool: &PgPool, data: CreateProject) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO projects (owner_id, title, description, image_path, github_link)
             VALUES ($1, $2, $3, $4, $5)
             RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(data.owner_id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.image_path)
            .bind(data.github_link)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let query = format!("SELECT {} FROM projects WHERE id = $1", PROJECT_COLUMNS);

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .fetch_optional(executor)
            .await
    }

    /// Single card as seen by `viewer_id`
    pub async fn find_card(
        pool: &PgPool,
        id: Uuid,
        viewer_id: Uuid,
    ) -> Result<Option<ProjectCard>, sqlx::Error> {
        sqlx::query_as::<_, ProjectCard>(
            r#"
            SELECT p.id, p.owner_id, u.name AS owner_name, p.title, p.description,
                   p.image_path, p.github_link, p.like_count, p.comment_count,
                   EXISTS (
                       SELECT 1 FROM project_likes l
                       WHERE l.project_id = p.id AND l.user_id = $2
                   ) AS liked_by_me,
                   p.created_at, p.updated_at
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            WHERE p.id = $1
            "#,
        )
        .bind(id)
        .bind(viewer_id)
        .fetch_optional(pool)
        .await
    }

    /// Newest first
    pub async fn list_cards(
        pool: &PgPool,
        viewer_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<ProjectCard>, sqlx::Error> {
        sqlx::query_as::<_, ProjectCard>(
            r#"
            SELECT p.id, p.owner_id, u.name AS owner_name, p.title, p.description,
                   p.image_path, p.github_link, p.like_count, p.comment_count,
                   EXISTS (
                       SELECT 1 FROM project_likes l
                       WHERE l.project_id = p.id AND l.user_id = $1
                   ) AS liked_by_me,
                   p.created_at, p.updated_at
            FROM projects p
            JOIN users u ON u.id = p.owner_id
            ORDER BY p.created_at DESC, p.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(viewer_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM projects")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProject,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                image_path = COALESCE($4, image_path),
                github_link = COALESCE($5, github_link),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {}",
            PROJECT_COLUMNS
        );

        sqlx::query_as::<_, Project>(&query)
            .bind(id)
            .bind(data.title)
            .bind(data.description)
            .bind(data.image_path)
            .bind(data.github_link)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Flips the caller's like and recomputes the count in one transaction.
    ///
    /// Returns `None` when the project does not exist. The project row is
    /// locked for the duration so concurrent toggles serialize.
    pub async fn toggle_like(
        pool: &PgPool,
        project_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LikeState>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let exists: Option<(Uuid,)> =
            sqlx::query_as("SELECT id FROM projects WHERE id = $1 FOR UPDATE")
                .bind(project_id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let removed = sqlx::query("DELETE FROM project_likes WHERE project_id = $1 AND user_id = $2")
            .bind(project_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await?
            .rows_affected()
            > 0;

        if !removed {
            sqlx::query("INSERT INTO project_likes (project_id, user_id) VALUES ($1, $2)")
                .bind(project_id)
                .bind(user_id)
                .execute(&mut *tx)
                .await?;
        }

        let (like_count,): (i32,) = sqlx::query_as(
            r#"
            UPDATE projects
            SET like_count = (SELECT COUNT(*) FROM project_likes WHERE project_id = $1)::INTEGER
            WHERE id = $1
            RETURNING like_count
            "#,
        )
        .bind(project_id)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some(LikeState {
            liked: !removed,
            like_count,
        }))
    }

    /// Recomputes `comment_count` from the comments table.
    pub async fn refresh_comment_count<'e, E>(executor: E, project_id: Uuid) -> Result<i32, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let (comment_count,): (i32,) = sqlx::query_as(
            r#"
            UPDATE projects
            SET comment_count = (SELECT COUNT(*) FROM comments WHERE project_id = $1)::INTEGER
            WHERE id = $1
            RETURNING comment_count
            "#,
        )
        .bind(project_id)
        .fetch_one(executor)
        .await?;

        Ok(comment_count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_state_json() {
        let state = LikeState {
            liked: true,
            like_count: 3,
        };
        let json = serde_json::to_value(state).unwrap();
        assert_eq!(json, serde_json::json!({ "liked": true, "like_count": 3 }));
    }

    #[test]
    fn test_update_defaults_to_no_changes() {
        let update = UpdateProject::default();
        assert!(update.title.is_none());
        assert!(update.description.is_none());
        assert!(update.image_path.is_none());
        assert!(update.github_link.is_none());
    }
}
