/// Lesson catalogue
///
/// Lessons are ordered by `position` and seeded by migration. Each lesson
/// carries its quiz as JSONB; the answer key never leaves the server.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE lessons (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     position INTEGER NOT NULL UNIQUE,
///     title VARCHAR(200) NOT NULL,
///     content TEXT NOT NULL,
///     quiz JSONB NOT NULL DEFAULT '[]',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

/// One multiple-choice question with its answer key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub prompt: String,
    pub options: Vec<String>,
    /// Index into `options`
    pub answer: usize,
}

/// Question as shown to learners (no answer key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestionView {
    pub prompt: String,
    pub options: Vec<String>,
}

impl From<&QuizQuestion> for QuizQuestionView {
    fn from(q: &QuizQuestion) -> Self {
        Self {
            prompt: q.prompt.clone(),
            options: q.options.clone(),
        }
    }
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Lesson {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
    pub content: String,
    pub quiz: Json<Vec<QuizQuestion>>,
    pub created_at: DateTime<Utc>,
}

/// Lesson body returned to learners
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonContent {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
    pub content: String,
    pub quiz: Vec<QuizQuestionView>,
}

/// Catalogue entry without the body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LessonSummary {
    pub id: Uuid,
    pub position: i32,
    pub title: String,
}

/// Ids of the lessons either side of a position
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LessonNeighbours {
    pub prev: Option<Uuid>,
    pub next: Option<Uuid>,
}

impl Lesson {
    pub fn questions(&self) -> &[QuizQuestion] {
        &self.quiz.0
    }

    pub fn to_content(&self) -> LessonContent {
        LessonContent {
            id: self.id,
            position: self.position,
            title: self.title.clone(),
            content: self.content.clone(),
            quiz: self.questions().iter().map(QuizQuestionView::from).collect(),
        }
    }

    pub fn summary(&self) -> LessonSummary {
        LessonSummary {
            id: self.id,
            position: self.position,
            title: self.title.clone(),
        }
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Lesson>(
            "SELECT id, position, title, content, quiz, created_at FROM lessons WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Whole catalogue in teaching order
    pub async fn list_summaries(pool: &PgPool) -> Result<Vec<LessonSummary>, sqlx::Error> {
        sqlx::query_as::<_, LessonSummary>(
            "SELECT id, position, title FROM lessons ORDER BY position ASC",
        )
        .fetch_all(pool)
        .await
    }

    /// The lesson immediately before `position`, if any
    pub async fn find_previous(
        pool: &PgPool,
        position: i32,
    ) -> Result<Option<LessonSummary>, sqlx::Error> {
        sqlx::query_as::<_, LessonSummary>(
            r#"
            SELECT id, position, title
            FROM lessons
            WHERE position < $1
            ORDER BY position DESC
            LIMIT 1
            "#,
        )
        .bind(position)
        .fetch_optional(pool)
        .await
    }

    pub async fn neighbours(pool: &PgPool, position: i32) -> Result<LessonNeighbours, sqlx::Error> {
        let (prev, next): (Option<Uuid>, Option<Uuid>) = sqlx::query_as(
            r#"
            SELECT
                (SELECT id FROM lessons WHERE position < $1 ORDER BY position DESC LIMIT 1),
                (SELECT id FROM lessons WHERE position > $1 ORDER BY position ASC LIMIT 1)
            "#,
        )
        .bind(position)
        .fetch_one(pool)
        .await?;

        Ok(LessonNeighbours { prev, next })
    }
}
