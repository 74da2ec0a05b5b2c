/// Lesson endpoints
///
/// Content and quiz submission go through the navigation gate: a learner can
/// only open lesson N+1 once the quiz of lesson N is passed.
///
/// # Endpoints
///
/// - `GET /api/lessons` - catalogue with per-learner standing
/// - `GET /api/lessons/content/:id` - lesson body (403 while locked)
/// - `GET /api/lessons/nav/:id` - prev/next ids and `can_advance`
/// - `POST /api/lessons/:id/quiz` - grade a quiz attempt

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{Path, State},
    Extension, Json,
};
use htmlquest_shared::{
    auth::middleware::AuthContext,
    models::{
        lesson::{Lesson, LessonContent},
        progress::LessonProgress,
    },
    progression::{self, LessonNav, LessonStanding, QuizGrade},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Deserialize)]
pub struct QuizSubmission {
    /// Chosen option index per question, in order
    pub answers: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct QuizResult {
    #[serde(flatten)]
    pub grade: QuizGrade,
    /// Sticky flag after this attempt
    pub quiz_passed: bool,
    pub next_lesson: Option<Uuid>,
    pub can_advance: bool,
}

pub async fn list_lessons(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
) -> ApiResult<Json<Vec<LessonStanding>>> {
    let lessons = Lesson::list_summaries(&state.db).await?;
    let progress = LessonProgress::list_for_user(&state.db, auth.user_id).await?;

    Ok(Json(progression::standings(&auth, lessons, &progress)))
}

pub async fn lesson_content(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LessonContent>> {
    let lesson = progression::open_lesson(&state.db, &auth, id).await?;
    LessonProgress::ensure(&state.db, auth.user_id, lesson.id).await?;

    Ok(Json(lesson.to_content()))
}

pub async fn lesson_nav(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<LessonNav>> {
    let lesson = Lesson::find_by_id(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Lesson not found".to_string()))?;

    let neighbours = Lesson::neighbours(&state.db, lesson.position).await?;
    let progress = LessonProgress::find(&state.db, auth.user_id, lesson.id).await?;

    Ok(Json(progression::build_nav(
        &auth,
        lesson.id,
        neighbours,
        progress.as_ref(),
    )))
}

pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<QuizSubmission>,
) -> ApiResult<Json<QuizResult>> {
    let lesson = progression::open_lesson(&state.db, &auth, id).await?;
    let grade = progression::grade_quiz(lesson.questions(), &req.answers)?;

    let progress =
        LessonProgress::record_quiz(&state.db, auth.user_id, lesson.id, grade.score, grade.passed)
            .await?;

    tracing::info!(
        user_id = %auth.user_id,
        lesson_id = %lesson.id,
        score = grade.score,
        passed = grade.passed,
        "Quiz submitted"
    );

    let neighbours = Lesson::neighbours(&state.db, lesson.position).await?;
    let nav = progression::build_nav(&auth, lesson.id, neighbours, Some(&progress));

    Ok(Json(QuizResult {
        grade,
        quiz_passed: progress.quiz_passed,
        next_lesson: nav.next,
        can_advance: nav.can_advance,
    }))
}
